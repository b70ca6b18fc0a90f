//! パーサー: トークン列からパイプライン構造を組み立てる。
//!
//! [`tokenizer`](crate::tokenizer) が返す生の文字列トークンを一度だけ [`Token`] に分類し、
//! 以降は分類済みのトークンだけを見る。
//!
//! ## 手順
//!
//! 1. 末尾の `&` をバックグラウンド指定として取り除く
//! 2. 最初の `<` / `>` / `>>` + ファイル名の組をリダイレクトとして取り出し、
//!    演算子以降のトークンはすべて捨てる（リダイレクトは 1 行に 1 つだけ）
//! 3. 残りを `|` で分割してステージ列にする（空ステージは捨てる）
//!
//! ビルトイン判定は executor が [`ParsedLine::words`] を使って行う。
//! パースは純粋関数で、同じトークン列からは常に同じ結果が得られる。

use std::fmt;

// ── トークン ────────────────────────────────────────────────────────

/// リダイレクト演算子の種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOp {
    /// `<`
    Input,
    /// `>`
    Output,
    /// `>>`
    Append,
}

/// 役割付きトークン。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// コマンド名・引数・ファイル名。
    Word(String),
    /// `|`
    Pipe,
    /// `<`, `>`, `>>`
    Redirect(RedirectOp),
    /// 行末の `&`。行末以外の `&` はただの [`Token::Word`]。
    Background,
}

impl Token {
    fn classify(raw: &str, is_last: bool) -> Self {
        match raw {
            "|" => Token::Pipe,
            "<" => Token::Redirect(RedirectOp::Input),
            ">" => Token::Redirect(RedirectOp::Output),
            ">>" => Token::Redirect(RedirectOp::Append),
            "&" if is_last => Token::Background,
            _ => Token::Word(raw.to_string()),
        }
    }

    /// 元の文字列表現を返す。
    pub fn as_str(&self) -> &str {
        match self {
            Token::Word(w) => w,
            Token::Pipe => "|",
            Token::Redirect(RedirectOp::Input) => "<",
            Token::Redirect(RedirectOp::Output) => ">",
            Token::Redirect(RedirectOp::Append) => ">>",
            Token::Background => "&",
        }
    }
}

/// 生トークン列を役割付きトークン列に変換する。
pub fn classify(tokens: &[String]) -> Vec<Token> {
    let last = tokens.len().saturating_sub(1);
    tokens
        .iter()
        .enumerate()
        .map(|(i, raw)| Token::classify(raw, i == last))
        .collect()
}

// ── AST ─────────────────────────────────────────────────────────────

/// ファイルリダイレクト指定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirection {
    /// `< path`: 先頭ステージの stdin をファイルから読む
    Input(String),
    /// `> path` / `>> path`: 末尾ステージの stdout をファイルへ書く
    Output { path: String, append: bool },
}

impl Redirection {
    pub fn path(&self) -> &str {
        match self {
            Redirection::Input(path) => path,
            Redirection::Output { path, .. } => path,
        }
    }
}

impl fmt::Display for Redirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Redirection::Input(path) => write!(f, "< {path}"),
            Redirection::Output { path, append: false } => write!(f, "> {path}"),
            Redirection::Output { path, append: true } => write!(f, ">> {path}"),
        }
    }
}

/// パイプライン中の 1 コマンド。argv は空にならない（`argv[0]` がプログラム名）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    argv: Vec<String>,
}

impl Stage {
    /// 空の argv からは作れない。
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() {
            None
        } else {
            Some(Self { argv })
        }
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

/// `|` で接続されたステージ列と、行全体に 1 つだけのリダイレクト・バックグラウンド指定。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
    /// 入力なら先頭ステージ、出力なら末尾ステージにだけ適用する。
    pub redirection: Option<Redirection>,
    pub background: bool,
}

/// [`parse`] の結果。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedLine {
    /// `&` 除去とリダイレクト切り詰め後に残ったトークン（ビルトインにはこれをそのまま渡す）。
    pub words: Vec<String>,
    pub pipeline: Pipeline,
}

impl ParsedLine {
    /// 実行すべきものが何もない行。
    pub fn is_empty(&self) -> bool {
        self.words.is_empty() || self.pipeline.stages.is_empty()
    }
}

// ── パース ──────────────────────────────────────────────────────────

/// トークン列をパースする。
pub fn parse(tokens: &[String]) -> ParsedLine {
    let mut classified = classify(tokens);

    // 1. バックグラウンド
    let background = classified.last() == Some(&Token::Background);
    if background {
        classified.pop();
    }

    // 2. リダイレクト: 最初に見つかった「演算子 + 次のトークン」の組だけを採用する
    let mut redirection = None;
    let found = classified.iter().enumerate().find_map(|(i, t)| match t {
        Token::Redirect(op) if i + 1 < classified.len() => Some((i, *op)),
        _ => None,
    });
    if let Some((pos, op)) = found {
        let target = classified[pos + 1].as_str().to_string();
        redirection = Some(match op {
            RedirectOp::Input => Redirection::Input(target),
            RedirectOp::Output | RedirectOp::Append => Redirection::Output {
                path: target,
                append: op == RedirectOp::Append,
            },
        });
        classified.truncate(pos);
    }

    let words: Vec<String> = classified.iter().map(|t| t.as_str().to_string()).collect();

    // 3. ステージ分割
    let stages = classified
        .split(|t| *t == Token::Pipe)
        .filter_map(|segment| {
            Stage::new(segment.iter().map(|t| t.as_str().to_string()).collect())
        })
        .collect();

    ParsedLine {
        words,
        pipeline: Pipeline {
            stages,
            redirection,
            background,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn parse_line(line: &str) -> ParsedLine {
        parse(&tokenize(line))
    }

    fn argvs(p: &Pipeline) -> Vec<Vec<&str>> {
        p.stages
            .iter()
            .map(|s| s.argv().iter().map(String::as_str).collect())
            .collect()
    }

    // ── 分類 ──

    #[test]
    fn classify_roles() {
        let toks = tokenize("a | b < c > d >> e & f &");
        let c = classify(&toks);
        assert_eq!(c[0], Token::Word("a".into()));
        assert_eq!(c[1], Token::Pipe);
        assert_eq!(c[3], Token::Redirect(RedirectOp::Input));
        assert_eq!(c[5], Token::Redirect(RedirectOp::Output));
        assert_eq!(c[7], Token::Redirect(RedirectOp::Append));
        // 行末以外の `&` は引数
        assert_eq!(c[9], Token::Word("&".into()));
        assert_eq!(c[11], Token::Background);
    }

    #[test]
    fn as_str_round_trips_operators() {
        for raw in ["|", "<", ">", ">>", "word"] {
            assert_eq!(Token::classify(raw, false).as_str(), raw);
        }
        assert_eq!(Token::Background.as_str(), "&");
    }

    // ── 単純コマンド ──

    #[test]
    fn single_command() {
        let line = parse_line("ls -la");
        assert_eq!(argvs(&line.pipeline), vec![vec!["ls", "-la"]]);
        assert_eq!(line.pipeline.redirection, None);
        assert!(!line.pipeline.background);
        assert_eq!(line.words, vec!["ls", "-la"]);
    }

    #[test]
    fn empty_tokens() {
        let line = parse(&[]);
        assert!(line.is_empty());
        assert_eq!(line, ParsedLine::default());
    }

    // ── バックグラウンド ──

    #[test]
    fn background_marker_stripped() {
        let line = parse_line("sleep 5 &");
        assert!(line.pipeline.background);
        assert_eq!(argvs(&line.pipeline), vec![vec!["sleep", "5"]]);
    }

    #[test]
    fn ampersand_not_last_is_argument() {
        let line = parse_line("echo & done");
        assert!(!line.pipeline.background);
        assert_eq!(argvs(&line.pipeline), vec![vec!["echo", "&", "done"]]);
    }

    #[test]
    fn attached_ampersand_is_not_marker() {
        let line = parse_line("sleep 5&");
        assert!(!line.pipeline.background);
        assert_eq!(argvs(&line.pipeline), vec![vec!["sleep", "5&"]]);
    }

    #[test]
    fn bare_ampersand_is_empty() {
        let line = parse_line("&");
        assert!(line.pipeline.background);
        assert!(line.is_empty());
    }

    // ── リダイレクト ──

    #[test]
    fn output_redirect() {
        let line = parse_line("ls > out.txt");
        assert_eq!(
            line.pipeline.redirection,
            Some(Redirection::Output { path: "out.txt".into(), append: false })
        );
        assert_eq!(argvs(&line.pipeline), vec![vec!["ls"]]);
    }

    #[test]
    fn append_redirect() {
        let line = parse_line("ls >> out.txt");
        assert_eq!(
            line.pipeline.redirection,
            Some(Redirection::Output { path: "out.txt".into(), append: true })
        );
    }

    #[test]
    fn input_redirect() {
        let line = parse_line("cat < in.txt");
        assert_eq!(line.pipeline.redirection, Some(Redirection::Input("in.txt".into())));
        assert_eq!(argvs(&line.pipeline), vec![vec!["cat"]]);
    }

    #[test]
    fn only_first_redirect_is_used() {
        let line = parse_line("sort < in.txt > out.txt");
        assert_eq!(line.pipeline.redirection, Some(Redirection::Input("in.txt".into())));
        assert_eq!(argvs(&line.pipeline), vec![vec!["sort"]]);
        assert_eq!(line.words, vec!["sort"]);
    }

    #[test]
    fn tokens_after_redirect_are_dropped() {
        // `| wc` はファイル名の後ろなので消える
        let line = parse_line("ls > out.txt | wc -l");
        assert_eq!(argvs(&line.pipeline), vec![vec!["ls"]]);
        assert_eq!(line.pipeline.stages.len(), 1);
    }

    #[test]
    fn redirect_in_middle_of_pipeline_truncates() {
        let line = parse_line("cat < in.txt | sort | uniq");
        assert_eq!(line.pipeline.redirection, Some(Redirection::Input("in.txt".into())));
        assert_eq!(argvs(&line.pipeline), vec![vec!["cat"]]);
    }

    #[test]
    fn redirect_at_end_of_pipeline() {
        let line = parse_line("echo a | wc -l > count.txt");
        assert_eq!(argvs(&line.pipeline), vec![vec!["echo", "a"], vec!["wc", "-l"]]);
        assert_eq!(line.pipeline.redirection.as_ref().map(Redirection::path), Some("count.txt"));
    }

    #[test]
    fn operator_without_filename_is_literal() {
        let line = parse_line("echo >");
        assert_eq!(line.pipeline.redirection, None);
        assert_eq!(argvs(&line.pipeline), vec![vec!["echo", ">"]]);
    }

    #[test]
    fn redirect_with_background() {
        let line = parse_line("ls > out.txt &");
        assert!(line.pipeline.background);
        assert_eq!(line.pipeline.redirection.as_ref().map(Redirection::path), Some("out.txt"));
    }

    #[test]
    fn redirect_only_is_empty() {
        let line = parse_line("> out.txt");
        assert!(line.is_empty());
        assert!(line.pipeline.redirection.is_some());
    }

    #[test]
    fn quoted_filename() {
        let line = parse_line("echo hi > \"my file.txt\"");
        assert_eq!(line.pipeline.redirection.as_ref().map(Redirection::path), Some("my file.txt"));
    }

    #[test]
    fn redirection_display() {
        assert_eq!(Redirection::Input("a".into()).to_string(), "< a");
        assert_eq!(Redirection::Output { path: "b".into(), append: true }.to_string(), ">> b");
    }

    // ── パイプ ──

    #[test]
    fn two_stage_pipeline() {
        let line = parse_line("echo a | wc -l");
        assert_eq!(argvs(&line.pipeline), vec![vec!["echo", "a"], vec!["wc", "-l"]]);
    }

    #[test]
    fn three_stage_pipeline() {
        let line = parse_line("a | b | c");
        assert_eq!(argvs(&line.pipeline), vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn empty_stages_dropped() {
        let line = parse_line("| a | | b |");
        assert_eq!(argvs(&line.pipeline), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn only_pipes_is_empty() {
        let line = parse_line("| |");
        assert!(line.is_empty());
    }

    #[test]
    fn words_keep_pipe_tokens() {
        let line = parse_line("cd /tmp | ls");
        assert_eq!(line.words, vec!["cd", "/tmp", "|", "ls"]);
    }

    #[test]
    fn stage_rejects_empty_argv() {
        assert!(Stage::new(Vec::new()).is_none());
        let stage = Stage::new(vec!["ls".into()]).unwrap();
        assert_eq!(stage.program(), "ls");
    }

    #[test]
    fn parse_is_idempotent() {
        for line in ["a | b > c &", "cat < x | y", "echo 'a b' | tr a b >> z", ""] {
            let toks = tokenize(line);
            assert_eq!(parse(&toks), parse(&toks), "line: {line}");
        }
    }
}
