//! トークナイザ: 1 行の入力を文字列トークン列に分割する。
//!
//! 規則は単純で、空白で区切り、`"` / `'` でクォート領域をトグルするだけ。
//!
//! - クォート文字自体はトークンに含めない（対応が取れていなくても常に除去）
//! - `"` と `'` は区別しない（`"` で開いた領域を `'` で閉じられる）
//! - エスケープ文字はない
//! - 閉じられていないクォートはエラーにせず、行末までをクォート領域として扱う
//!
//! 演算子（`|`, `<`, `>`, `>>`, `&`）の判定はここでは行わない。
//! 役割の分類は [`parser`](crate::parser) が一度だけ行う。

/// 入力行をトークン列に分割する。
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' | '\'' => in_quotes = !in_quotes,
            ' ' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
