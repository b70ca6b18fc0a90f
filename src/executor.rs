//! コマンド実行: トークン化 → パース → ビルトイン判定 → 単一コマンド起動 / パイプライン起動。
//!
//! - [`run_line`]: 1 行を実行して終了ステータスを返す（REPL の入口）
//! - [`execute`]: パース済みの行をディスパッチする
//! - [`launch`]: ステージ 1 つを子プロセスとして起動する
//! - [`run_pipeline`]: 2 つ以上のステージを N-1 本のパイプでつないで起動する
//!
//! エラーはここで `tinysh: ...` として stderr に報告し、終了ステータスに変換する。

use std::io::{self, Write};
use std::os::unix::io::RawFd;

use libc::pid_t;

use crate::builtins;
use crate::error::ExecError;
use crate::job;
use crate::parser::{self, ParsedLine, Redirection, Stage};
use crate::shell::Shell;
use crate::spawn::{self, CStringVec, ChildSpec, OpenTarget, Pipe};
use crate::tokenizer;

/// 1 行を実行し、終了ステータスを返す。`shell.last_status` も更新する。
pub fn run_line(shell: &mut Shell, line: &str) -> i32 {
    let tokens = tokenizer::tokenize(line);
    log::debug!("tokens: {:?}", tokens);
    let parsed = parser::parse(&tokens);
    let status = execute(shell, &parsed);
    shell.last_status = status;
    status
}

/// パース済みの行を実行する。
///
/// ディスパッチ:
/// 1. 何も残っていない → 0
/// 2. 先頭がビルトイン → [`builtins::try_exec`]（リダイレクト・パイプ・`&` は無視）
/// 3. ステージ 1 つ → [`launch`]
/// 4. ステージ 2 つ以上 → [`run_pipeline`]
pub fn execute(shell: &mut Shell, line: &ParsedLine) -> i32 {
    if line.is_empty() {
        return 0;
    }
    let mut out = io::stdout();
    if let Some(status) = builtins::try_exec(shell, &line.words, &mut out) {
        return status;
    }

    let pipeline = &line.pipeline;
    log::debug!("pipeline: {:?}", pipeline);
    let redirection = pipeline.redirection.as_ref();
    match pipeline.stages.as_slice() {
        [] => 0,
        [stage] => launch(shell, stage, redirection, pipeline.background, &mut out),
        stages => run_pipeline(shell, stages, redirection, pipeline.background, &mut out),
    }
}

// ── 単一コマンド ─────────────────────────────────────────────────────

/// ステージ 1 つを子プロセスとして起動する。
///
/// background なら PID を `out` に `[pid]` と書いて即座に 0 を返す。
/// それ以外は終了を待ってその終了ステータスを返す。
pub fn launch(
    shell: &mut Shell,
    stage: &Stage,
    redirection: Option<&Redirection>,
    background: bool,
    out: &mut dyn Write,
) -> i32 {
    let pid = match spawn_stage(stage, redirection, background) {
        Ok(pid) => pid,
        Err(e) => return report(&e),
    };

    if background {
        announce(shell, &[pid], out);
        0
    } else {
        job::wait_for(pid)
    }
}

fn spawn_stage(
    stage: &Stage,
    redirection: Option<&Redirection>,
    background: bool,
) -> Result<pid_t, ExecError> {
    let argv = CStringVec::from_stage(stage)?;
    let target = redirection.map(OpenTarget::prepare).transpose()?;
    let pid = spawn::spawn(&ChildSpec {
        argv: &argv,
        redirect: target.as_ref(),
        stdin: None,
        stdout: None,
        close_fds: &[],
        background,
    })?;
    log::debug!("spawned {} as pid {}", stage.program(), pid);
    Ok(pid)
}

// ── パイプライン ─────────────────────────────────────────────────────

/// 2 つ以上のステージをパイプでつないで起動する。
///
/// 入力リダイレクトは先頭ステージ、出力リダイレクトは末尾ステージにだけ適用する。
/// background なら先頭ステージの PID だけを `out` に書いて 0 を返す。
/// foreground なら全ステージの終了を待ち、各ステージのステータスに関係なく 0 を返す。
pub fn run_pipeline(
    shell: &mut Shell,
    stages: &[Stage],
    redirection: Option<&Redirection>,
    background: bool,
    out: &mut dyn Write,
) -> i32 {
    let pids = match spawn_pipeline(stages, redirection, background) {
        Ok(pids) => pids,
        Err(e) => return report(&e),
    };

    if background {
        announce(shell, &pids, out);
    } else {
        job::wait_all(&pids);
    }
    0
}

/// 全ステージを fork し、PID をステージ順に返す。
///
/// 親はパイプのデータを読み書きしないので、起動後すぐに全パイプ fd を閉じる。
/// 途中で fork に失敗した場合は、起動済みのステージを待ってからエラーを返す。
fn spawn_pipeline(
    stages: &[Stage],
    redirection: Option<&Redirection>,
    background: bool,
) -> Result<Vec<pid_t>, ExecError> {
    if stages.is_empty() {
        return Ok(Vec::new());
    }
    let argvs = stages
        .iter()
        .map(CStringVec::from_stage)
        .collect::<Result<Vec<_>, _>>()?;
    let target = redirection.map(OpenTarget::prepare).transpose()?;

    // N-1 本のパイプを先に作る。途中で失敗したら作成済みの分は Drop で閉じられる
    let pipes = (1..stages.len())
        .map(|_| Pipe::new())
        .collect::<io::Result<Vec<_>>>()
        .map_err(ExecError::Pipe)?;
    let all_fds: Vec<RawFd> = pipes
        .iter()
        .flat_map(|p| [p.read_fd(), p.write_fd()])
        .collect();

    let last = stages.len() - 1;
    let mut pids = Vec::with_capacity(stages.len());
    let mut failure = None;

    for (i, argv) in argvs.iter().enumerate() {
        let redirect = target
            .as_ref()
            .filter(|t| if t.is_input() { i == 0 } else { i == last });
        let spec = ChildSpec {
            argv,
            redirect,
            stdin: (i > 0).then(|| pipes[i - 1].read_fd()),
            stdout: (i < last).then(|| pipes[i].write_fd()),
            close_fds: &all_fds,
            background,
        };
        match spawn::spawn(&spec) {
            Ok(pid) => {
                log::debug!("stage {} ({}) spawned as pid {}", i, stages[i].program(), pid);
                pids.push(pid);
            }
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    drop(pipes);

    if let Some(e) = failure {
        job::wait_all(&pids);
        return Err(e);
    }
    Ok(pids)
}

// ── 報告 ────────────────────────────────────────────────────────────

fn report(err: &ExecError) -> i32 {
    eprintln!("tinysh: {}", err);
    err.exit_status()
}

/// バックグラウンド起動を報告する。表示するのは先頭の PID だけ。
fn announce(shell: &mut Shell, pids: &[pid_t], out: &mut dyn Write) {
    if let Some(first) = pids.first() {
        if let Err(e) = writeln!(out, "[{}]", first).and_then(|()| out.flush()) {
            log::warn!("failed to report background pid {}: {}", first, e);
        }
    }
    for &pid in pids {
        shell.background.record(pid);
    }
}
