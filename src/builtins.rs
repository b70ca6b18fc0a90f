//! ビルトインコマンドの実装。
//!
//! ビルトインは fork/exec を経由せずシェルのプロセス内で直接実行される。
//! `try_exec()` が `Some(status)` を返せばビルトインとして処理済み、
//! `None` なら外部コマンドとして executor に委ねる。
//!
//! ビルトインにはリダイレクト・パイプ・バックグラウンドは一切適用されない。

use std::io::Write;

use crate::shell::Shell;

const HELP_TEXT: &str = "\
TinyShell - A simple command shell
Built-in commands:
  cd <dir>  - Change directory
  pwd       - Print working directory
  exit      - Exit the shell
  help      - Show this help message
Features:
  I/O redirection: >, <, >>
  Piping: |
  Background processes: &
";

/// ビルトイン名か判定する。
pub fn is_builtin(name: &str) -> bool {
    matches!(name, "cd" | "pwd" | "exit" | "help")
}

/// ビルトインコマンドの実行を試みる。標準出力への出力は `out` に書く。
///
/// 戻り値:
/// - `Some(status)`: ビルトインとして実行済み
/// - `None`: 該当するビルトインなし（外部コマンドとして実行すべき）
pub fn try_exec(shell: &mut Shell, args: &[String], out: &mut dyn Write) -> Option<i32> {
    let name = args.first()?;
    let status = match name.as_str() {
        "cd" => builtin_cd(shell, args),
        "pwd" => builtin_pwd(shell, out),
        "exit" => builtin_exit(shell, args),
        "help" => builtin_help(out),
        _ => return None,
    };
    log::debug!("builtin {} -> {}", name, status);
    Some(status)
}

/// `cd <dir>`: カレントディレクトリを変更し、追跡中の作業ディレクトリを更新する。
fn builtin_cd(shell: &mut Shell, args: &[String]) -> i32 {
    let Some(target) = args.get(1) else {
        eprintln!("cd: missing argument");
        return 1;
    };
    if let Err(e) = std::env::set_current_dir(target) {
        eprintln!("cd: {}: {}", target, e);
        return 1;
    }
    shell.refresh_cwd();
    0
}

/// `pwd`: 追跡中の作業ディレクトリを表示する。
fn builtin_pwd(shell: &Shell, out: &mut dyn Write) -> i32 {
    match writeln!(out, "{}", shell.cwd.display()) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("pwd: {}", e);
            1
        }
    }
}

/// `exit [N]`: シェルを終了する。N 省略時は 0。
fn builtin_exit(shell: &mut Shell, args: &[String]) -> i32 {
    shell.running = false;
    match args.get(1) {
        None => 0,
        Some(n) => n.parse::<i32>().unwrap_or_else(|_| {
            eprintln!("exit: {}: numeric argument required", n);
            2
        }),
    }
}

fn builtin_help(out: &mut dyn Write) -> i32 {
    match out.write_all(HELP_TEXT.as_bytes()) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("help: {}", e);
            1
        }
    }
}
