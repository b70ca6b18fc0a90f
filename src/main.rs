//! tinysh: 小さな対話型コマンドシェル
//!
//! REPLループ: プロンプト表示 → 行エディタで入力読み取り → トークン化 → パース → 実行 → ループ
//!
//! `-c <line>` を指定した場合は 1 行だけ実行し、その終了ステータスで終了する。

use std::path::PathBuf;

use argh::FromArgs;
use log::LevelFilter;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use tinysh::config::{Config, ShellSettings};
use tinysh::executor;
use tinysh::logging;
use tinysh::shell::Shell;

/// a tiny interactive command shell with pipes, redirection and background jobs.
#[derive(FromArgs)]
struct Args {
    /// run a single command line and exit with its status
    #[argh(option, short = 'c')]
    command: Option<String>,

    /// configuration file (default: ~/.tinyshrc.toml)
    #[argh(option)]
    config: Option<PathBuf>,

    /// enable debug logging
    #[argh(switch, short = 'v')]
    verbose: bool,
}

/// 行エディタで 1 行ずつ読み取り、実行する。`exit` か EOF で抜ける。
fn repl(shell: &mut Shell, settings: &ShellSettings) -> rustyline::Result<()> {
    let rl_config = rustyline::Config::builder()
        .max_history_size(settings.history_size)?
        .auto_add_history(false)
        .build();
    let mut editor = DefaultEditor::with_config(rl_config)?;

    if let Some(path) = &settings.history_file {
        // 初回起動時はファイルがない
        if let Err(e) = editor.load_history(path) {
            log::debug!("history {}: {}", path.display(), e);
        }
    }

    while shell.running {
        // プロンプト: 作業ディレクトリ + サフィックス
        let prompt = format!("{}{}", shell.cwd.display(), settings.prompt_suffix);
        match editor.readline(&prompt) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => {
                editor.add_history_entry(line.as_str())?;
                executor::run_line(shell, &line);
            }
            // Ctrl+C: 入力中の行を捨てて次のプロンプトへ
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(e) => return Err(e),
        }
    }

    if let Some(path) = &settings.history_file {
        if let Err(e) = editor.save_history(path) {
            log::warn!("history {}: {}", path.display(), e);
        }
    }
    Ok(())
}

fn main() {
    let args: Args = argh::from_env();

    // 設定の読み込みエラーはロガー初期化後に報告し、デフォルト設定で続行する
    let (config, config_error) = match Config::load(args.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        logging::parse_level(&config.log.level)
    };
    logging::init(level);

    if let Some(e) = config_error {
        eprintln!("tinysh: {}", e);
    }

    // シェル自体は SIGINT/SIGTERM を無視する。子プロセスは exec 前にデフォルトへ戻す。
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_IGN);
        libc::signal(libc::SIGTERM, libc::SIG_IGN);
    }

    let mut shell = Shell::new();

    if let Some(line) = args.command {
        let status = executor::run_line(&mut shell, &line);
        std::process::exit(status);
    }

    if let Err(e) = repl(&mut shell, &config.shell) {
        eprintln!("tinysh: {}", e);
    }

    std::process::exit(shell.last_status);
}
