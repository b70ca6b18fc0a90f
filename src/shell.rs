//! シェルの状態を保持するモジュール。
//!
//! 作業ディレクトリはグローバル変数ではなく [`Shell::cwd`] として明示的に持ち回り、
//! `cd` が成功するたびに OS から取り直す。`pwd` はこの値を表示する。

use std::path::PathBuf;

use crate::job::BackgroundTable;

/// シェルの実行状態。REPL ループ全体で共有される。
#[derive(Debug)]
pub struct Shell {
    /// 追跡している作業ディレクトリ。
    pub cwd: PathBuf,
    /// `exit` ビルトインで false になり、REPL ループを終了させる。
    pub running: bool,
    /// 直前のコマンドの終了ステータス。
    pub last_status: i32,
    /// バックグラウンドで起動したプロセスの記録。
    pub background: BackgroundTable,
}

impl Shell {
    pub fn new() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self {
            cwd,
            running: true,
            last_status: 0,
            background: BackgroundTable::new(),
        }
    }

    /// OS の作業ディレクトリを読み直して [`Shell::cwd`] を更新する。
    pub fn refresh_cwd(&mut self) {
        match std::env::current_dir() {
            Ok(dir) => self.cwd = dir,
            Err(e) => log::warn!("getcwd: {}", e),
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}
