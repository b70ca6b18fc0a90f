//! エラー型。
//!
//! - [`ExecError`]: 親プロセス側（fork 前後）の失敗
//! - [`ChildError`]: 子プロセス側（fork 後、exec 前）の失敗。子はこれを報告して `_exit` する（dup2 の失敗も含む）
//! - [`ConfigError`]: 設定ファイルの読み込み失敗
//!
//! どれも最終的には終了ステータス（整数）に変換され、構造化されたまま呼び出し側へ返ることはない。

use std::io;
use std::path::PathBuf;

/// 親プロセス側で発生する実行エラー。
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// `fork` 失敗（リソース枯渇など）。
    #[error("fork: {0}")]
    Fork(#[source] io::Error),
    /// `pipe` 失敗。パイプライン全体を起動前に中止する。
    #[error("pipe: {0}")]
    Pipe(#[source] io::Error),
    /// 引数やパスに NUL バイトが含まれ、C 文字列に変換できない。
    #[error("{0}: argument contains a NUL byte")]
    Nul(String),
}

impl ExecError {
    pub fn exit_status(&self) -> i32 {
        1
    }
}

/// 子プロセス側で発生するエラー。
///
/// fork 後の子で作られるので、文字列は fork 前に用意したものを借用するだけで確保しない。
#[derive(Debug, thiserror::Error)]
pub enum ChildError<'a> {
    /// リダイレクト先ファイルを開けない。
    #[error("{path}: {source}")]
    Redirect {
        path: &'a str,
        #[source]
        source: io::Error,
    },
    /// `dup2` による fd の付け替えに失敗した。
    #[error("dup2: {0}")]
    Dup(#[source] io::Error),
    #[error("{0}: command not found")]
    NotFound(&'a str),
    #[error("{0}: permission denied")]
    PermissionDenied(&'a str),
    #[error("{program}: {source}")]
    Exec {
        program: &'a str,
        #[source]
        source: io::Error,
    },
}

impl<'a> ChildError<'a> {
    /// `execvp` が返した errno からエラーを作る。
    pub fn from_exec(program: &'a str, err: io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::ENOENT) => ChildError::NotFound(program),
            Some(libc::EACCES) => ChildError::PermissionDenied(program),
            _ => ChildError::Exec {
                program,
                source: err,
            },
        }
    }

    /// 子プロセスの終了コード。127 = command not found, 126 = permission denied, 1 = その他。
    pub fn exit_status(&self) -> i32 {
        match self {
            ChildError::NotFound(_) => 127,
            ChildError::PermissionDenied(_) => 126,
            ChildError::Redirect { .. } | ChildError::Dup(_) | ChildError::Exec { .. } => 1,
        }
    }

    /// メッセージの主語（パス・プログラム名・`dup2`）。
    pub fn subject(&self) -> &str {
        match self {
            ChildError::Redirect { path, .. } => *path,
            ChildError::Dup(_) => "dup2",
            ChildError::NotFound(program)
            | ChildError::PermissionDenied(program)
            | ChildError::Exec { program, .. } => *program,
        }
    }

    /// 原因の errno。固定文言で報告するものは `None`。
    pub fn errno(&self) -> Option<i32> {
        match self {
            ChildError::Redirect { source, .. }
            | ChildError::Dup(source)
            | ChildError::Exec { source, .. } => source.raw_os_error(),
            ChildError::NotFound(_) | ChildError::PermissionDenied(_) => None,
        }
    }
}

/// 設定ファイルの読み込みエラー。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
