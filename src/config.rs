//! 設定ファイル（`~/.tinyshrc.toml`）の読み込み。
//!
//! ```toml
//! [shell]
//! prompt_suffix = " $ "
//! history_file = "/home/me/.tinysh_history"
//! history_size = 1000
//!
//! [log]
//! level = "warn"
//! ```
//!
//! すべてのキーは省略可能。

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// デフォルトの設定ファイル名（`$HOME` 直下）。
pub const DEFAULT_FILE_NAME: &str = ".tinyshrc.toml";

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub shell: ShellSettings,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ShellSettings {
    /// 作業ディレクトリの後ろに付けるプロンプト文字列。
    pub prompt_suffix: String,
    /// 履歴ファイル。未指定なら履歴を保存しない。
    pub history_file: Option<PathBuf>,
    pub history_size: usize,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            prompt_suffix: " $ ".to_string(),
            history_file: None,
            history_size: 1000,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    /// `off`, `error`, `warn`, `info`, `debug`, `trace`
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 設定を読み込む。
    ///
    /// - `explicit` が指定されていれば、そのファイルが必須
    /// - 未指定なら `$HOME/.tinyshrc.toml` を読み、存在しなければデフォルト
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match explicit {
            Some(p) => (p.to_path_buf(), true),
            None => match default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        Self::parse(&path, &text)
    }
}

/// `$HOME/.tinyshrc.toml`。`$HOME` 未設定なら `None`。
pub fn default_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| Path::new(&home).join(DEFAULT_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        Config::parse(Path::new("test.toml"), text)
    }

    #[test]
    fn empty_file_is_default() {
        let config = parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.shell.prompt_suffix, " $ ");
        assert_eq!(config.shell.history_size, 1000);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn partial_sections() {
        let config = parse("[shell]\nprompt_suffix = \"> \"\n").unwrap();
        assert_eq!(config.shell.prompt_suffix, "> ");
        assert_eq!(config.shell.history_file, None);
        assert_eq!(config.shell.history_size, 1000);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn full_file() {
        let config = parse(
            r#"
[shell]
prompt_suffix = " % "
history_file = "/tmp/hist"
history_size = 50

[log]
level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.shell.history_file, Some(PathBuf::from("/tmp/hist")));
        assert_eq!(config.shell.history_size, 50);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn unknown_key_is_error() {
        let err = parse("[shell]\nprompt = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("test.toml: "));
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let err = Config::load(Some(Path::new("/tinysh/no/such/config.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_explicit_file() {
        let path = std::env::temp_dir().join(format!("tinysh-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[log]\nlevel = \"info\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.log.level, "info");
    }
}
