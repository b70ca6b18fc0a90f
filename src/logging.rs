//! ロガーの初期化。`simplelog::TermLogger` で stderr に出力する。

use std::str::FromStr;

use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// レベル名を解釈する。不明な名前は `Warn`。
pub fn parse_level(name: &str) -> LevelFilter {
    LevelFilter::from_str(name.trim()).unwrap_or(LevelFilter::Warn)
}

/// ロガーを初期化する。二重初期化などの失敗は無視する（ログがなくてもシェルは動く）。
pub fn init(level: LevelFilter) {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level("INFO"), LevelFilter::Info);
        assert_eq!(parse_level(" off "), LevelFilter::Off);
        assert_eq!(parse_level("verbose"), LevelFilter::Warn);
    }
}
