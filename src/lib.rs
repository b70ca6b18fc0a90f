//! tinysh ライブラリ: テスト・ベンチマーク用にモジュールを公開する。
//!
//! バイナリ本体は `main.rs` の REPL ループ。
//! この `lib.rs` は `tests/` や `benches/bench_main.rs` から
//! トークナイザ・パーサー・実行エンジンに直接アクセスするために存在する。
//!
//! ## モジュール構成
//!
//! | モジュール | 役割 |
//! |-----------|------|
//! | [`tokenizer`] | 行のトークン化（空白区切り、`"`/`'` によるクォート領域） |
//! | [`parser`] | トークンの役割分類、`&` / リダイレクト 1 つ / `|` によるステージ分割 |
//! | [`executor`] | ディスパッチ（ビルトイン → 単一コマンド / パイプライン）、エラー報告 |
//! | [`spawn`] | `fork` + `execvp` ラッパー（子側の fd 付け替え、パイプ） |
//! | [`job`] | フォアグラウンド待機、終了ステータス変換、バックグラウンド PID の記録 |
//! | [`builtins`] | ビルトイン（`cd`, `pwd`, `exit`, `help`） |
//! | [`shell`] | シェルの状態（作業ディレクトリ、終了フラグ、直前のステータス） |
//! | [`error`] | エラー型 |
//! | [`config`] | 設定ファイル（`~/.tinyshrc.toml`） |
//! | [`logging`] | ロガー初期化 |

pub mod builtins;
pub mod config;
pub mod error;
pub mod executor;
pub mod job;
pub mod logging;
pub mod parser;
pub mod shell;
pub mod spawn;
pub mod tokenizer;
