//! ログ初期化。
//!
//! tracing-subscriber のテキスト出力を stderr に向ける。
//! 標準出力はバナーや進捗表示に使うため混ぜない。

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// ログレベルを上書きする環境変数。
pub const LOG_ENV: &str = "KICKOFF_LOG";

/// `-v` の個数からフィルタ文字列を決める。
///
/// - 0: warn
/// - 1: info
/// - 2: debug
/// - 3 以上: trace
pub fn filter_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// init_logging は tracing-subscriber を初期化する。
/// `KICKOFF_LOG` が設定されていればそれを優先する。
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(filter_for_verbosity(verbosity)));

    // 二重初期化 (テストなど) は無視する
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
