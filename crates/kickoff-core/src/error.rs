use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// kickoff-core 全体のエラー型。
///
/// パイプラインの各ステップで発生し得る失敗を分類する。
/// いずれもリトライされず、最初のエラーで実行全体が中断される。
#[derive(Debug, Error)]
pub enum Error {
    /// ディレクトリ名のバリデーションエラー
    #[error("{0}")]
    InvalidDirName(String),

    /// テンプレートソース識別子の解釈に失敗
    #[error("invalid template source `{input}`: {reason}")]
    InvalidSource { input: String, reason: String },

    /// 設定ファイルの読み込み・パースに失敗
    #[error("failed to load config {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// 設定値が不正 (未知の列挙値など)
    #[error("invalid value `{value}` for {field}")]
    InvalidValue { field: &'static str, value: String },

    /// プロンプトの入出力に失敗
    #[error("prompt failed: {0}")]
    Prompt(String),

    /// テンプレートの取得に失敗 (ネットワーク・clone・コピー)
    #[error("failed to fetch template {source_id}: {message}")]
    Fetch { source_id: String, message: String },

    /// テンプレートのレンダリングに失敗
    #[error("failed to render {path}: {message}")]
    Render { path: PathBuf, message: String },

    /// ファイルシステム操作に失敗
    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 依存インストールに失敗
    #[error("dependency install failed (`{command}`): {message}")]
    Install { command: String, message: String },
}

impl Error {
    /// I/O エラーをパス付きでラップするヘルパー。
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// kickoff-core の Result エイリアス。
pub type Result<T> = std::result::Result<T, Error>;
