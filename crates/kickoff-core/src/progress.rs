use serde::{Deserialize, Serialize};

/// 進捗イベント。
///
/// パイプラインの各ステップ (取得・展開・インストール) の進捗を
/// Reporter に通知するための型。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum ProgressEvent {
    /// ステップ開始
    StepStarted {
        step: usize,
        total: usize,
        message: String,
    },
    /// ステップ完了
    StepCompleted {
        step: usize,
        total: usize,
        message: String,
    },
    /// ステップをスキップした
    StepSkipped {
        step: usize,
        total: usize,
        message: String,
    },
    /// 実行は継続する問題 (後片付けの失敗など)
    Warning { message: String },
    /// エラー
    Error { message: String },
}

/// プログレスイベントを stdout に出力するデフォルト表示。
pub fn print_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::StepStarted {
            step,
            total,
            message,
        } => {
            println!("[{step}/{total}] {message} ...");
        }
        ProgressEvent::StepCompleted {
            step,
            total,
            message,
        } => {
            println!("[{step}/{total}] \u{2713} {message}");
        }
        ProgressEvent::StepSkipped {
            step,
            total,
            message,
        } => {
            println!("[{step}/{total}] - {message}");
        }
        ProgressEvent::Warning { message } => {
            println!("  warning: {message}");
        }
        ProgressEvent::Error { message } => {
            eprintln!("  error: {message}");
        }
    }
}
