use dialoguer::{theme::ColorfulTheme, Input};

use kickoff_core::{validate_dir_name, Error, NamePrompt, Result};

/// 対話式プロンプトのテーマを取得する。
pub fn theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

/// dialoguer による端末プロンプト。
pub struct DialoguerPrompt {
    theme: ColorfulTheme,
}

impl DialoguerPrompt {
    pub fn new() -> Self {
        Self { theme: theme() }
    }
}

impl Default for DialoguerPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl NamePrompt for DialoguerPrompt {
    /// 空入力は既定値に置き換わるため、空文字列が返るのは既定値が空の場合のみ。
    fn input_dir_name(&self, message: &str, default: &str) -> Result<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(message.trim_end_matches(':'))
            .default(default.to_string())
            .allow_empty(true)
            .validate_with(|input: &String| validate_dir_name(input))
            .interact_text()
            .map_err(|e| Error::Prompt(e.to_string()))
    }

    fn show_error(&self, message: &str) {
        eprintln!("{}", console::style(message).yellow());
    }
}
