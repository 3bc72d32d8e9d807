// kickoff-cli: vue-kickoff のコマンドライン・端末表示

pub mod cli;
pub mod logging;
pub mod prompt;
pub mod reporter;
pub mod ui;
