use std::cell::RefCell;
use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};

use kickoff_core::progress::print_progress;
use kickoff_core::{Greeting, ProgressEvent, Reporter, ScaffoldReport};

use crate::ui;

/// 取得・展開・インストールのうち、インストールのステップ番号。
const INSTALL_STEP: usize = 3;

/// 端末向けの Reporter。
///
/// TTY ではスピナーを表示し、それ以外では 1 行ずつ出力する。
/// インストール中はパッケージマネージャの出力がそのまま流れるため
/// スピナーは使わない。
pub struct ConsoleReporter {
    interactive: bool,
    spinner: RefCell<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::with_interactive(Term::stdout().is_term())
    }

    pub fn with_interactive(interactive: bool) -> Self {
        Self {
            interactive,
            spinner: RefCell::new(None),
        }
    }

    fn start_spinner(&self, message: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        *self.spinner.borrow_mut() = Some(pb);
    }

    fn finish_spinner(&self, message: String) -> bool {
        match self.spinner.borrow_mut().take() {
            Some(pb) => {
                pb.finish_with_message(message);
                true
            }
            None => false,
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn greet(&self, greeting: &Greeting) {
        ui::render_welcome(greeting);
    }

    fn progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::StepStarted { step, .. } if *step == INSTALL_STEP => {
                println!();
                println!("📦 Install dependencies...");
            }
            ProgressEvent::StepStarted { message, .. } if self.interactive => {
                self.start_spinner(message);
            }
            ProgressEvent::StepCompleted { step, message, .. } => {
                let line = match *step {
                    2 => ui::format_done(
                        "📂 Finish generating the project template and configuration.",
                    ),
                    INSTALL_STEP => ui::format_done("📦 Finish installing dependencies."),
                    _ => ui::format_done(message),
                };
                if !self.finish_spinner(line.clone()) {
                    println!("{line}");
                }
            }
            ProgressEvent::StepSkipped { message, .. } if self.interactive => {
                println!("{}", ui::format_skipped(message));
            }
            ProgressEvent::Error { message } => {
                if let Some(pb) = self.spinner.borrow_mut().take() {
                    pb.abandon_with_message(ui::format_failed("failed"));
                }
                tracing::debug!(error = %message, "pipeline aborted");
            }
            ProgressEvent::Warning { message } => {
                let line = ui::format_warning(message);
                match self.spinner.borrow().as_ref() {
                    Some(pb) => pb.println(line),
                    None => eprintln!("{line}"),
                }
            }
            other => {
                if !self.interactive {
                    print_progress(other);
                }
            }
        }
    }

    fn complete(&self, report: &ScaffoldReport) {
        ui::render_completion(report);
    }
}
