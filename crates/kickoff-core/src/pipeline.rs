//! 雛形生成パイプライン。
//!
//! Greeter → Prompter → TemplateFetcher → ProjectMaterializer →
//! DependencyInstaller → Completion の順に一度ずつ実行する。
//! 前のステップに戻ることはなく、最初のエラーで中断する。

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{Greeting, PipelineConfig};
use crate::error::{Error, Result};
use crate::fetch::TemplateFetcher;
use crate::install::DependencyInstaller;
use crate::materialize::{ProjectMaterializer, StagingGuard};
use crate::progress::ProgressEvent;
use crate::template::{TemplateContext, TemplateRenderer};
use crate::validation::validate_dir_name;

/// ディレクトリ名プロンプトの文言。
pub const PROMPT_MESSAGE: &str = "Please enter the directory name for your project:";

/// 進捗を表示するステップ数 (取得・展開・インストール)。
const TOTAL_STEPS: usize = 3;

/// ディレクトリ名を 1 回入力させるポート。
///
/// 再入力のループとバリデーションはパイプライン側で行う。
pub trait NamePrompt {
    /// プロンプトを表示して入力を 1 つ受け取る。
    ///
    /// # Errors
    /// 端末の入出力に失敗した場合。
    fn input_dir_name(&self, message: &str, default: &str) -> Result<String>;

    /// バリデーションエラーを表示する。
    fn show_error(&self, message: &str);
}

/// 表示を担うポート。
pub trait Reporter {
    fn greet(&self, greeting: &Greeting);
    fn progress(&self, event: &ProgressEvent);
    fn complete(&self, report: &ScaffoldReport);
}

/// パイプラインの状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Prompting,
    Fetching,
    Materializing,
    Installing,
    Done,
    Aborted,
}

/// プロンプトで確定したセッション情報。以降は変更しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub dir_name: String,
}

/// 実行結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldReport {
    pub session: SessionConfig,
    /// 生成先 (`<cwd>/<dir_name>`)
    pub destination: PathBuf,
    /// 書き出したファイルの相対パス
    pub files: Vec<PathBuf>,
    /// 依存インストールを実行したか
    pub installed: bool,
    /// 完了メッセージに表示するコマンド
    pub next_steps: Vec<String>,
}

/// 雛形生成ユースケース。
pub struct ScaffoldUseCase<P, F, I, R>
where
    P: NamePrompt,
    F: TemplateFetcher,
    I: DependencyInstaller,
    R: Reporter,
{
    config: PipelineConfig,
    prompt: P,
    fetcher: F,
    installer: I,
    reporter: R,
    stage: Stage,
}

impl<P, F, I, R> ScaffoldUseCase<P, F, I, R>
where
    P: NamePrompt,
    F: TemplateFetcher,
    I: DependencyInstaller,
    R: Reporter,
{
    pub fn new(config: PipelineConfig, prompt: P, fetcher: F, installer: I, reporter: R) -> Self {
        Self {
            config,
            prompt,
            fetcher,
            installer,
            reporter,
            stage: Stage::Init,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// パイプラインを実行する。
    ///
    /// # Arguments
    /// * `cwd` - 生成先の基準ディレクトリ
    /// * `preset_name` - 指定済みのディレクトリ名。Some の場合はプロンプトを出さない
    ///
    /// # Errors
    /// いずれかのステップが失敗した場合。状態は [`Stage::Aborted`] になる。
    pub fn run(&mut self, cwd: &Path, preset_name: Option<&str>) -> Result<ScaffoldReport> {
        match self.run_stages(cwd, preset_name) {
            Ok(report) => {
                self.enter(Stage::Done);
                self.reporter.complete(&report);
                Ok(report)
            }
            Err(e) => {
                self.reporter.progress(&ProgressEvent::Error {
                    message: e.to_string(),
                });
                self.enter(Stage::Aborted);
                Err(e)
            }
        }
    }

    fn run_stages(&mut self, cwd: &Path, preset_name: Option<&str>) -> Result<ScaffoldReport> {
        self.reporter.greet(&self.config.greeting);

        self.enter(Stage::Prompting);
        let session = SessionConfig {
            dir_name: self.collect_dir_name(preset_name)?,
        };
        let destination = cwd.join(&session.dir_name);
        let staging = destination.join(&self.config.staging_dir);

        self.enter(Stage::Fetching);
        let guard = self.fetch(&destination, &staging)?;

        self.enter(Stage::Materializing);
        self.progress_started(2, "Generating project files");
        let renderer =
            TemplateRenderer::new(self.config.syntax, TemplateContext::new(&session.dir_name));
        let files = match ProjectMaterializer::new(renderer).materialize(&staging, &destination) {
            Ok(files) => files,
            Err(e) => {
                self.discard_staging(guard);
                return Err(e);
            }
        };
        guard.disarm();
        info!(files = files.len(), destination = %destination.display(), "project generated");
        self.progress_completed(
            2,
            &format!("Finish generating {} files in {}", files.len(), session.dir_name),
        );

        self.enter(Stage::Installing);
        let installed = self.install(&destination)?;

        let mut next_steps = vec![format!("cd {}", session.dir_name)];
        if !installed {
            next_steps.push(format!(
                "{} {}",
                self.config.package_manager,
                self.config.package_manager.install_args().join(" ")
            ));
        }
        next_steps.push(
            self.config
                .package_manager
                .run_script_command(&self.config.serve_script),
        );

        Ok(ScaffoldReport {
            session,
            destination,
            files,
            installed,
            next_steps,
        })
    }

    /// ディレクトリ名を確定させる。空入力はエラーを表示して再入力させる。
    fn collect_dir_name(&self, preset_name: Option<&str>) -> Result<String> {
        if let Some(name) = preset_name {
            validate_dir_name(name).map_err(Error::InvalidDirName)?;
            return Ok(name.to_string());
        }
        loop {
            let answer = self
                .prompt
                .input_dir_name(PROMPT_MESSAGE, &self.config.default_dir_name)?;
            match validate_dir_name(&answer) {
                Ok(()) => return Ok(answer),
                Err(message) => self.prompt.show_error(&message),
            }
        }
    }

    /// テンプレートをステージングに取得する。
    ///
    /// 失敗時は今回の実行で作ったステージングを削除し、同じく今回作った
    /// 宛先ディレクトリが空のまま残っていればそれも削除する。
    fn fetch(&self, destination: &Path, staging: &Path) -> Result<StagingGuard> {
        let destination_existed = destination.exists();
        self.progress_started(1, &format!("Downloading template {}", self.config.template));

        let guard = StagingGuard::new(staging);
        if !guard.is_armed() {
            self.warn(format!(
                "staging directory {} already exists and will not be cleaned up on failure",
                staging.display()
            ));
        }
        if let Err(e) = self.fetcher.fetch(&self.config.template, staging) {
            self.discard_staging(guard);
            if !destination_existed {
                self.remove_if_empty(destination);
            }
            return Err(e);
        }

        self.progress_completed(1, "Template downloaded");
        Ok(guard)
    }

    fn install(&self, destination: &Path) -> Result<bool> {
        let pm = self.config.package_manager;
        if self.config.skip_install {
            self.reporter.progress(&ProgressEvent::StepSkipped {
                step: 3,
                total: TOTAL_STEPS,
                message: "Dependency install skipped".to_string(),
            });
            return Ok(false);
        }
        self.progress_started(3, &format!("Installing dependencies ({pm} install)"));
        self.installer.install(pm, destination)?;
        self.progress_completed(3, "Finish installing dependencies");
        Ok(true)
    }

    fn discard_staging(&self, guard: StagingGuard) {
        let path = guard.path().to_path_buf();
        if let Err(e) = guard.remove() {
            self.warn(format!(
                "failed to remove staging directory {}: {e}",
                path.display()
            ));
        }
    }

    fn remove_if_empty(&self, dir: &Path) {
        let is_empty = fs::read_dir(dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !is_empty {
            return;
        }
        if let Err(e) = fs::remove_dir(dir) {
            self.warn(format!(
                "failed to remove empty directory {}: {e}",
                dir.display()
            ));
        }
    }

    /// 後片付けの失敗など、実行を止めない問題を通知する。
    fn warn(&self, message: String) {
        warn!("{message}");
        self.reporter.progress(&ProgressEvent::Warning { message });
    }

    fn enter(&mut self, next: Stage) {
        debug!(from = ?self.stage, to = ?next, "stage transition");
        self.stage = next;
    }

    fn progress_started(&self, step: usize, message: &str) {
        self.reporter.progress(&ProgressEvent::StepStarted {
            step,
            total: TOTAL_STEPS,
            message: message.to_string(),
        });
    }

    fn progress_completed(&self, step: usize, message: &str) {
        self.reporter.progress(&ProgressEvent::StepCompleted {
            step,
            total: TOTAL_STEPS,
            message: message.to_string(),
        });
    }
}
