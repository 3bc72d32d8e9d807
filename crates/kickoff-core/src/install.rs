use std::fmt;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// 依存インストールに使うパッケージマネージャ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Yarn,
    Pnpm,
}

impl PackageManager {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
        }
    }

    /// 実行ファイル名。Windows では .cmd シムを起動する。
    pub fn program(&self) -> String {
        if cfg!(windows) {
            format!("{}.cmd", self.as_str())
        } else {
            self.as_str().to_string()
        }
    }

    /// インストールコマンドの引数。
    pub fn install_args(&self) -> &'static [&'static str] {
        &["install"]
    }

    /// package.json のスクリプトを実行するコマンド文字列。
    pub fn run_script_command(&self, script: &str) -> String {
        match self {
            PackageManager::Yarn => format!("yarn {script}"),
            PackageManager::Npm | PackageManager::Pnpm => {
                format!("{} run {script}", self.as_str())
            }
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageManager {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "npm" => Ok(PackageManager::Npm),
            "yarn" => Ok(PackageManager::Yarn),
            "pnpm" => Ok(PackageManager::Pnpm),
            other => Err(Error::InvalidValue {
                field: "package_manager",
                value: other.to_string(),
            }),
        }
    }
}

/// 生成したプロジェクトの依存をインストールするポート。
pub trait DependencyInstaller {
    /// `project_dir` を作業ディレクトリとしてインストールを実行する。
    ///
    /// # Errors
    /// プロセスの起動に失敗した場合、または非ゼロで終了した場合。
    fn install(&self, package_manager: PackageManager, project_dir: &Path) -> Result<()>;
}

/// 外部プロセスとしてパッケージマネージャを起動する実装。
///
/// 標準入出力は親プロセスに引き継ぎ、インストールのログはそのまま端末に流す。
#[derive(Debug, Clone, Default)]
pub struct CommandInstaller {
    program_override: Option<String>,
}

impl CommandInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// 起動する実行ファイルを差し替える (テスト用)。
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program_override = Some(program.into());
        self
    }
}

impl DependencyInstaller for CommandInstaller {
    fn install(&self, package_manager: PackageManager, project_dir: &Path) -> Result<()> {
        let program = self
            .program_override
            .clone()
            .unwrap_or_else(|| package_manager.program());
        let args = package_manager.install_args();
        let command_line = format!("{} {}", program, args.join(" "));

        debug!(command = %command_line, cwd = %project_dir.display(), "running install");
        let status = Command::new(&program)
            .args(args)
            .current_dir(project_dir)
            .status()
            .map_err(|e| Error::Install {
                command: command_line.clone(),
                message: format!("failed to start: {e}"),
            })?;

        if !status.success() {
            let code = status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Err(Error::Install {
                command: command_line,
                message: format!("exited with {code}"),
            });
        }
        Ok(())
    }
}
