use std::io;
use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::Shell;

use kickoff_core::KickoffConfig;

#[derive(Parser, Debug)]
#[command(
    name = "vue-kickoff",
    version,
    about = "Create a Vue project from a template repository"
)]
pub struct Cli {
    /// Project directory name (prompted when omitted)
    #[arg(value_name = "DIR_NAME")]
    pub dir_name: Option<String>,

    /// Template source (owner/name, github:owner/name#ref, https://..., file:./path)
    #[arg(short, long)]
    pub template: Option<String>,

    /// Substitution syntax used by the template files
    #[arg(long, value_parser = ["ejs", "tera"])]
    pub syntax: Option<String>,

    /// Package manager used to install dependencies
    #[arg(short, long, value_parser = ["npm", "yarn", "pnpm"])]
    pub package_manager: Option<String>,

    /// Skip the dependency install step
    #[arg(long, default_value_t = false)]
    pub skip_install: bool,

    /// Accept the default directory name without prompting
    #[arg(short, long, default_value_t = false)]
    pub yes: bool,

    /// Config file path
    #[arg(short, long, env = "KICKOFF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print a shell completion script and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// コマンドライン引数で設定ファイルの値を上書きする。
    ///
    /// # Errors
    /// `--syntax` / `--package-manager` の値が解釈できない場合。
    pub fn apply_overrides(&self, config: &mut KickoffConfig) -> kickoff_core::Result<()> {
        if let Some(template) = &self.template {
            config.template = template.clone();
        }
        if let Some(syntax) = &self.syntax {
            config.syntax = syntax.parse()?;
        }
        if let Some(pm) = &self.package_manager {
            config.package_manager = pm.parse()?;
        }
        if self.skip_install {
            config.skip_install = true;
        }
        Ok(())
    }

    /// プロンプトを省略する場合のディレクトリ名。
    ///
    /// 位置引数が優先され、`--yes` のみの場合は既定値を使う。
    pub fn preset_dir_name<'a>(&'a self, default: &'a str) -> Option<&'a str> {
        match (&self.dir_name, self.yes) {
            (Some(name), _) => Some(name.as_str()),
            (None, true) => Some(default),
            (None, false) => None,
        }
    }
}

/// シェル補完スクリプトを標準出力に書き出す。
pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
}
