use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::DEFAULT_TEMPLATE;
use crate::error::{Error, Result};

/// `direct:<url>[#ref]`
static DIRECT_SOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^direct:([^#]+)(?:#(.+))?$").expect("direct source pattern is a valid regex")
});

/// `[host:][origin:]owner/name[#ref]`
static SHORTHAND_SOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(github|gitlab|bitbucket):)?(?:(.+):)?([^/:#]+)/([^#]+)(?:#(.+))?$")
        .expect("shorthand source pattern is a valid regex")
});

/// Windows のドライブレター付きパス
static WINDOWS_DRIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]:[\\/]").expect("drive pattern is a valid regex"));

/// Git ホスティングサービス。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHost {
    GitHub,
    GitLab,
    Bitbucket,
}

impl GitHost {
    pub fn as_str(&self) -> &'static str {
        match self {
            GitHost::GitHub => "github",
            GitHost::GitLab => "gitlab",
            GitHost::Bitbucket => "bitbucket",
        }
    }

    fn default_origin(&self) -> &'static str {
        match self {
            GitHost::GitHub => "github.com",
            GitHost::GitLab => "gitlab.com",
            GitHost::Bitbucket => "bitbucket.org",
        }
    }
}

/// テンプレートの取得元。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// ホスティングサービス上のリポジトリ (`owner/name` 省略記法)
    Git {
        host: GitHost,
        origin: Option<String>,
        owner: String,
        name: String,
        checkout: Option<String>,
    },
    /// 任意の clone URL
    Direct {
        url: String,
        checkout: Option<String>,
    },
    /// ローカルディレクトリ
    Local { path: PathBuf },
}

impl TemplateSource {
    /// git clone に渡す URL。ローカルソースの場合は None。
    pub fn clone_url(&self) -> Option<String> {
        match self {
            TemplateSource::Git {
                host,
                origin,
                owner,
                name,
                ..
            } => {
                let origin = origin.as_deref().unwrap_or(host.default_origin());
                let base = if origin.starts_with("http://")
                    || origin.starts_with("https://")
                    || origin.starts_with("git@")
                {
                    origin.trim_end_matches('/').to_string()
                } else {
                    format!("https://{}", origin.trim_end_matches('/'))
                };
                let sep = if base.starts_with("git@") { ":" } else { "/" };
                let name = name.trim_end_matches(".git");
                Some(format!("{base}{sep}{owner}/{name}.git"))
            }
            TemplateSource::Direct { url, .. } => Some(url.clone()),
            TemplateSource::Local { .. } => None,
        }
    }

    /// チェックアウトするブランチ・タグ。
    pub fn checkout(&self) -> Option<&str> {
        match self {
            TemplateSource::Git { checkout, .. } | TemplateSource::Direct { checkout, .. } => {
                checkout.as_deref()
            }
            TemplateSource::Local { .. } => None,
        }
    }
}

impl Default for TemplateSource {
    fn default() -> Self {
        let (owner, name) = DEFAULT_TEMPLATE
            .split_once('/')
            .unwrap_or(("alienzhou", "webpack-kickoff-template"));
        TemplateSource::Git {
            host: GitHost::GitHub,
            origin: None,
            owner: owner.to_string(),
            name: name.to_string(),
            checkout: None,
        }
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::Git {
                host,
                origin,
                owner,
                name,
                checkout,
            } => {
                if *host != GitHost::GitHub || origin.is_some() {
                    write!(f, "{}:", host.as_str())?;
                }
                if let Some(origin) = origin {
                    write!(f, "{origin}:")?;
                }
                write!(f, "{owner}/{name}")?;
                if let Some(checkout) = checkout {
                    write!(f, "#{checkout}")?;
                }
                Ok(())
            }
            TemplateSource::Direct { url, checkout } => {
                write!(f, "direct:{url}")?;
                if let Some(checkout) = checkout {
                    write!(f, "#{checkout}")?;
                }
                Ok(())
            }
            TemplateSource::Local { path } => write!(f, "file:{}", path.display()),
        }
    }
}

impl FromStr for TemplateSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let input = s.trim();
        let invalid = |reason: &str| Error::InvalidSource {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        if let Some(path) = input.strip_prefix("file:") {
            if path.is_empty() {
                return Err(invalid("empty local path"));
            }
            return Ok(TemplateSource::Local {
                path: expand_home(path),
            });
        }
        if looks_like_local_path(input) {
            return Ok(TemplateSource::Local {
                path: expand_home(input),
            });
        }
        if let Some(caps) = DIRECT_SOURCE.captures(input) {
            let url = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
            return Ok(TemplateSource::Direct {
                url,
                checkout: caps.get(2).map(|m| m.as_str().to_string()),
            });
        }
        if let Some(caps) = SHORTHAND_SOURCE.captures(input) {
            let host = match caps.get(1).map(|m| m.as_str()) {
                Some("gitlab") => GitHost::GitLab,
                Some("bitbucket") => GitHost::Bitbucket,
                _ => GitHost::GitHub,
            };
            let owner = caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default();
            let name = caps.get(4).map(|m| m.as_str().to_string()).unwrap_or_default();
            if name.contains('/') {
                return Err(invalid("expected `owner/name`"));
            }
            return Ok(TemplateSource::Git {
                host,
                origin: caps.get(2).map(|m| m.as_str().to_string()),
                owner,
                name,
                checkout: caps.get(5).map(|m| m.as_str().to_string()),
            });
        }
        Err(invalid(
            "expected `owner/name[#ref]`, `<host>:owner/name`, `direct:<url>` or a local path",
        ))
    }
}

fn looks_like_local_path(input: &str) -> bool {
    input == "."
        || input == ".."
        || input.starts_with('/')
        || input.starts_with("./")
        || input.starts_with("../")
        || input.starts_with(".\\")
        || input.starts_with("..\\")
        || input == "~"
        || input.starts_with("~/")
        || WINDOWS_DRIVE.is_match(input)
}

fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// テンプレートをステージングディレクトリへ取得するポート。
pub trait TemplateFetcher {
    /// `source` の内容を `staging` に展開する。
    ///
    /// # Errors
    /// 取得に失敗した場合は [`Error::Fetch`] を返す。
    fn fetch(&self, source: &TemplateSource, staging: &Path) -> Result<()>;
}

/// git clone とローカルコピーでテンプレートを取得する実装。
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    git_program: String,
}

impl SourceFetcher {
    pub fn new() -> Self {
        Self {
            git_program: "git".to_string(),
        }
    }

    /// 使用する git 実行ファイルを差し替える。
    pub fn with_git_program(mut self, program: impl Into<String>) -> Self {
        self.git_program = program.into();
        self
    }

    fn clone_repository(&self, source: &TemplateSource, url: &str, staging: &Path) -> Result<()> {
        let fail = |message: String| Error::Fetch {
            source_id: source.to_string(),
            message,
        };

        let mut cmd = Command::new(&self.git_program);
        cmd.args(["clone", "--depth", "1"]);
        if let Some(checkout) = source.checkout() {
            cmd.args(["--branch", checkout]);
        }
        cmd.arg(url)
            .arg(staging)
            // 認証待ちでハングさせない
            .env("GIT_TERMINAL_PROMPT", "0");

        debug!(url, staging = %staging.display(), "cloning template");
        let output = cmd
            .output()
            .map_err(|e| fail(format!("failed to run `{}`: {e}", self.git_program)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Err(fail(format!(
                "git clone exited with {code}: {}",
                stderr.trim()
            )));
        }

        let git_dir = staging.join(".git");
        if git_dir.exists() {
            fs::remove_dir_all(&git_dir)
                .map_err(|e| Error::io("failed to remove", git_dir, e))?;
        }
        Ok(())
    }
}

impl Default for SourceFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateFetcher for SourceFetcher {
    fn fetch(&self, source: &TemplateSource, staging: &Path) -> Result<()> {
        match source {
            TemplateSource::Local { path } => copy_local_tree(source, path, staging),
            _ => {
                let url = source.clone_url().ok_or_else(|| Error::Fetch {
                    source_id: source.to_string(),
                    message: "no clone url".to_string(),
                })?;
                self.clone_repository(source, &url, staging)
            }
        }
    }
}

/// ローカルのテンプレートディレクトリをステージングへコピーする。
///
/// `.git` ディレクトリはコピーしない。
fn copy_local_tree(source: &TemplateSource, root: &Path, staging: &Path) -> Result<()> {
    if !root.is_dir() {
        return Err(Error::Fetch {
            source_id: source.to_string(),
            message: format!("template directory not found: {}", root.display()),
        });
    }
    fs::create_dir_all(staging).map_err(|e| Error::io("failed to create", staging, e))?;

    let walker = WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");
    for entry in walker {
        let entry = entry.map_err(|e| Error::Fetch {
            source_id: source.to_string(),
            message: e.to_string(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| Error::Fetch {
                source_id: source.to_string(),
                message: e.to_string(),
            })?;
        let target = staging.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| Error::io("failed to create", &target, e))?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|e| Error::io("failed to copy", entry.path(), e))?;
        }
    }
    Ok(())
}
