use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fetch::TemplateSource;
use crate::install::PackageManager;
use crate::template::Syntax;

/// 既定のテンプレートリポジトリ。
pub const DEFAULT_TEMPLATE: &str = "alienzhou/webpack-kickoff-template";
/// 既定のプロジェクトディレクトリ名。
pub const DEFAULT_DIR_NAME: &str = "vue-app";
/// 既定のステージングディレクトリ名 (`<dir_name>/.tmp`)。
pub const DEFAULT_STAGING_DIR: &str = ".tmp";
/// 既定の起動スクリプト名。
pub const DEFAULT_SERVE_SCRIPT: &str = "serve";
/// カレントディレクトリで探索する設定ファイル名。
pub const CONFIG_FILE_NAME: &str = "kickoff.yaml";

/// 設定ファイル (kickoff.yaml) の内容。
///
/// すべての項目は省略可能で、省略時は既定値が使われる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KickoffConfig {
    /// テンプレートソース識別子
    pub template: String,
    /// プロンプトの既定ディレクトリ名
    pub default_dir_name: String,
    /// ステージングディレクトリ名
    pub staging_dir: String,
    /// 置換構文
    pub syntax: Syntax,
    /// パッケージマネージャ
    pub package_manager: PackageManager,
    /// 完了メッセージに表示する起動スクリプト
    pub serve_script: String,
    /// 依存インストールをスキップするか
    pub skip_install: bool,
}

impl Default for KickoffConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            default_dir_name: DEFAULT_DIR_NAME.to_string(),
            staging_dir: DEFAULT_STAGING_DIR.to_string(),
            syntax: Syntax::default(),
            package_manager: PackageManager::default(),
            serve_script: DEFAULT_SERVE_SCRIPT.to_string(),
            skip_install: false,
        }
    }
}

/// 設定ファイルを読み込む。
///
/// YAML 形式の設定ファイルを読み込む。
/// ファイルが存在しない場合はデフォルト値を返す。
///
/// # Errors
/// ファイルの読み込み・パースに失敗した場合。
pub fn load_config(path: &Path) -> Result<KickoffConfig> {
    if !path.exists() {
        return Ok(KickoffConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    // 空ファイルは serde_yaml では null として扱われるため既定値にする
    if content.trim().is_empty() {
        return Ok(KickoffConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// 読み込む設定ファイルのパスを決定する。
///
/// 優先順位: 明示指定 > `<cwd>/kickoff.yaml` > `<ユーザー設定ディレクトリ>/kickoff/config.yaml`。
/// いずれも存在しない場合は None を返す。
pub fn resolve_config_path(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = cwd.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("kickoff").join("config.yaml"))
        .filter(|path| path.is_file())
}

/// ウェルカムバナーの文言。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    pub title: String,
    pub version: String,
    pub tagline: String,
}

impl Greeting {
    pub fn new(version: &str) -> Self {
        Self {
            title: "Welcome to use vue-kickoff".to_string(),
            version: version.to_string(),
            tagline: "You can create a frontend project very quickly.".to_string(),
        }
    }
}

/// パイプラインに渡す解決済みの設定。
///
/// 設定ファイルとコマンドライン引数をマージした結果で、
/// 実行中は変更されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub template: TemplateSource,
    pub default_dir_name: String,
    pub staging_dir: String,
    pub syntax: Syntax,
    pub package_manager: PackageManager,
    pub serve_script: String,
    pub skip_install: bool,
    pub greeting: Greeting,
}

impl PipelineConfig {
    /// 設定ファイルの内容から PipelineConfig を構築する。
    ///
    /// # Errors
    /// テンプレートソースが解釈できない場合、またはステージングディレクトリ名が
    /// 単一の通常パス要素でない場合。
    pub fn from_config(config: &KickoffConfig, greeting: Greeting) -> Result<Self> {
        validate_staging_dir(&config.staging_dir)?;
        if config.default_dir_name.is_empty() {
            return Err(Error::InvalidValue {
                field: "default_dir_name",
                value: String::new(),
            });
        }
        Ok(Self {
            template: config.template.parse()?,
            default_dir_name: config.default_dir_name.clone(),
            staging_dir: config.staging_dir.clone(),
            syntax: config.syntax,
            package_manager: config.package_manager,
            serve_script: config.serve_script.clone(),
            skip_install: config.skip_install,
            greeting,
        })
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            template: TemplateSource::default(),
            default_dir_name: DEFAULT_DIR_NAME.to_string(),
            staging_dir: DEFAULT_STAGING_DIR.to_string(),
            syntax: Syntax::default(),
            package_manager: PackageManager::default(),
            serve_script: DEFAULT_SERVE_SCRIPT.to_string(),
            skip_install: false,
            greeting: Greeting::new(env!("CARGO_PKG_VERSION")),
        }
    }
}

/// ステージングディレクトリ名は宛先直下の 1 要素に限る。
fn validate_staging_dir(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(Error::InvalidValue {
            field: "staging_dir",
            value: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = KickoffConfig::default();
        assert_eq!(config.template, "alienzhou/webpack-kickoff-template");
        assert_eq!(config.default_dir_name, "vue-app");
        assert_eq!(config.staging_dir, ".tmp");
        assert_eq!(config.syntax, Syntax::Ejs);
        assert_eq!(config.package_manager, PackageManager::Npm);
        assert_eq!(config.serve_script, "serve");
        assert!(!config.skip_install);
    }

    #[test]
    fn test_load_config_nonexistent_returns_default() {
        let config = load_config(Path::new("nonexistent-kickoff.yaml")).unwrap();
        assert_eq!(config, KickoffConfig::default());
    }

    #[test]
    fn test_load_config_from_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "template: github:me/my-template#dev\ndefault_dir_name: web\nsyntax: tera\npackage_manager: pnpm\nskip_install: true"
        )
        .unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.template, "github:me/my-template#dev");
        assert_eq!(config.default_dir_name, "web");
        assert_eq!(config.syntax, Syntax::Tera);
        assert_eq!(config.package_manager, PackageManager::Pnpm);
        assert!(config.skip_install);
        assert_eq!(config.staging_dir, ".tmp");
    }

    #[test]
    fn test_load_config_empty_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config, KickoffConfig::default());
    }

    #[test]
    fn test_load_config_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{invalid yaml").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_load_config_unknown_package_manager_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "package_manager: bun").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_resolve_config_path_prefers_explicit() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "").unwrap();
        let explicit = dir.path().join("other.yaml");
        let resolved = resolve_config_path(Some(&explicit), dir.path());
        assert_eq!(resolved, Some(explicit));
    }

    #[test]
    fn test_resolve_config_path_finds_local_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "").unwrap();
        let resolved = resolve_config_path(None, dir.path());
        assert_eq!(resolved, Some(dir.path().join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn test_pipeline_config_from_default() {
        let config =
            PipelineConfig::from_config(&KickoffConfig::default(), Greeting::new("1.2.3")).unwrap();
        assert_eq!(config.template, TemplateSource::default());
        assert_eq!(config.greeting.version, "1.2.3");
        assert_eq!(config, PipelineConfig {
            greeting: Greeting::new("1.2.3"),
            ..PipelineConfig::default()
        });
    }

    #[test]
    fn test_pipeline_config_rejects_nested_staging_dir() {
        for bad in ["", "a/b", "..", "/tmp"] {
            let config = KickoffConfig {
                staging_dir: bad.to_string(),
                ..KickoffConfig::default()
            };
            let result = PipelineConfig::from_config(&config, Greeting::new("0.1.0"));
            assert!(result.is_err(), "staging_dir {bad:?} should be rejected");
        }
    }

    #[test]
    fn test_pipeline_config_rejects_bad_template() {
        let config = KickoffConfig {
            template: "not-a-source".to_string(),
            ..KickoffConfig::default()
        };
        let err = PipelineConfig::from_config(&config, Greeting::new("0.1.0")).unwrap_err();
        assert!(matches!(err, Error::InvalidSource { .. }));
    }
}
