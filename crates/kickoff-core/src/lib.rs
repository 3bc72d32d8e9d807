// kickoff-core: テンプレート取得・展開・依存インストールを担うビジネスロジック

pub mod config;
pub mod error;
pub mod fetch;
pub mod install;
pub mod materialize;
pub mod pipeline;
pub mod progress;
pub mod template;
pub mod validation;

pub use config::{load_config, resolve_config_path, Greeting, KickoffConfig, PipelineConfig};
pub use error::{Error, Result};
pub use fetch::{SourceFetcher, TemplateFetcher, TemplateSource};
pub use install::{CommandInstaller, DependencyInstaller, PackageManager};
pub use materialize::ProjectMaterializer;
pub use pipeline::{NamePrompt, Reporter, ScaffoldReport, ScaffoldUseCase, SessionConfig, Stage};
pub use progress::ProgressEvent;
pub use template::{Syntax, TemplateRenderer};
pub use validation::validate_dir_name;
