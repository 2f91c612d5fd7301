//! Build configuration read from `inkpress.toml`.
//!
//! ```toml
//! [content]
//! root = "content"
//! pattern = "posts/**/*.{md,mdx}"
//!
//! [output]
//! data = ".inkpress"
//! assets = "public/static"
//! base = "/static/"
//! name = "[name]-[hash:6].[ext]"
//! clean = true
//!
//! [build]
//! mode = "production"
//!
//! [markdown]
//! diagram_strategy = "inline-svg"
//! diagram_policy = "degrade"
//! ```
//!
//! Every field has a default; unknown keys are rejected. Relative paths are
//! resolved against the directory holding the config file.

use inkpress_render::ProcessorOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default config file name.
pub const CONFIG_FILE: &str = "inkpress.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
    /// The file is not valid TOML for this schema.
    #[error("config file parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    /// A value parsed but makes no sense.
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Production drops drafts; development keeps them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Published view.
    #[default]
    Production,
    /// Author view, drafts included.
    Development,
}

impl BuildMode {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            BuildMode::Production => "production",
            BuildMode::Development => "development",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" | "prod" => Ok(BuildMode::Production),
            "development" | "dev" => Ok(BuildMode::Development),
            other => Err(ConfigError::Validation(format!(
                "unknown build mode `{other}` (expected production or development)"
            ))),
        }
    }
}

/// `[content]`: where sources live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// Content root.
    pub root: PathBuf,
    /// Glob matched against paths relative to the root.
    pub pattern: String,
    /// Collection name, also the snapshot file stem.
    pub collection: String,
    /// Prefix of every permalink.
    pub permalink_prefix: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("content"),
            pattern: "posts/**/*.{md,mdx}".to_string(),
            collection: "posts".to_string(),
            permalink_prefix: "/blog/".to_string(),
        }
    }
}

/// `[output]`: where results go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Snapshot directory.
    pub data: PathBuf,
    /// Asset directory.
    pub assets: PathBuf,
    /// Public URL prefix of the asset directory.
    pub base: String,
    /// Asset file name template (`[name]`, `[hash]`, `[hash:N]`, `[ext]`).
    pub name: String,
    /// Replace previous outputs once a build succeeds.
    pub clean: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data: PathBuf::from(".inkpress"),
            assets: PathBuf::from("public/static"),
            base: "/static/".to_string(),
            name: "[name]-[hash:6].[ext]".to_string(),
            clean: true,
        }
    }
}

/// `[build]`: how to build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSection {
    /// Build mode.
    pub mode: BuildMode,
    /// Worker threads; `None` uses one per core.
    pub threads: Option<usize>,
}

/// Root of `inkpress.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Directory relative paths resolve against (internal use only).
    #[serde(skip)]
    pub base_dir: PathBuf,
    /// `[content]`.
    pub content: ContentConfig,
    /// `[output]`.
    pub output: OutputConfig,
    /// `[build]`.
    pub build: BuildSection,
    /// `[markdown]`: body pipeline settings.
    pub markdown: ProcessorOptions,
}

impl BuildConfig {
    /// Parses TOML text; relative paths resolve against the current directory.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`; relative paths in it resolve against its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_toml(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Reads `inkpress.toml` from `dir` if present, else defaults rooted at `dir`.
    pub fn load_or_default(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            return Self::load(&path);
        }
        log::debug!("no {CONFIG_FILE} in {}, using defaults", dir.display());
        Ok(Self {
            base_dir: dir.to_path_buf(),
            ..Self::default()
        })
    }

    /// Defaults rooted at `dir`.
    pub fn rooted_at(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: dir.into(),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.output.name.contains("[hash") {
            return Err(ConfigError::Validation(format!(
                "output.name `{}` must contain a [hash] placeholder",
                self.output.name
            )));
        }
        if self.build.threads == Some(0) {
            return Err(ConfigError::Validation("build.threads must be at least 1".into()));
        }
        if self.content.collection.is_empty() {
            return Err(ConfigError::Validation("content.collection must not be empty".into()));
        }
        Ok(())
    }

    /// Content root, resolved.
    pub fn content_root(&self) -> PathBuf {
        self.base_dir.join(&self.content.root)
    }

    /// Snapshot directory, resolved.
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join(&self.output.data)
    }

    /// Asset directory, resolved.
    pub fn assets_dir(&self) -> PathBuf {
        self.base_dir.join(&self.output.assets)
    }
}
