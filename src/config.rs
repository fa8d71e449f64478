//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/warish/warish.toml`
//! 3. Environment variables: `WARISH_*` prefix
//! 4. Command line flags (applied by the CLI layer)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{ReferencePolicy, RenderOptions};

/// Rendering configuration for trees and outlines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderConfig {
    /// Append `#id` to every member label
    pub show_ids: bool,
    /// Mark deceased members
    pub show_status: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            show_ids: false,
            show_status: true,
        }
    }
}

/// Raw render config for intermediate parsing (None = not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawRenderConfig {
    pub show_ids: Option<bool>,
    pub show_status: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub reference_policy: Option<ReferencePolicy>,
    #[serde(default)]
    pub render: RawRenderConfig,
}

/// Unified configuration for warish.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the record store (default: ~/.warish)
    pub data_dir: PathBuf,
    /// Treatment of dangling, duplicate and cyclic parent references
    pub reference_policy: ReferencePolicy,
    /// Rendering settings
    pub render: RenderConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: dirs_default_data_dir(),
            reference_policy: ReferencePolicy::default(),
            render: RenderConfig::default(),
        }
    }
}

/// Get the default data directory (~/.warish).
fn dirs_default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".warish"))
        .unwrap_or_else(|| PathBuf::from("~/.warish"))
}

/// Get the XDG config directory for warish.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "warish").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("warish.toml"))
}

/// Expand `~`, `$VAR` and `${VAR}`; leaves the input unchanged on failure.
pub fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Label options derived from the render config.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            show_ids: self.render.show_ids,
            show_status: self.render.show_status,
        }
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_path(self.data_dir.to_string_lossy().as_ref());
        self.data_dir = PathBuf::from(expanded);
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_dir: overlay
                .data_dir
                .clone()
                .unwrap_or_else(|| self.data_dir.clone()),
            reference_policy: overlay.reference_policy.unwrap_or(self.reference_policy),
            render: RenderConfig {
                show_ids: overlay.render.show_ids.unwrap_or(self.render.show_ids),
                show_status: overlay.render.show_status.unwrap_or(self.render.show_status),
            },
        }
    }

    /// Load settings with layered precedence from the XDG global config.
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings with an explicit global config file.
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. `global_path`, when it exists
    /// 3. Environment variables: `WARISH_*` prefix, `__` as section separator
    ///    (e.g. `WARISH_RENDER__SHOW_IDS=true`)
    pub fn load_from(global_path: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(path) = global_path {
            if path.exists() {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
        }

        let mut settings = Self::apply_env_overrides(current)?;
        settings.expand_paths();
        Ok(settings)
    }

    /// Apply WARISH_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let builder = Config::builder().add_source(
            Environment::with_prefix("WARISH")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("data_dir") {
            settings.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("reference_policy") {
            settings.reference_policy = val
                .parse::<ReferencePolicy>()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Ok(val) = config.get_bool("render.show_ids") {
            settings.render.show_ids = val;
        }
        if let Ok(val) = config.get_bool("render.show_status") {
            settings.render.show_status = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# warish configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/warish/warish.toml
#   Env:    WARISH_* environment variables (e.g. WARISH_REFERENCE_POLICY=lenient)
#   Flags:  --data-dir, --policy

# Directory of the record store (applications/<id>.json)
# data_dir = "~/.warish"

# Handling of dangling, duplicate and cyclic parent references:
#   "strict"  - reject the member set with every issue listed
#   "lenient" - build a partial forest silently (compatibility)
# reference_policy = "strict"

[render]
# Append member ids to labels
# show_ids = false

# Mark deceased members
# show_status = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
