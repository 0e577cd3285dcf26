//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/exprtree/exprtree.toml`
//! 3. Local config: `<dir>/.exprtree.toml`
//! 4. Environment variables: `EXPRTREE_*` prefix, `__` between sections,
//!    e.g. `EXPRTREE_DUMP__STYLE=tree`

use std::io::Write;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{write_arena_dump, write_dump, DumpOptions, ExprArena, Node};
use crate::error::{ExprError, ExprResult};

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "EXPRTREE";

/// Largest precision that still changes the rendering of an `f64`.
pub const MAX_PRECISION: usize = 17;

/// Effective settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Debug dump rendering
    pub dump: DumpOptions,
}

/// Get the XDG config directory for exprtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "exprtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("exprtree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".exprtree.toml")
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.exprtree.toml`
    ///
    /// Later layers override single keys of earlier ones; missing files are skipped.
    pub fn load(local_dir: Option<&Path>) -> ExprResult<Self> {
        Self::load_from(global_config_path().as_deref(), local_dir, ENV_PREFIX)
    }

    /// Load settings from explicit layers.
    ///
    /// # Arguments
    /// * `global_path` - Global config file, skipped if absent or missing
    /// * `local_dir` - Optional directory holding a `.exprtree.toml`
    /// * `env_prefix` - Prefix of the environment variables that override both files
    #[instrument(level = "debug")]
    pub fn load_from(
        global_path: Option<&Path>,
        local_dir: Option<&Path>,
        env_prefix: &str,
    ) -> ExprResult<Self> {
        let mut builder = Config::builder();

        if let Some(global_path) = global_path {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global config");
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!(path = %local_path.display(), "loading local config");
                builder = builder.add_source(File::from(local_path).required(true));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let settings: Self = config.try_deserialize().map_err(config_err)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from TOML text, without any other layer.
    pub fn from_toml(content: &str) -> ExprResult<Self> {
        let settings: Self = toml::from_str(content).map_err(|e| ExprError::Config {
            message: format!("parse: {e}"),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> ExprResult<()> {
        if !(1..=MAX_PRECISION).contains(&self.dump.precision) {
            return Err(ExprError::Config {
                message: format!(
                    "dump.precision must be between 1 and {MAX_PRECISION}, got {}",
                    self.dump.precision
                ),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> ExprResult<String> {
        toml::to_string_pretty(self).map_err(|e| ExprError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Write a debug dump of `root` using these settings.
    pub fn write_dump<W: Write>(&self, root: Option<&Node>, out: &mut W) -> ExprResult<()> {
        write_dump(root, &self.dump, out).map_err(|e| ExprError::io("writing debug dump", e))
    }

    /// Write a debug dump of the arena tree under `root` using these settings.
    pub fn write_arena_dump<W: Write>(
        &self,
        arena: &ExprArena,
        root: Option<Index>,
        out: &mut W,
    ) -> ExprResult<()> {
        write_arena_dump(arena, root, &self.dump, out)
            .map_err(|e| ExprError::io("writing arena dump", e))
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# exprtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/exprtree/exprtree.toml
#   Local:  <dir>/.exprtree.toml
#   Env:    EXPRTREE_* environment variables, e.g. EXPRTREE_DUMP__STYLE=tree

[dump]
# "flat": one block per node (text, cached value, parent count)
# "tree": box-drawing tree
# style = "flat"

# Significant digits for values, 1..=17
# precision = 6
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ExprError {
    ExprError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DumpStyle;

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let settings =
            Settings::load_from(None, None, "EXPRTREE_UNIT_UNSET").expect("load defaults");
        assert_eq!(settings.dump.style, DumpStyle::Flat);
        assert_eq!(settings.dump.precision, 6);
    }

    #[test]
    fn given_template_when_parsed_then_yields_defaults() {
        let settings = Settings::from_toml(&Settings::template()).expect("parse template");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn given_zero_precision_when_validating_then_config_error() {
        let err = Settings::from_toml("[dump]\nprecision = 0\n").unwrap_err();
        assert!(matches!(err, ExprError::Config { .. }));
        assert!(err.to_string().contains("dump.precision"));
    }

    #[test]
    fn given_settings_when_serialized_then_round_trips() {
        let settings = Settings {
            dump: DumpOptions {
                style: DumpStyle::Tree,
                precision: 3,
            },
        };
        let toml = settings.to_toml().unwrap();
        assert!(toml.contains("style = \"tree\""));
        assert_eq!(Settings::from_toml(&toml).unwrap(), settings);
    }
}
