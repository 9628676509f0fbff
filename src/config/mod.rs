//! Configuration management for `diffbook.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section    # [serve] and [build]
//! ├── error      # ConfigError
//! ├── util       # find_config_file
//! └── mod.rs     # DiffbookConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section      | Purpose                                          |
//! |--------------|--------------------------------------------------|
//! | `[tutorial]` | File names inside a tutorial directory           |
//! | `[serve]`    | Live-update server address (`watch`)             |
//! | `[build]`    | Archive path (`build`)                           |
//!
//! Every section is optional; a missing file means all defaults.

mod error;
mod section;
mod util;

pub use error::ConfigError;
use section::{BuildConfig, ServeConfig};
use util::find_config_file;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::{Cli, Commands};
use crate::history::TutorialLayout;
use crate::log;

/// Config file searched for when `--config` is not given
pub const DEFAULT_CONFIG_NAME: &str = "diffbook.toml";

/// Root configuration structure representing diffbook.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiffbookConfig {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub tutorial: TutorialLayout,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub build: BuildConfig,
}

impl DiffbookConfig {
    /// Load configuration for the parsed command line.
    ///
    /// An explicit `--config` must exist; the default name is searched upward
    /// from the current directory and may be absent.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let config_path = match &cli.config {
            Some(path) => {
                let path = cwd.join(path);
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Some(path)
            }
            None => find_config_file(&cwd, Path::new(DEFAULT_CONFIG_NAME)),
        };

        let mut config = match &config_path {
            Some(path) => {
                crate::debug!("config"; "using {}", path.display());
                Self::from_path(path)?
            }
            None => Self::default(),
        };
        config.config_path = config_path;
        config.finalize(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Directory relative paths in the config are resolved against.
    pub fn root(&self) -> PathBuf {
        self.config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    fn finalize(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        // Config paths are relative to the config file; CLI paths to cwd
        if self.build.output.is_relative() {
            self.build.output = self.root().join(&self.build.output);
        }
        self.apply_command_options(cli);
    }

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Build { args } => {
                Self::update_option(&mut self.build.output, args.output.as_ref());
            }
            Commands::Watch { args } => {
                Self::update_option(&mut self.serve.interface, args.interface.as_ref());
                Self::update_option(&mut self.serve.port, args.port.as_ref());
            }
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.tutorial;
        for (field, name) in [
            ("tutorial.narrative", &layout.narrative),
            ("tutorial.code", &layout.code),
            ("tutorial.summary", &layout.summary),
        ] {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(ConfigError::Validation(format!(
                    "`{field}` must be a plain file name, got `{name}`"
                )));
            }
        }

        if layout.narrative == layout.code
            || layout.narrative == layout.summary
            || layout.code == layout.summary
        {
            return Err(ConfigError::Validation(
                "`tutorial.narrative`, `tutorial.code` and `tutorial.summary` must differ".into(),
            ));
        }

        if self.build.output.as_os_str().is_empty() {
            return Err(ConfigError::Validation("`build.output` is empty".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> DiffbookConfig {
    let (parsed, ignored) = DiffbookConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
