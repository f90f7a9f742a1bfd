//! # snag-config
//!
//! Settings for snag's trace capture, merged from figment providers. Later
//! layers override earlier ones:
//!
//! - serde defaults
//! - `<config_dir>/snag/config.toml` (e.g. `~/.config/snag/config.toml`)
//! - `.snag/config.toml` in the working directory
//! - `SNAG_*` environment variables, `__` separating sections, so
//!   `SNAG_TRACE__BACKTRACE=never` sets `trace.backtrace`
//!
//! ```no_run
//! use snag_config::{BacktraceMode, SnagConfig};
//!
//! let config = SnagConfig::load().expect("config");
//! if config.trace.backtrace == BacktraceMode::Never {
//!     println!("traces carry the raise location only");
//! }
//! ```

mod error;
mod trace;

pub use error::ConfigError;
pub use trace::{BacktraceMode, TraceConfig};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SnagConfig {
    #[serde(default)]
    pub trace: TraceConfig,
}

/// Project-local config file, relative to the working directory.
const LOCAL_CONFIG: &str = ".snag/config.toml";

impl SnagConfig {
    /// Load from defaults, every config file present and `SNAG_*` variables.
    ///
    /// See the crate docs for precedence.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load one explicit TOML file in place of the discovered ones.
    /// `SNAG_*` variables still win over it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }

        Self::layered([path.to_path_buf()])
            .extract()
            .map_err(ConfigError::from)
    }

    /// The full provider chain used by [`load`](Self::load).
    pub fn figment() -> Figment {
        Self::layered(Self::config_files())
    }

    /// Defaults, then `files` in order, then the environment.
    fn layered(files: impl IntoIterator<Item = PathBuf>) -> Figment {
        files
            .into_iter()
            .fold(Figment::from(Serialized::defaults(Self::default())), |figment, path| {
                figment.merge(Toml::file(path))
            })
            .merge(Env::prefixed("SNAG_").split("__"))
    }

    /// Existing config files, user-global first so project-local wins.
    fn config_files() -> impl Iterator<Item = PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("snag").join("config.toml"))
            .into_iter()
            .chain(std::iter::once(PathBuf::from(LOCAL_CONFIG)))
            .filter(|path| path.exists())
    }
}
