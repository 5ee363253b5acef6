//! Configuration for an identifier listing run.
//!
//! This module provides [`ListConfig`], built once by the command line front
//! end and passed explicitly to everything that needs it.

use std::path::PathBuf;

use thiserror::Error;

use crate::recovery::RecoveryMode;
use crate::source::InputLocation;

/// Errors in the run configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No input file was named.
    #[error("input file name cannot be blank")]
    BlankInput,

    /// A remote name without a bucket and key.
    #[error("bad file name: {0}")]
    BadName(String),

    /// A remote input with no local copy to read.
    #[error("remote input {0} has not been downloaded; supply the local copy")]
    RemoteNotMaterialized(String),
}

/// Settings for one listing run.
///
/// # Examples
///
/// ```
/// use marcid::ListConfig;
/// use std::path::PathBuf;
///
/// let config = ListConfig::new("s3://bucket/sirsi/2024/full.mrc")
///     .with_local(PathBuf::from("/tmp/full.mrc"));
///
/// assert_eq!(config.local_path()?, PathBuf::from("/tmp/full.mrc"));
/// assert_eq!(marcid::data_source(&config.infile), "sirsi");
/// # Ok::<(), marcid::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListConfig {
    /// Input name as given; also the basis of the data source tag.
    pub infile: String,
    /// Local copy of a remote input.
    pub local: Option<PathBuf>,
    /// Run a validation pass before listing.
    pub validate_first: bool,
    /// Fold continuation records while listing.
    pub read_ahead: bool,
    /// How frames with a bad length header are handled.
    pub recovery_mode: RecoveryMode,
}

impl ListConfig {
    /// Configuration for listing `infile` with default settings.
    #[must_use]
    pub fn new(infile: impl Into<String>) -> Self {
        ListConfig {
            infile: infile.into(),
            local: None,
            validate_first: false,
            read_ahead: true,
            recovery_mode: RecoveryMode::default(),
        }
    }

    /// Read from `path` instead of the input name.
    #[must_use]
    pub fn with_local(mut self, path: PathBuf) -> Self {
        self.local = Some(path);
        self
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BlankInput`] when no input is named, or
    /// [`ConfigError::BadName`] for a malformed remote name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.infile.trim().is_empty() {
            return Err(ConfigError::BlankInput);
        }
        InputLocation::parse(&self.infile).map(|_| ())
    }

    /// The local file the loader should open.
    ///
    /// An explicit local copy wins; otherwise the input name must itself be a
    /// local path.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is invalid or a remote
    /// input has no local copy.
    pub fn local_path(&self) -> Result<PathBuf, ConfigError> {
        self.validate()?;
        if let Some(path) = &self.local {
            return Ok(path.clone());
        }
        match InputLocation::parse(&self.infile)? {
            InputLocation::Local(path) => Ok(path),
            InputLocation::Remote(name) => Err(ConfigError::RemoteNotMaterialized(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ListConfig::new("full.mrc");
        assert!(config.read_ahead);
        assert!(!config.validate_first);
        assert_eq!(config.recovery_mode, RecoveryMode::Lenient);
        assert!(config.local.is_none());
    }

    #[test]
    fn test_blank_input() {
        let config = ListConfig::new("  ");
        assert!(matches!(config.validate(), Err(ConfigError::BlankInput)));
        assert!(matches!(config.local_path(), Err(ConfigError::BlankInput)));
    }

    #[test]
    fn test_local_input_path() {
        let config = ListConfig::new("marc/sirsi/2024/full.mrc");
        assert_eq!(
            config.local_path().unwrap(),
            PathBuf::from("marc/sirsi/2024/full.mrc")
        );
    }

    #[test]
    fn test_remote_without_local_copy() {
        let config = ListConfig::new("s3://bucket/sirsi/2024/full.mrc");
        assert!(matches!(
            config.local_path(),
            Err(ConfigError::RemoteNotMaterialized(name)) if name == config.infile
        ));
    }

    #[test]
    fn test_remote_with_bad_name() {
        let config = ListConfig::new("s3://bucket").with_local(PathBuf::from("/tmp/x"));
        assert!(matches!(config.local_path(), Err(ConfigError::BadName(_))));
    }
}
