//! Data source tags and input locations.
//!
//! Input files follow a naming convention, `dir-name/source-name/year/file`,
//! from which the data source of every record is derived. Inputs may also
//! name an object in a remote bucket (`s3://bucket/key`); those are read
//! from a local copy supplied by the caller.

use std::path::PathBuf;

use log::info;

use crate::config::ConfigError;

/// Tag used when the data source cannot be determined from the name.
pub const UNKNOWN_SOURCE: &str = "unknown";

const REMOTE_PREFIX: &str = "s3://";

/// Derive the data source tag from an input name.
///
/// The name (without any `s3://` prefix) must split into exactly four
/// `/`-separated parts; the second one names the source.
///
/// Remote names are matched after the prefix is removed, so
/// `s3://bucket/sirsi/2024/full.mrc` is tagged `sirsi`. Splitting the full
/// name, prefix included, would put every remote name in `unknown`.
///
/// # Examples
///
/// ```
/// use marcid::data_source;
///
/// assert_eq!(data_source("marc/sirsi/2024/full.mrc"), "sirsi");
/// assert_eq!(data_source("s3://marc/hathi/2023/part1.mrc"), "hathi");
/// assert_eq!(data_source("full.mrc"), "unknown");
/// ```
#[must_use]
pub fn data_source(name: &str) -> String {
    let name = name.strip_prefix(REMOTE_PREFIX).unwrap_or(name);
    let tokens: Vec<&str> = name.split('/').collect();
    let source = if tokens.len() == 4 {
        tokens[1]
    } else {
        UNKNOWN_SOURCE
    };
    info!("data source identified is: {source}");
    source.to_string()
}

/// Where an input file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLocation {
    /// A file on the local filesystem.
    Local(PathBuf),
    /// An object in a remote bucket, named as given (`s3://bucket/key`).
    Remote(String),
}

impl InputLocation {
    /// Classify an input name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BadName`] for a remote name without both a bucket
    /// and a key.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcid::InputLocation;
    ///
    /// let location = InputLocation::parse("s3://bucket/dir/file.mrc")?;
    /// assert_eq!(location, InputLocation::Remote("s3://bucket/dir/file.mrc".into()));
    /// # Ok::<(), marcid::ConfigError>(())
    /// ```
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        let Some(rest) = name.strip_prefix(REMOTE_PREFIX) else {
            return Ok(InputLocation::Local(PathBuf::from(name)));
        };

        match rest.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                Ok(InputLocation::Remote(name.to_string()))
            },
            _ => Err(ConfigError::BadName(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_source_from_convention() {
        assert_eq!(data_source("marc/sirsi/2024/full.mrc"), "sirsi");
        assert_eq!(data_source("s3://virgo/hathi/2023/x.mrc"), "hathi");
    }

    #[test]
    fn test_data_source_ignores_remote_prefix() {
        assert_eq!(data_source("s3://bucket/sirsi/2024/full.mrc"), "sirsi");
        assert_eq!(data_source("s3://bucket/marc/sirsi/2024/full.mrc"), UNKNOWN_SOURCE);
    }

    #[test]
    fn test_data_source_unknown() {
        assert_eq!(data_source("full.mrc"), UNKNOWN_SOURCE);
        assert_eq!(data_source("/marc/sirsi/2024/full.mrc"), UNKNOWN_SOURCE);
        assert_eq!(data_source("a/b/c/d/e"), UNKNOWN_SOURCE);
    }

    #[test]
    fn test_local_location() {
        assert_eq!(
            InputLocation::parse("/tmp/full.mrc").unwrap(),
            InputLocation::Local(PathBuf::from("/tmp/full.mrc"))
        );
    }

    #[test]
    fn test_remote_location_keeps_nested_key() {
        let location = InputLocation::parse("s3://bucket/a/b/c.mrc").unwrap();
        assert_eq!(location, InputLocation::Remote("s3://bucket/a/b/c.mrc".to_string()));
    }

    #[test]
    fn test_remote_location_needs_key() {
        assert!(matches!(
            InputLocation::parse("s3://bucket"),
            Err(ConfigError::BadName(_))
        ));
        assert!(matches!(
            InputLocation::parse("s3://bucket/"),
            Err(ConfigError::BadName(_))
        ));
    }
}
