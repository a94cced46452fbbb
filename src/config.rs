//! Filesystem configuration.

use crate::scope::{self, ScopeMode};
use crate::{FsError, Permissions};

/// Settings for one projected filesystem.
///
/// # Example
///
/// ```rust
/// use keyspace_fs::{ProjectionConfig, ScopeMode};
///
/// let config = ProjectionConfig::new("/v1/secret")
///     .with_scope(ScopeMode::Rooted)
///     .with_list_page_size(Some(100));
/// assert!(config.validate().is_ok());
/// assert_eq!(config.root(), "/v1/secret/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProjectionConfig {
    root: String,
    scope: ScopeMode,
    probe_page_size: usize,
    list_page_size: Option<usize>,
    file_mode: Permissions,
    dir_mode: Permissions,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            root: String::new(),
            scope: ScopeMode::Opaque,
            probe_page_size: 1,
            list_page_size: None,
            file_mode: Permissions::default_file(),
            dir_mode: Permissions::default_dir(),
        }
    }
}

impl ProjectionConfig {
    /// Configuration rooted at `root`. The scope is inferred from whether
    /// `root` begins with `/`.
    pub fn new(root: impl Into<String>) -> Self {
        let root = scope::normalize_prefix(&root.into());
        let scope = if root.starts_with('/') {
            ScopeMode::Rooted
        } else {
            ScopeMode::Opaque
        };
        Self {
            root,
            scope,
            ..Default::default()
        }
    }

    /// Override the scope mode.
    pub fn with_scope(mut self, scope: ScopeMode) -> Self {
        self.scope = scope;
        self
    }

    /// Page size used by the directory existence probe.
    pub fn with_probe_page_size(mut self, size: usize) -> Self {
        self.probe_page_size = size;
        self
    }

    /// Page size requested for full listings. `None` leaves it to the backend.
    pub fn with_list_page_size(mut self, size: Option<usize>) -> Self {
        self.list_page_size = size;
        self
    }

    /// Mode reported for files.
    pub fn with_file_mode(mut self, mode: Permissions) -> Self {
        self.file_mode = mode;
        self
    }

    /// Mode reported for directories.
    pub fn with_dir_mode(mut self, mode: Permissions) -> Self {
        self.dir_mode = mode;
        self
    }

    /// The normalized root prefix.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The scope mode.
    pub fn scope(&self) -> ScopeMode {
        self.scope
    }

    /// Probe page size.
    pub fn probe_page_size(&self) -> usize {
        self.probe_page_size
    }

    /// Full-listing page size.
    pub fn list_page_size(&self) -> Option<usize> {
        self.list_page_size
    }

    /// File mode.
    pub fn file_mode(&self) -> Permissions {
        self.file_mode
    }

    /// Directory mode.
    pub fn dir_mode(&self) -> Permissions {
        self.dir_mode
    }

    /// Check the settings are consistent.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if the root lies outside the scope
    ///   partition, or a page size is zero
    pub fn validate(&self) -> Result<(), FsError> {
        let rooted_ok = match self.scope {
            ScopeMode::Rooted => self.root.starts_with('/'),
            // the empty root is the whole opaque partition
            ScopeMode::Opaque => !self.root.starts_with('/'),
        };
        if !rooted_ok {
            return Err(FsError::invalid(
                self.root.clone(),
                format!("root is outside the {:?} scope", self.scope),
            ));
        }
        if self.probe_page_size == 0 {
            return Err(FsError::invalid(
                self.root.clone(),
                "probe page size must be at least 1",
            ));
        }
        if self.list_page_size == Some(0) {
            return Err(FsError::invalid(
                self.root.clone(),
                "list page size must be at least 1",
            ));
        }
        Ok(())
    }

    /// Parse a JSON configuration and validate it.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if the JSON is malformed or invalid
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, FsError> {
        let mut config: Self = serde_json::from_str(json)
            .map_err(|e| FsError::invalid("<config>", e.to_string()))?;
        config.root = scope::normalize_prefix(&config.root);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ProjectionConfig::default();
        assert_eq!(c.root(), "");
        assert_eq!(c.scope(), ScopeMode::Opaque);
        assert_eq!(c.probe_page_size(), 1);
        assert_eq!(c.list_page_size(), None);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn scope_is_inferred_from_root() {
        assert_eq!(ProjectionConfig::new("/").scope(), ScopeMode::Rooted);
        assert_eq!(ProjectionConfig::new("kv").scope(), ScopeMode::Opaque);
        assert_eq!(ProjectionConfig::new("kv").root(), "kv/");
    }

    #[test]
    fn mismatched_scope_is_invalid() {
        let c = ProjectionConfig::new("/secret").with_scope(ScopeMode::Opaque);
        assert!(matches!(c.validate(), Err(FsError::InvalidArgument { .. })));

        let c = ProjectionConfig::new("secret").with_scope(ScopeMode::Rooted);
        assert!(matches!(c.validate(), Err(FsError::InvalidArgument { .. })));
    }

    #[test]
    fn zero_page_sizes_are_invalid() {
        assert!(ProjectionConfig::new("kv").with_probe_page_size(0).validate().is_err());
        assert!(ProjectionConfig::new("kv")
            .with_list_page_size(Some(0))
            .validate()
            .is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn from_json_normalizes_and_validates() {
        let c = ProjectionConfig::from_json(r#"{"root":"/v1/secret","scope":"rooted"}"#).unwrap();
        assert_eq!(c.root(), "/v1/secret/");
        assert_eq!(c.probe_page_size(), 1);

        let err = ProjectionConfig::from_json(r#"{"root":"/v1/secret","scope":"opaque"}"#);
        assert!(err.is_err());
    }
}
