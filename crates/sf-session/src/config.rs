//! Engine configuration
//!
//! Loaded from TOML. Every key is optional; missing keys take the product
//! form defaults.
//!
//! ```toml
//! max_files = 6
//! multiple = true
//! accept = "image/*"
//! min_images = 1
//! asset_base_url = "https://cdn.example.com"
//!
//! [field_names]
//! create_images = "images"
//! edit_new_images = "newImages"
//! existing_images = "existingImages"
//! deleted_images = "deletedImages"
//! ```

use serde::{Deserialize, Serialize};
use sf_staging::{AcceptFilter, StagingLimits};
use std::path::{Path, PathBuf};

/// Multipart part names used for images
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldNames {
    /// Staged files of a create submission
    pub create_images: String,
    /// Staged files of an edit submission
    pub edit_new_images: String,
    /// Persisted images kept by an edit
    pub existing_images: String,
    /// Persisted images deleted by an edit
    pub deleted_images: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            create_images: "images".to_string(),
            edit_new_images: "newImages".to_string(),
            existing_images: "existingImages".to_string(),
            deleted_images: "deletedImages".to_string(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum staged files
    pub max_files: usize,
    /// Multi-select picker
    pub multiple: bool,
    /// Accepted file types
    pub accept: AcceptFilter,
    /// Minimum net image count at submit
    pub min_images: usize,
    /// Base URL for relative persisted image paths (display only)
    pub asset_base_url: Option<String>,
    /// Image part names
    pub field_names: FieldNames,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With max files
    #[inline]
    #[must_use]
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// With minimum image count
    #[inline]
    #[must_use]
    pub fn with_min_images(mut self, min_images: usize) -> Self {
        self.min_images = min_images;
        self
    }

    /// With asset base URL
    #[inline]
    #[must_use]
    pub fn with_asset_base_url(mut self, url: impl Into<String>) -> Self {
        self.asset_base_url = Some(url.into());
        self
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML or unknown keys
    /// - `ConfigError::Invalid` if [`Self::validate`] fails
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Check the limits and part names
    ///
    /// # Errors
    /// `ConfigError::Invalid` if `max_files` or `min_images` is zero,
    /// `min_images` exceeds `max_files`, or a part name is empty or shared
    /// within one mode
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_files == 0 {
            return Err(ConfigError::Invalid("max_files must be at least 1".into()));
        }
        if self.min_images == 0 {
            return Err(ConfigError::Invalid(
                "min_images must be at least 1: a product needs an image".into(),
            ));
        }
        if self.min_images > self.max_files {
            return Err(ConfigError::Invalid(format!(
                "min_images ({}) exceeds max_files ({})",
                self.min_images, self.max_files
            )));
        }

        let names = &self.field_names;
        let edit = [
            ("edit_new_images", &names.edit_new_images),
            ("existing_images", &names.existing_images),
            ("deleted_images", &names.deleted_images),
        ];
        let create = ("create_images", &names.create_images);
        for (key, value) in edit.iter().chain([&create]) {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("field_names.{key} is empty")));
            }
        }
        for (i, (key, value)) in edit.iter().enumerate() {
            if let Some((other, _)) = edit[i + 1..].iter().find(|(_, v)| v == value) {
                return Err(ConfigError::Invalid(format!(
                    "field_names.{key} and field_names.{other} are both \"{value}\""
                )));
            }
        }
        Ok(())
    }

    /// Limits of the image picker
    #[must_use]
    pub fn staging_limits(&self) -> StagingLimits {
        StagingLimits::default()
            .with_max_files(self.max_files)
            .with_multiple(self.multiple)
            .with_accept(self.accept.clone())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_files: 6,
            multiple: true,
            accept: AcceptFilter::default(),
            min_images: 1,
            asset_base_url: None,
            field_names: FieldNames::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Well-formed but unusable values
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.staging_limits(), StagingLimits::default());
    }

    #[test]
    fn full_document() {
        let config = EngineConfig::from_toml_str(
            r#"
            max_files = 4
            multiple = false
            accept = "image/png, .jpg"
            min_images = 2
            asset_base_url = "https://cdn.example.com"

            [field_names]
            edit_new_images = "added"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_files, 4);
        assert!(!config.multiple);
        assert_eq!(config.accept.as_str(), "image/png, .jpg");
        assert_eq!(config.field_names.edit_new_images, "added");
        assert_eq!(config.field_names.deleted_images, "deletedImages");
        assert_eq!(config.asset_base_url.as_deref(), Some("https://cdn.example.com"));
    }

    #[test]
    fn unknown_key_is_a_parse_error() {
        let err = EngineConfig::from_toml_str("max_file = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("max_files = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("max_files = 2\nmin_images = 3"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("min_images = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(EngineConfig::default().with_min_images(0).validate().is_err());

        let err = EngineConfig::from_toml_str(
            "[field_names]\nexisting_images = \"keep\"\ndeleted_images = \"keep\"",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config: field_names.existing_images and field_names.deleted_images are both \"keep\""
        );

        assert!(EngineConfig::from_toml_str("[field_names]\ncreate_images = \" \"").is_err());
    }

    #[test]
    fn loads_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_files = 3").unwrap();
        let config = EngineConfig::from_path(file.path()).unwrap();
        assert_eq!(config.max_files, 3);

        let demo =
            EngineConfig::from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/engine.toml"))
                .unwrap();
        assert_eq!(demo.asset_base_url.as_deref(), Some("https://cdn.example.com"));

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            EngineConfig::from_path(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
