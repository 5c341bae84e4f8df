//! Client configuration.
//!
//! Every field falls back to the embedded defaults from
//! [`tkv_map_view::registry`], so a configuration file only needs the keys
//! it changes:
//!
//! ```toml
//! page_origin = "http://localhost:8080/"
//! policy = "latest_only"
//! access_token = "pk.xxx"
//!
//! [source]
//! mount = "source"
//! center = { lat = 47.0, lng = 0.0 }
//! zoom = 6
//! # ...
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tkv_map_view::{IconSpec, MapViewConfig, registry};

use crate::ConfigError;
use crate::controller::ResponsePolicy;
use crate::dispatcher::Origin;

/// Page URL assumed when none is configured.
pub const DEFAULT_PAGE_ORIGIN: &str = "http://localhost:8080/";

/// Configuration of a translation client session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// URL of the page hosting the maps; only its scheme, host and port are
    /// used.
    pub page_origin: String,
    /// How responses to overlapping clicks are handled.
    pub policy: ResponsePolicy,
    /// Tile provider access token, applied to both views' tile layers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Source view bootstrap.
    pub source: MapViewConfig,
    /// Target view bootstrap.
    pub target: MapViewConfig,
    /// Icon used for source border markers.
    pub border_icon: IconSpec,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            page_origin: DEFAULT_PAGE_ORIGIN.to_string(),
            policy: ResponsePolicy::default(),
            access_token: None,
            source: registry::source_view(),
            target: registry::target_view(),
            border_icon: registry::border_icon(),
        }
    }
}

impl ClientConfig {
    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is malformed or a key has
    /// the wrong type.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading client configuration from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Serializes the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Origin of the translation service.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Origin`] if `page_origin` is unusable.
    pub fn origin(&self) -> Result<Origin, ConfigError> {
        Ok(Origin::parse(&self.page_origin)?)
    }

    /// Source view bootstrap with the access token applied.
    #[must_use]
    pub fn effective_source(&self) -> MapViewConfig {
        self.with_token(&self.source)
    }

    /// Target view bootstrap with the access token applied.
    #[must_use]
    pub fn effective_target(&self) -> MapViewConfig {
        self.with_token(&self.target)
    }

    fn with_token(&self, view: &MapViewConfig) -> MapViewConfig {
        let mut view = view.clone();
        if let Some(token) = &self.access_token {
            view.tile_layer.access_token = Some(token.clone());
        }
        view
    }
}
