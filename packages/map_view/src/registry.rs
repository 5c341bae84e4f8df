//! Compile-time registry of the default map view configurations.
//!
//! The source and target views and the border marker icon are defined in
//! TOML files under `views/`. They are embedded at compile time and exposed
//! via [`all_views`], [`default_view`] and [`border_icon`].

use crate::{IconSpec, MapViewConfig};

/// Mount point of the map the user clicks on.
pub const SOURCE_MOUNT: &str = "source";

/// Mount point of the map showing the translated point.
pub const TARGET_MOUNT: &str = "target";

// ── Compile-time embedded TOML files ────────────────────────────────

const VIEW_TOMLS: &[(&str, &str)] = &[
    (SOURCE_MOUNT, include_str!("../views/source.toml")),
    (TARGET_MOUNT, include_str!("../views/target.toml")),
];

const BORDER_ICON_TOML: &str = include_str!("../views/border_icon.toml");

/// Returns every embedded view configuration.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_views() -> Vec<MapViewConfig> {
    VIEW_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            MapViewConfig::from_toml_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse map view '{name}': {e}"))
        })
        .collect()
}

/// Returns the embedded configuration for a mount point.
#[must_use]
pub fn default_view(mount: &str) -> Option<MapViewConfig> {
    all_views().into_iter().find(|v| v.mount == mount)
}

/// The embedded source view configuration.
///
/// # Panics
///
/// Panics if the embedded source view is missing, which the tests rule out.
#[must_use]
pub fn source_view() -> MapViewConfig {
    default_view(SOURCE_MOUNT).expect("embedded source view")
}

/// The embedded target view configuration.
///
/// # Panics
///
/// Panics if the embedded target view is missing, which the tests rule out.
#[must_use]
pub fn target_view() -> MapViewConfig {
    default_view(TARGET_MOUNT).expect("embedded target view")
}

/// The icon drawn for each source border point.
///
/// # Panics
///
/// Panics if the embedded icon TOML is malformed.
#[must_use]
pub fn border_icon() -> IconSpec {
    toml::from_str(BORDER_ICON_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse border icon: {e}"))
}
