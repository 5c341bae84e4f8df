#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Click-to-translation client.
//!
//! A click on the source map travels through three stages:
//!
//! 1. [`controller::ClickController`] receives the click, tags it with a
//!    [`controller::ClickToken`] and spawns the request.
//! 2. [`dispatcher::QueryDispatcher`] posts the point to the translation
//!    endpoint derived from the page origin.
//! 3. [`renderer::ResponseRenderer`] parses the answer and draws the
//!    closest source point, the target point and the source border on the
//!    two map views.
//!
//! Failures of any stage end up in the controller's [`controller::ErrorSlot`]
//! and are logged; they never stop the session.

pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod renderer;

use std::sync::Arc;

use thiserror::Error;
use tkv_map_view::{HeadlessMapView, MapViewError};
use tkv_translate_models::ResponseError;

use crate::config::ClientConfig;
use crate::controller::ClickController;
use crate::dispatcher::{OriginError, QueryDispatcher};
use crate::renderer::ResponseRenderer;

/// Errors from sending a translation request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Translation service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Start of the response body.
        body: String,
    },

    /// The request body could not be serialized.
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    /// The request task panicked or was cancelled.
    #[error("Request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors from rendering a translation response.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The response body is malformed. Nothing was drawn.
    #[error(transparent)]
    Parse(#[from] ResponseError),

    /// A map view rejected a drawing operation.
    #[error(transparent)]
    View(#[from] MapViewError),
}

/// Any failure of a single click cycle.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The response could not be rendered.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Errors from loading the client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`ClientConfig`].
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be written as TOML.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The page origin is unusable.
    #[error(transparent)]
    Origin(#[from] OriginError),
}

/// Builds a controller over two headless views from a configuration,
/// talking to the translation service over HTTP.
///
/// # Errors
///
/// Returns [`ConfigError::Origin`] if the configured page origin has no
/// host or port.
pub fn headless_controller(
    config: &ClientConfig,
) -> Result<ClickController<HeadlessMapView, HeadlessMapView>, ConfigError> {
    let origin = config.origin()?;
    let dispatcher = QueryDispatcher::http(&origin)?;
    log::info!("Translation endpoint: {}", dispatcher.endpoint());

    Ok(ClickController::new(
        Arc::new(dispatcher),
        ResponseRenderer::new(config.border_icon.clone()),
        config.policy,
        HeadlessMapView::from_config(&config.effective_source()),
        HeadlessMapView::from_config(&config.effective_target()),
    ))
}
