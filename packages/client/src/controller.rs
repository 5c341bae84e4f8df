//! Click controller.
//!
//! Owns both map views and is the only place that draws on them. Every
//! click gets a [`ClickToken`] and its request runs on its own `tokio` task;
//! completions come back over a channel and are rendered one at a time on
//! the controller's task. Which completions get drawn is decided by the
//! [`ResponsePolicy`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use tokio::sync::mpsc;
use tkv_map_view::MapView;
use tkv_translate_models::ClickPoint;

use crate::dispatcher::QueryDispatcher;
use crate::renderer::{RenderSummary, ResponseRenderer};
use crate::{ClientError, DispatchError};

/// Identifies a click. Tokens increase with every click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClickToken(pub u64);

impl std::fmt::Display for ClickToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "click#{}", self.0)
    }
}

/// How responses to overlapping clicks are handled.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResponsePolicy {
    /// Only the response to the most recent click is drawn; older ones are
    /// discarded when they arrive.
    #[default]
    LatestOnly,
    /// Every response is drawn, whatever order they arrive in.
    All,
}

/// A finished request, tagged with the click it belongs to.
#[derive(Debug)]
pub struct Completion {
    /// Token of the originating click.
    pub token: ClickToken,
    /// The clicked point.
    pub point: ClickPoint,
    /// Raw response body, or why there is none.
    pub result: Result<String, DispatchError>,
}

/// What the controller did with a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The response was drawn.
    Rendered {
        /// Originating click.
        token: ClickToken,
        /// What was drawn.
        summary: RenderSummary,
    },
    /// A newer click superseded this one; nothing was drawn.
    Stale {
        /// Originating click.
        token: ClickToken,
        /// The most recent click at the time of arrival.
        latest: ClickToken,
    },
    /// The request or the render failed; the error is in the error slot.
    Failed {
        /// Originating click.
        token: ClickToken,
        /// Error message.
        message: String,
    },
}

/// The most recent failure, shown to the user until the next successful
/// render.
#[derive(Debug, Default)]
pub struct ErrorSlot {
    current: Option<(ClickToken, ClientError)>,
}

impl ErrorSlot {
    /// Replaces the shown error.
    pub fn show(&mut self, token: ClickToken, error: ClientError) {
        self.current = Some((token, error));
    }

    /// The error currently shown, with the click that caused it.
    #[must_use]
    pub fn current(&self) -> Option<(ClickToken, &ClientError)> {
        self.current.as_ref().map(|(token, error)| (*token, error))
    }

    /// Hides the shown error.
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Whether an error is shown.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}

/// Everything left once a click stream has been fully handled.
#[derive(Debug)]
pub struct Session<S, T> {
    /// The source view with everything drawn on it.
    pub source: S,
    /// The target view with everything drawn on it.
    pub target: T,
    /// Error shown at the end of the session, if any.
    pub errors: ErrorSlot,
    /// One outcome per click, in completion order.
    pub outcomes: Vec<Outcome>,
}

/// Binds clicks on the source view to translation requests and renders
/// their responses.
pub struct ClickController<S, T> {
    dispatcher: Arc<QueryDispatcher>,
    renderer: ResponseRenderer,
    policy: ResponsePolicy,
    source: S,
    target: T,
    errors: ErrorSlot,
    next_token: u64,
    latest: Option<ClickToken>,
    in_flight: usize,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<S: MapView, T: MapView> ClickController<S, T> {
    /// Creates a controller drawing on `source` and `target`.
    #[must_use]
    pub fn new(
        dispatcher: Arc<QueryDispatcher>,
        renderer: ResponseRenderer,
        policy: ResponsePolicy,
        source: S,
        target: T,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            dispatcher,
            renderer,
            policy,
            source,
            target,
            errors: ErrorSlot::default(),
            next_token: 1,
            latest: None,
            in_flight: 0,
            completions_tx,
            completions_rx,
        }
    }

    /// The source view.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// The target view.
    pub const fn target(&self) -> &T {
        &self.target
    }

    /// The error slot.
    pub const fn errors(&self) -> &ErrorSlot {
        &self.errors
    }

    /// Token of the most recent click.
    pub const fn latest(&self) -> Option<ClickToken> {
        self.latest
    }

    /// Number of requests whose completion has not been handled yet.
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Handles a click: spawns its request and returns its token without
    /// waiting for the response.
    ///
    /// Must be called from within a `tokio` runtime.
    pub fn on_click(&mut self, point: ClickPoint) -> ClickToken {
        let token = ClickToken(self.next_token);
        self.next_token += 1;
        self.latest = Some(token);
        self.in_flight += 1;

        log::info!("{token} at {}", point.latlng());

        let dispatcher = Arc::clone(&self.dispatcher);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            // A panicking request still has to complete its token.
            let result = tokio::spawn(async move { dispatcher.dispatch(point).await })
                .await
                .unwrap_or_else(|e| Err(DispatchError::from(e)));
            if tx
                .send(Completion {
                    token,
                    point,
                    result,
                })
                .is_err()
            {
                log::debug!("Controller gone before {token} completed");
            }
        });

        token
    }

    /// Waits for the next finished request. Returns `None` when nothing is
    /// in flight.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        if self.in_flight == 0 {
            return None;
        }
        self.completions_rx.recv().await
    }

    /// Applies the response policy to a completion and renders it or
    /// records its failure.
    pub fn on_completion(&mut self, completion: Completion) -> Outcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        let Completion {
            token,
            point,
            result,
        } = completion;

        if self.policy == ResponsePolicy::LatestOnly
            && let Some(latest) = self.latest.filter(|latest| *latest != token)
        {
            log::debug!("Discarding {token} at {}: {latest} is newer", point.latlng());
            return Outcome::Stale { token, latest };
        }

        let rendered = result
            .map_err(ClientError::from)
            .and_then(|body| {
                self.renderer
                    .render(&body, &mut self.source, &mut self.target)
                    .map_err(ClientError::from)
            });

        match rendered {
            Ok(summary) => {
                log::info!("{token} rendered: {}", summary.label);
                self.errors.clear();
                Outcome::Rendered { token, summary }
            }
            Err(e) => {
                log::warn!("{token} at {} failed: {e}", point.latlng());
                let message = e.to_string();
                self.errors.show(token, e);
                Outcome::Failed { token, message }
            }
        }
    }

    /// Runs the controller until `clicks` closes and every request it
    /// started has completed.
    pub async fn run(mut self, mut clicks: mpsc::Receiver<ClickPoint>) -> Session<S, T> {
        let mut outcomes = Vec::new();

        loop {
            tokio::select! {
                click = clicks.recv() => match click {
                    Some(point) => {
                        self.on_click(point);
                    }
                    None => break,
                },
                Some(completion) = self.completions_rx.recv(), if self.in_flight > 0 => {
                    outcomes.push(self.on_completion(completion));
                }
            }
        }

        while let Some(completion) = self.next_completion().await {
            outcomes.push(self.on_completion(completion));
        }

        Session {
            source: self.source,
            target: self.target,
            errors: self.errors,
            outcomes,
        }
    }
}
