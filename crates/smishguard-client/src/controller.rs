//! Classification request lifecycle.
//!
//! One [`Attempt`] sends one request and reports at most one [`Outcome`]:
//!
//! ```text
//! Idle → Requesting → Completed | Failed | Cancelled
//! ```
//!
//! `Requesting` is the only state that suspends. Cancellation is checked
//! before dispatch, raced against the in-flight request, and checked again
//! right before the outcome is emitted, so a cancelled attempt never
//! delivers anything.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use smishguard_core::{AnalysisResult, ClientConfig, Verdict, View, normalize};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{CancelToken, ClientError, Transport, TransportResponse};

/// Lifecycle of a single classification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Idle,
    Requesting,
    Completed,
    Failed,
    Cancelled,
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Terminal result of an attempt that was not cancelled.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The service answered; the body was normalized and judged.
    Completed {
        result: AnalysisResult,
        verdict: Verdict,
    },
    /// Nothing usable came back. `result` is the degraded `unknown` result.
    Failed { result: AnalysisResult, error: String },
}

impl Outcome {
    pub fn result(&self) -> &AnalysisResult {
        match self {
            Self::Completed { result, .. } | Self::Failed { result, .. } => result,
        }
    }

    pub fn into_result(self) -> AnalysisResult {
        match self {
            Self::Completed { result, .. } | Self::Failed { result, .. } => result,
        }
    }

    /// `None` for failed attempts: an inconclusive check has no verdict.
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            Self::Completed { verdict, .. } => Some(*verdict),
            Self::Failed { .. } => None,
        }
    }

    /// Where the presentation layer should go next.
    ///
    /// Failures always land on the dangerous view so they are never
    /// presented as verified-safe.
    pub fn view(&self) -> View {
        match self {
            Self::Completed { verdict, .. } => verdict.view(),
            Self::Failed { .. } => View::Dangerous,
        }
    }

    pub fn state(&self) -> AttemptState {
        match self {
            Self::Completed { .. } => AttemptState::Completed,
            Self::Failed { .. } => AttemptState::Failed,
        }
    }
}

/// Issues classification requests against one service endpoint.
pub struct Classifier<T> {
    transport: Arc<T>,
    config: ClientConfig,
}

impl<T> Clone for Classifier<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
        }
    }
}

impl<T: Transport + 'static> Classifier<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Start an attempt in the background with its own cancel token.
    pub fn classify(&self, text: impl Into<String>) -> Result<Attempt, ClientError> {
        self.classify_with(text, CancelToken::new())
    }

    /// Start an attempt in the background, cancelled by `cancel`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn classify_with(
        &self,
        text: impl Into<String>,
        cancel: CancelToken,
    ) -> Result<Attempt, ClientError> {
        let text = validate(text.into())?;
        let (state_tx, state_rx) = watch::channel(AttemptState::Idle);
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let classifier = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            if let Some(outcome) = classifier.drive(&text, &token, &state_tx).await {
                // The receiver may already be gone if the caller abandoned the attempt.
                let _ = outcome_tx.send(outcome);
            }
        });

        Ok(Attempt {
            outcome: Some(outcome_rx),
            cancel,
            state: state_rx,
            task,
        })
    }

    /// Run one attempt on the current task.
    ///
    /// Returns `Ok(None)` when `cancel` fired before an outcome was emitted.
    pub async fn run(
        &self,
        text: impl Into<String>,
        cancel: &CancelToken,
    ) -> Result<Option<Outcome>, ClientError> {
        let text = validate(text.into())?;
        let (state_tx, _state_rx) = watch::channel(AttemptState::Idle);
        Ok(self.drive(&text, cancel, &state_tx).await)
    }

    async fn drive(
        &self,
        text: &str,
        cancel: &CancelToken,
        state: &watch::Sender<AttemptState>,
    ) -> Option<Outcome> {
        transition(state, AttemptState::Requesting);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            outcome = self.request(text, cancel) => outcome,
        };

        // A response that raced a cancel is still discarded.
        match outcome {
            Some(outcome) if !cancel.is_cancelled() => {
                transition(state, outcome.state());
                info!(
                    state = outcome.state().as_str(),
                    view = outcome.view().as_str(),
                    label = outcome.result().label().unwrap_or("-"),
                    "classification attempt finished"
                );
                Some(outcome)
            }
            _ => {
                transition(state, AttemptState::Cancelled);
                info!("classification attempt cancelled");
                None
            }
        }
    }

    async fn request(&self, text: &str, cancel: &CancelToken) -> Option<Outcome> {
        if !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }
        if cancel.is_cancelled() {
            return None;
        }

        let url = self.config.analyze_url();
        let body = json!({ "text": text });
        info!(url = %url, chars = text.chars().count(), "dispatching classification request");

        let outcome = match self.transport.post_json(&url, &body).await {
            Ok(resp) => completed(&resp),
            Err(e) => {
                warn!(url = %url, error = %e, "classification request failed");
                failed(&url, &e)
            }
        };
        Some(outcome)
    }
}

/// Handle to a background attempt.
///
/// Dropping the handle cancels the attempt.
pub struct Attempt {
    outcome: Option<oneshot::Receiver<Outcome>>,
    cancel: CancelToken,
    state: watch::Receiver<AttemptState>,
    task: JoinHandle<()>,
}

impl Attempt {
    /// Abandon the attempt. No further outcome will be delivered.
    ///
    /// An outcome already returned by [`Attempt::outcome`] stays valid and
    /// the terminal state is kept.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> AttemptState {
        *self.state.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the attempt's outcome.
    ///
    /// Yields `None` if the attempt was cancelled, and on every call after
    /// the one that resolved. Dropping the returned future before it
    /// resolves loses nothing; the next call picks up the same outcome.
    pub async fn outcome(&mut self) -> Option<Outcome> {
        let received = self.outcome.as_mut()?.await.ok();
        self.outcome = None;
        // A cancel that lands after the task emitted still wins at the handle.
        if self.cancel.is_cancelled() {
            return None;
        }
        received
    }
}

impl Drop for Attempt {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn validate(text: String) -> Result<String, ClientError> {
    if text.trim().is_empty() {
        return Err(ClientError::EmptyText);
    }
    Ok(text)
}

/// Terminal states are sticky; later transitions are ignored.
fn transition(state: &watch::Sender<AttemptState>, next: AttemptState) {
    state.send_if_modified(|current| {
        if current.is_terminal() || *current == next {
            return false;
        }
        debug!(from = current.as_str(), to = next.as_str(), "attempt state");
        *current = next;
        true
    });
}

fn completed(resp: &TransportResponse) -> Outcome {
    let payload = parse_payload(resp);
    let result = normalize(&payload);
    let verdict = Verdict::from_result(&result);
    Outcome::Completed { result, verdict }
}

/// Parse the body as JSON, substituting `{}` when it is not.
fn parse_payload(resp: &TransportResponse) -> Value {
    serde_json::from_slice(&resp.body).unwrap_or_else(|e| {
        warn!(
            status = resp.status,
            bytes = resp.body.len(),
            error = %e,
            "response body is not JSON, normalizing an empty object"
        );
        json!({})
    })
}

fn failed(url: &str, error: &ClientError) -> Outcome {
    let message = error.to_string();
    let diagnostic = json!({
        "error": message,
        "kind": "transport",
        "url": url,
        "occurred_at": Utc::now().to_rfc3339(),
    });
    Outcome::Failed {
        result: AnalysisResult::unknown(diagnostic),
        error: message,
    }
}
