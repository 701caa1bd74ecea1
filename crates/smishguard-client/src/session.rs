//! Latest-wins admission of classification attempts.
//!
//! A [`Session`] owns at most one live attempt. Submitting new text cancels
//! and drops the previous attempt before starting the next, so a superseded
//! attempt can never deliver an outcome. Dropping the session drops, and so
//! cancels, its live attempt.

use smishguard_core::View;
use tracing::debug;

use crate::{Attempt, CancelToken, Classifier, ClientError, Outcome, Transport};

pub struct Session<T> {
    classifier: Classifier<T>,
    current: Option<Attempt>,
    view: View,
}

impl<T: Transport + 'static> Session<T> {
    pub fn new(classifier: Classifier<T>) -> Self {
        Self {
            classifier,
            current: None,
            view: View::Home,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Cancel token of the live attempt, if any.
    pub fn cancel_token(&self) -> Option<CancelToken> {
        self.current.as_ref().map(Attempt::cancel_token)
    }

    /// Start classifying `text`, superseding any attempt in flight.
    ///
    /// Empty text is rejected and leaves the live attempt untouched.
    pub fn submit(&mut self, text: impl Into<String>) -> Result<(), ClientError> {
        let attempt = self.classifier.classify(text)?;
        if let Some(previous) = self.current.replace(attempt) {
            previous.cancel();
            debug!("superseded in-flight classification attempt");
        }
        self.view = View::Loading;
        Ok(())
    }

    /// Wait for the live attempt and move to the view its outcome selects.
    ///
    /// `None` when nothing is in flight or the attempt was cancelled; a
    /// cancelled attempt returns the session home. Safe to abandon midway:
    /// the attempt stays live and a later call still receives its outcome.
    pub async fn next_outcome(&mut self) -> Option<Outcome> {
        let outcome = self.current.as_mut()?.outcome().await;
        self.current = None;
        self.view = match &outcome {
            Some(outcome) => outcome.view(),
            None => {
                debug!("live attempt was cancelled, returning home");
                View::Home
            }
        };
        outcome
    }

    /// Leave the result flow: cancel anything in flight and return home.
    pub fn exit(&mut self) {
        if let Some(attempt) = self.current.take() {
            attempt.cancel();
        }
        self.view = View::Home;
    }
}
