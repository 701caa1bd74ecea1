//! Scripted in-memory transport for controller and session tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::{CancelToken, ClientError, Transport, TransportResponse};

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Json(u16, Value),
    Body(u16, Vec<u8>),
    Fail(String),
    /// Never answers; only cancellation ends the request.
    Hang,
}

pub(crate) struct ScriptedTransport {
    default: Reply,
    by_text: HashMap<String, Reply>,
    /// Cancelled just before a reply is returned, to model a late cancel.
    cancel_before_reply: Option<CancelToken>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    pub(crate) fn new(default: Reply) -> Self {
        Self {
            default,
            by_text: HashMap::new(),
            cancel_before_reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn json(value: Value) -> Self {
        Self::new(Reply::Json(200, value))
    }

    pub(crate) fn reply_for(mut self, text: &str, reply: Reply) -> Self {
        self.by_text.insert(text.to_string(), reply);
        self
    }

    pub(crate) fn cancel_before_reply(mut self, token: CancelToken) -> Self {
        self.cancel_before_reply = Some(token);
        self
    }

    pub(crate) fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse, ClientError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));

        let text = body["text"].as_str().unwrap_or_default();
        let reply = self.by_text.get(text).unwrap_or(&self.default).clone();

        if let Reply::Hang = reply {
            std::future::pending::<()>().await;
        }
        if let Some(token) = &self.cancel_before_reply {
            token.cancel();
        }

        match reply {
            Reply::Json(status, value) => Ok(TransportResponse::new(status, value.to_string())),
            Reply::Body(status, bytes) => Ok(TransportResponse::new(status, bytes)),
            Reply::Fail(message) => Err(ClientError::Other(message)),
            Reply::Hang => unreachable!("pending future never resolves"),
        }
    }
}
