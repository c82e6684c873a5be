//! Scripted transport for unit tests

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::transport::{ApiRequest, RawResponse, Transport, TransportError};

enum Reply {
    Response(RawResponse),
    Unreachable,
}

/// One canned reply, optionally delayed
pub struct Scripted {
    reply: Reply,
    delay: Duration,
}

impl Scripted {
    pub fn json(status: u16, body: Value) -> Self {
        Self::raw(status, serde_json::to_vec(&body).unwrap())
    }

    pub fn raw(status: u16, body: Vec<u8>) -> Self {
        Self {
            reply: Reply::Response(RawResponse { status, body }),
            delay: Duration::ZERO,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reply: Reply::Unreachable,
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Replays scripted replies in order and records every request it sees
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();

        let Some(scripted) = next else {
            return Err(TransportError::Other("no scripted reply left".to_string()));
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }

        match scripted.reply {
            Reply::Response(response) => Ok(response),
            Reply::Unreachable => Err(TransportError::Connect("connection refused".to_string())),
        }
    }
}
