//! Scripted doubles for the transport and pause seams.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use super::client::Pause;
use super::transport::{ApiRequest, ApiResponse, HttpTransport, RequestKind, TransportError};

pub(crate) type Reply = Result<ApiResponse, TransportError>;

/// Replies per request kind in order; the last reply for a kind repeats
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<HashMap<RequestKind, VecDeque<Reply>>>,
    log: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn reply(self, kind: RequestKind, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push_back(reply);
        self
    }

    pub(crate) fn json(self, kind: RequestKind, value: serde_json::Value) -> Self {
        self.reply(kind, Ok(ApiResponse::json_ok(value)))
    }

    pub(crate) fn calls(&self) -> Vec<ApiRequest> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, kind: RequestKind) -> usize {
        self.calls().iter().filter(|r| r.kind() == kind).count()
    }

    pub(crate) fn kinds(&self) -> Vec<RequestKind> {
        self.calls().iter().map(|r| r.kind()).collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let kind = request.kind();
        self.log.lock().unwrap().push(request);

        let mut replies = self.replies.lock().unwrap();
        let queue = replies
            .get_mut(&kind)
            .unwrap_or_else(|| panic!("no reply scripted for {:?}", kind));
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}

#[derive(Default)]
pub(crate) struct RecordingPause {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub(crate) fn count(&self) -> usize {
        self.pauses.lock().unwrap().len()
    }

    pub(crate) fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}
