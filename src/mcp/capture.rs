//! Raw response capture on the server's output stream.
//!
//! rmcp decodes server responses into typed results, and anything its structs
//! do not model is lost on the way. [`RecordingReader`] sits between the
//! server's stdout and rmcp's codec and keeps the untouched `result` member of
//! every response, keyed by request id, until the caller takes it.

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{ready, Context, Poll};

use rmcp::model::RequestId;
use serde_json::Value;
use tokio::io::{AsyncRead, ReadBuf};
use tracing::trace;

/// Raw `result` payloads seen on the wire, by request id.
#[derive(Debug, Default)]
pub struct RawResults {
    results: Mutex<HashMap<RequestId, Value>>,
}

impl RawResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the payload recorded for `id`.
    pub fn take(&self, id: &RequestId) -> Option<Value> {
        self.lock().remove(id)
    }

    /// Drop every recorded payload.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RequestId, Value>> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the `result` of one newline-delimited JSON-RPC message, if it is
    /// a successful response. Everything else is ignored.
    fn observe_line(&self, line: &[u8]) {
        let Ok(Value::Object(mut message)) = serde_json::from_slice::<Value>(line) else {
            return;
        };
        if message.contains_key("method") {
            return;
        }
        let (Some(id), Some(result)) = (message.remove("id"), message.remove("result")) else {
            return;
        };
        if let Ok(id) = serde_json::from_value::<RequestId>(id) {
            trace!(%id, "recorded raw MCP result");
            self.lock().insert(id, result);
        }
    }
}

/// [`AsyncRead`] adapter that hands every complete line it passes through to
/// [`RawResults`]. The bytes themselves are forwarded unchanged.
pub struct RecordingReader<R> {
    inner: R,
    line: Vec<u8>,
    results: Arc<RawResults>,
}

impl<R> RecordingReader<R> {
    pub fn new(inner: R, results: Arc<RawResults>) -> Self {
        Self {
            inner,
            line: Vec::new(),
            results,
        }
    }

    fn observe(&mut self, bytes: &[u8]) {
        for chunk in bytes.split_inclusive(|b| *b == b'\n') {
            match chunk.split_last() {
                Some((b'\n', head)) => {
                    self.line.extend_from_slice(head);
                    let line = std::mem::take(&mut self.line);
                    self.results.observe_line(&line);
                }
                _ => self.line.extend_from_slice(chunk),
            }
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for RecordingReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        ready!(Pin::new(&mut this.inner).poll_read(cx, buf))?;
        this.observe(&buf.filled()[before..]);
        Poll::Ready(Ok(()))
    }
}
