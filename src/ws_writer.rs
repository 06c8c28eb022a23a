//! C1: Thread-safe WS writer.
//!
//! Serializes concurrent JSON writes onto a single WebSocket. Reads don't
//! need locking — only one reader exists per socket, the message loop (C7).
//! `WsWriter` is a trait so tests and cleanup paths can use a no-op writer
//! without standing up a real HTTP upgrade.

use async_trait::async_trait;
use axum::extract::ws::Message as WsMessage;
use futures_util::{Sink, SinkExt};
use serde::Serialize;
use tokio::sync::Mutex;

#[async_trait]
pub trait WsWriter: Send + Sync {
    async fn write_text(&self, text: String) -> Result<(), axum::Error>;
    async fn close(&self);
}

pub struct ThreadSafeWriter<S> {
    sink: Mutex<S>,
}

impl<S> ThreadSafeWriter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }
}

#[async_trait]
impl<S, E> WsWriter for ThreadSafeWriter<S>
where
    S: Sink<WsMessage, Error = E> + Unpin + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    /// Writes one text frame atomically; the mutex serializes concurrent
    /// writers onto the single underlying socket.
    async fn write_text(&self, text: String) -> Result<(), axum::Error> {
        let mut sink = self.sink.lock().await;
        sink.send(WsMessage::Text(text))
            .await
            .map_err(axum::Error::new)
    }

    async fn close(&self) {
        let mut sink = self.sink.lock().await;
        let _ = sink.close().await;
    }
}

pub async fn write_json<T: Serialize + Sync>(
    writer: &dyn WsWriter,
    v: &T,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(v).map_err(axum::Error::new)?;
    writer.write_text(text).await
}

/// No-op writer for tests and internal round-trips that never touch a real
/// socket.
pub struct NullWriter;

#[async_trait]
impl WsWriter for NullWriter {
    async fn write_text(&self, _text: String) -> Result<(), axum::Error> {
        Ok(())
    }

    async fn close(&self) {}
}
