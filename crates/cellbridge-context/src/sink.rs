//! Output sinks: where `display` and `print` emissions go.
//!
//! The sink is append-only and never read by the bridge. Implementations
//! must not block: the bridge does no buffering or backpressure of its own.

use crate::unit::UnitId;
use cellbridge_render::RenderedOutput;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionKind {
    Display,
    Print,
}

impl EmissionKind {
    /// Notebook message type carrying this emission.
    pub fn message_type(&self) -> &'static str {
        match self {
            EmissionKind::Display => "display_data",
            EmissionKind::Print => "stream",
        }
    }
}

/// One write to the sink.
#[derive(Debug, Clone, Serialize)]
pub struct Emission {
    pub unit: UnitId,
    pub kind: EmissionKind,
    pub timestamp: DateTime<Utc>,
    pub output: RenderedOutput,
}

impl Emission {
    pub fn new(unit: UnitId, kind: EmissionKind, output: RenderedOutput) -> Self {
        Self {
            unit,
            kind,
            timestamp: Utc::now(),
            output,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("SINK/CLOSED: output sink is closed")]
    Closed,
}

pub trait OutputSink: Send + Sync {
    fn emit(&self, emission: Emission) -> Result<(), SinkError>;
}

// ============================================================================
// Channel sink
// ============================================================================

/// Sink over an unbounded tokio channel. Sending never blocks; the host
/// drains the receiver on its own task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Emission>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Emission>) -> Self {
        Self { tx }
    }

    pub fn unbounded() -> (Self, mpsc::UnboundedReceiver<Emission>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl OutputSink for ChannelSink {
    fn emit(&self, emission: Emission) -> Result<(), SinkError> {
        self.tx.send(emission).map_err(|_| SinkError::Closed)
    }
}

// ============================================================================
// Memory sink
// ============================================================================

/// Collects emissions in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    emissions: Mutex<Vec<Emission>>,
    closed: Mutex<bool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emissions(&self) -> Vec<Emission> {
        self.emissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Remove and return everything collected so far.
    pub fn drain(&self) -> Vec<Emission> {
        std::mem::take(&mut *self.emissions.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Text/plain payloads in emission order.
    pub fn texts(&self) -> Vec<String> {
        self.emissions()
            .iter()
            .filter_map(|e| e.output.plain_text().map(str::to_string))
            .collect()
    }

    /// Reject every later emission.
    pub fn close(&self) {
        *self.closed.lock().unwrap_or_else(|e| e.into_inner()) = true;
    }
}

impl OutputSink for MemorySink {
    fn emit(&self, emission: Emission) -> Result<(), SinkError> {
        if *self.closed.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(SinkError::Closed);
        }
        self.emissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(emission);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelSink::unbounded();
        for text in ["one", "two"] {
            sink.emit(Emission::new(
                UnitId::from("1"),
                EmissionKind::Print,
                RenderedOutput::text(text),
            ))
            .unwrap();
        }
        drop(sink);

        let mut seen = Vec::new();
        while let Some(emission) = rx.recv().await {
            seen.push(emission.output.plain_text().unwrap().to_string());
        }
        assert_eq!(seen, vec!["one", "two"]);
    }

    #[test]
    fn test_channel_sink_closed_receiver() {
        let (sink, rx) = ChannelSink::unbounded();
        drop(rx);
        let result = sink.emit(Emission::new(
            UnitId::from("1"),
            EmissionKind::Display,
            RenderedOutput::text("lost"),
        ));
        assert_eq!(result, Err(SinkError::Closed));
    }

    #[test]
    fn test_memory_sink_drain_empties() {
        let sink = MemorySink::new();
        for text in ["a", "b"] {
            sink.emit(Emission::new(UnitId::from("1"), EmissionKind::Print, RenderedOutput::text(text)))
                .unwrap();
        }

        let drained = sink.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[1].output.plain_text(), Some("b"));
        assert!(sink.emissions().is_empty());
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn test_emission_serializes_bundle() {
        let emission = Emission::new(UnitId::from("7"), EmissionKind::Display, RenderedOutput::text("x"));
        let json = serde_json::to_value(&emission).unwrap();
        assert_eq!(json["unit"], "7");
        assert_eq!(json["kind"], "display");
        assert_eq!(json["output"]["data"]["text/plain"], "x");
        assert_eq!(EmissionKind::Print.message_type(), "stream");
    }
}
