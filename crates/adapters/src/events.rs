//! Event sinks for tracker notifications

use asset_regen_domain::{EventSink, RegenerationEvent};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Logs every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &RegenerationEvent) {
        match event {
            RegenerationEvent::CategoryStarted {
                category,
                reason,
                fingerprint,
            } => tracing::info!(
                event = event.name(),
                category = %category,
                reason = %reason,
                fingerprint = %fingerprint,
                "Category regeneration started"
            ),
            RegenerationEvent::Skipped { category, reason } => tracing::info!(
                event = event.name(),
                category = %category,
                reason = %reason,
                "Category skipped"
            ),
            RegenerationEvent::EnabledChanged { enabled } => {
                tracing::info!(event = event.name(), enabled, "Change tracking toggled")
            }
            RegenerationEvent::ForceAll => {
                tracing::info!(event = event.name(), "All categories forced")
            }
            RegenerationEvent::ForceCategory { category } => tracing::info!(
                event = event.name(),
                category = %category,
                "Category forced"
            ),
        }
    }
}

/// Appends every event as one JSON line, for orchestrators tailing the file
#[derive(Debug, Clone)]
pub struct JsonlEventSink {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl JsonlEventSink {
    pub fn new(path: PathBuf) -> Result<Self, EventLogError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // EventSink::emit is synchronous, so this is a blocking std::fs append of one line
    fn append(&self, event: &RegenerationEvent) -> Result<(), EventLogError> {
        let line = serde_json::to_string(event)?;
        let mut file = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        Ok(())
    }
}

impl EventSink for JsonlEventSink {
    fn emit(&self, event: &RegenerationEvent) {
        if let Err(error) = self.append(event) {
            tracing::error!(
                path = %self.path.display(),
                event = event.name(),
                error = %error,
                "Failed to append event"
            );
        }
    }
}

/// Forwards every event to each inner sink in order
#[derive(Clone, Default)]
pub struct FanoutEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutEventSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }
}

impl EventSink for FanoutEventSink {
    fn emit(&self, event: &RegenerationEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}
