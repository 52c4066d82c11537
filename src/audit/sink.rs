//! Audit sinks
//!
//! `AuditSink` is the boundary the mutation coordinator writes to. The JSONL
//! sink appends one event per line and flushes immediately; the memory sink
//! keeps events in process for tests and dry runs.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{LedgerError, LedgerResult};

use super::event::AuditEvent;

/// Receives significant state changes
///
/// Callers never let a failed write block the change it describes.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: &AuditEvent) -> LedgerResult<()>;
}

/// Append-only JSONL audit log on disk
pub struct JsonlAuditSink {
    log_path: PathBuf,
}

impl JsonlAuditSink {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append one event as a JSON line
    pub fn log(&self, event: &AuditEvent) -> LedgerResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| LedgerError::Io(format!("Failed to open audit log: {}", e)))?;

        let json = serde_json::to_string(event)
            .map_err(|e| LedgerError::Json(format!("Failed to serialize audit event: {}", e)))?;

        writeln!(file, "{}", json)
            .map_err(|e| LedgerError::Io(format!("Failed to write audit event: {}", e)))?;

        file.flush()
            .map_err(|e| LedgerError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// Read every event, oldest first
    pub fn read_all(&self) -> LedgerResult<Vec<AuditEvent>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| LedgerError::Io(format!("Failed to open audit log: {}", e)))?;

        let mut events = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                LedgerError::Io(format!("Failed to read audit log line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let event: AuditEvent = serde_json::from_str(&line).map_err(|e| {
                LedgerError::Json(format!(
                    "Failed to parse audit event at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            events.push(event);
        }

        Ok(events)
    }

    /// Read the most recent `count` events
    pub fn read_recent(&self, count: usize) -> LedgerResult<Vec<AuditEvent>> {
        let mut events = self.read_all()?;
        let start = events.len().saturating_sub(count);
        Ok(events.split_off(start))
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn record(&self, event: &AuditEvent) -> LedgerResult<()> {
        self.log(event)
    }
}

/// In-process sink
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: RwLock<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: &AuditEvent) -> LedgerResult<()> {
        let mut events = self
            .events
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        events.push(event.clone());
        Ok(())
    }
}

/// Sink used when auditing is switched off
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

#[async_trait]
impl AuditSink for NullAuditSink {
    async fn record(&self, _event: &AuditEvent) -> LedgerResult<()> {
        Ok(())
    }
}
