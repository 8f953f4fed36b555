//! Event Logger
//!
//! Append-only JSONL event logging.

use iconlife_events::SimEvent;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// One line of the log: the event plus a sequential id
#[derive(Serialize)]
struct LogLine<'a> {
    event_id: String,
    #[serde(flatten)]
    event: &'a SimEvent,
}

/// Writes events to a JSONL file
pub struct EventLogger {
    writer: Option<BufWriter<File>>,
    event_count: u64,
    next_event_id: u64,
}

impl EventLogger {
    /// Create a new event logger writing to the specified path
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            event_count: 0,
            next_event_id: 1,
        })
    }

    /// Create a logger that discards events
    pub fn null() -> Self {
        Self {
            writer: None,
            event_count: 0,
            next_event_id: 1,
        }
    }

    /// Generate the next event ID
    pub fn next_id(&mut self) -> String {
        let id = format!("evt_{:08}", self.next_event_id);
        self.next_event_id += 1;
        id
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    pub fn log(&mut self, event: &SimEvent) -> std::io::Result<()> {
        let line = LogLine {
            event_id: self.next_id(),
            event,
        };
        self.event_count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(&line)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    pub fn log_batch(&mut self, events: &[SimEvent]) -> std::io::Result<()> {
        for event in events {
            self.log(event)?;
        }
        Ok(())
    }

    /// Flush the buffer to disk
    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "failed to flush event log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iconlife_events::{ServiceKind, Vec2};
    use std::io::BufRead;

    #[test]
    fn test_event_logging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let mut logger = EventLogger::new(&path).unwrap();
        logger
            .log_batch(&[
                SimEvent::Spawned {
                    tick: 0,
                    agent: 4,
                    kind: ServiceKind::Router,
                    position: Vec2::new(10.0, 20.0),
                },
                SimEvent::Connected {
                    tick: 5,
                    router: 4,
                    function: 9,
                },
            ])
            .unwrap();
        logger.flush().unwrap();

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = std::io::BufReader::new(file)
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["event_id"], "evt_00000001");
        assert_eq!(first["type"], "spawned");
        assert_eq!(first["kind"], "router");

        let second: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(second["event_id"], "evt_00000002");
        assert_eq!(second["function"], 9);
    }

    #[test]
    fn test_null_logger() {
        let mut logger = EventLogger::null();
        let event = SimEvent::Died {
            tick: 1,
            agent: 2,
            kind: ServiceKind::Compute,
        };

        // Should succeed without actually writing
        logger.log(&event).unwrap();
        assert_eq!(logger.event_count(), 1);
        assert_eq!(logger.next_id(), "evt_00000002");
    }
}
