//! Events delivered to the consumer during a run.

use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// One human-readable line (page errors, per-item outcomes, milestones).
    Log(String),
    /// Integer percentage of download units completed.
    Progress(u8),
    /// Always the last event of a run.
    Finished { succeeded: usize, total: usize },
}

/// Thin wrapper over the channel; a consumer that hung up is not an error.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: UnboundedSender<RunEvent>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<RunEvent>) -> Self {
        Self { tx }
    }

    pub fn log(&self, line: impl Into<String>) {
        let _ = self.tx.send(RunEvent::Log(line.into()));
    }

    pub fn progress(&self, pct: u8) {
        let _ = self.tx.send(RunEvent::Progress(pct));
    }

    pub fn finished(&self, succeeded: usize, total: usize) {
        let _ = self.tx.send(RunEvent::Finished { succeeded, total });
    }
}
