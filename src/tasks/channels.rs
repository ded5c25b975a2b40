use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::audio::SampleBuffer;
use crate::export::{ExportFormat, SavedExport};

/// Commands from the TUI to the export worker
#[derive(Debug)]
pub enum ExportCommand {
    /// Encode this snapshot of the buffer and write it under `target`
    Export {
        buffer: Arc<SampleBuffer>,
        format: ExportFormat,
        target: PathBuf,
    },
    /// Shutdown the worker
    Quit,
}

/// Messages from the export worker to the TUI
#[derive(Debug)]
pub enum ExportEvent {
    Started(ExportFormat),
    Finished(SavedExport),
    /// Export failed; the session is unaffected
    Failed(String),
    Shutdown,
}

/// Channel bundle for communication
pub struct Channels {
    pub cmd_tx: mpsc::Sender<ExportCommand>,
    pub cmd_rx: mpsc::Receiver<ExportCommand>,

    pub event_tx: mpsc::Sender<ExportEvent>,
    pub event_rx: mpsc::Receiver<ExportEvent>,
}

impl Channels {
    pub fn new() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (event_tx, event_rx) = mpsc::channel(8);

        Self {
            cmd_tx,
            cmd_rx,
            event_tx,
            event_rx,
        }
    }

    /// Split into sender/receiver pairs
    pub fn split(
        self,
    ) -> (
        mpsc::Sender<ExportCommand>,
        mpsc::Receiver<ExportCommand>,
        mpsc::Sender<ExportEvent>,
        mpsc::Receiver<ExportEvent>,
    ) {
        (self.cmd_tx, self.cmd_rx, self.event_tx, self.event_rx)
    }
}

impl Default for Channels {
    fn default() -> Self {
        Self::new()
    }
}
