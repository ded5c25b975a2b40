use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::export::{CompressedEncoder, Exporter};

use super::channels::{ExportCommand, ExportEvent};

/// Background task that encodes and writes exports off the UI loop
pub struct ExportWorker<E> {
    exporter: Exporter<E>,
    cmd_rx: mpsc::Receiver<ExportCommand>,
    event_tx: mpsc::Sender<ExportEvent>,
}

impl<E: CompressedEncoder + Send + Sync + 'static> ExportWorker<E> {
    pub fn new(
        exporter: Exporter<E>,
        cmd_rx: mpsc::Receiver<ExportCommand>,
        event_tx: mpsc::Sender<ExportEvent>,
    ) -> Self {
        Self {
            exporter,
            cmd_rx,
            event_tx,
        }
    }

    /// Run until `Quit` or until every command sender is gone
    #[instrument(skip(self), name = "export_worker")]
    pub async fn run(mut self) {
        info!("Export worker starting");

        while let Some(cmd) = self.cmd_rx.recv().await {
            match cmd {
                ExportCommand::Export {
                    buffer,
                    format,
                    target,
                } => {
                    debug!(?format, target = %target.display(), "Received export command");
                    let _ = self.event_tx.send(ExportEvent::Started(format)).await;

                    let event = match self.exporter.export_to(&buffer, format, &target).await {
                        Ok(saved) => ExportEvent::Finished(saved),
                        Err(e) => {
                            warn!(error = %e, "Export failed");
                            ExportEvent::Failed(format!("Export failed: {}", e))
                        }
                    };
                    let _ = self.event_tx.send(event).await;
                }
                ExportCommand::Quit => {
                    info!("Received Quit command");
                    break;
                }
            }
        }

        info!("Export worker shutting down");
        let _ = self.event_tx.send(ExportEvent::Shutdown).await;
    }
}
