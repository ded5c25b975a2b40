mod channels;
mod worker;

pub use channels::{Channels, ExportCommand, ExportEvent};
pub use worker::ExportWorker;
