mod controller;
mod state;

pub use controller::{WorkflowController, UPLOAD_INTERRUPTED_MESSAGE};
pub use state::{HistoryState, UploadPhase, UploadState};
