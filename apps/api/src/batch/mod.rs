// Batch Orchestrator: records → rendered payslips, plus the upload/download transport.
// Renders fan out on tokio::task::spawn_blocking under a semaphore.

pub mod archive;
pub mod handlers;
pub mod orchestrator;
pub mod retention;
