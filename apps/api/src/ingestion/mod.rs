//! Resume ingestion — the background pipeline that turns uploaded PDFs into
//! DONE resumes with extracted content and a remote artifact.

pub mod scheduler;
pub mod worker;

pub use scheduler::{WorkerHandle, WorkerSignal};
pub use worker::{ResumeWorker, Tick};
