//! Scan orchestration services.

pub mod dispatch;
pub mod persister;
pub mod pipeline;
pub mod poller;
pub mod uploader;
