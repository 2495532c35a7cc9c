//! Domain models: scan targets, scanner alerts and run lifecycle.

pub mod alert;
pub mod scan;
pub mod target;
