//! Outbound clients for the external collaborators.
//!
//! Each collaborator sits behind a trait so the pipeline receives it by
//! injection and tests can substitute an in-process fake.

pub mod defectdojo;
pub mod zap;
