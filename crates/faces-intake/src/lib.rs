//! Candidate registration for the Faces talent agency.
//!
//! The [`workflows::registration`] module hosts the wizard: the step registry,
//! per-step validation, the controller state machine, and the submission
//! pipeline that writes to the primary store and syncs the CRM.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
