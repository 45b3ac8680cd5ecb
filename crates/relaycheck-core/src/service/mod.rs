//! Destination API service handles.

pub mod gmail;

pub use gmail::GmailService;
