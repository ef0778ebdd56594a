// notarium-common: shared types and the approval diff engine for the
// Notarium workspace.

pub mod diff;
pub mod outline;
pub mod types;
