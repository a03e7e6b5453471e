//! Shared test utilities for the tolteca workspace.
//!
//! Dev-dependency only, never published.
//!
//! - [`project`]: [`TestProject`] builder for runtime context directories

pub mod project;

pub use project::TestProject;
