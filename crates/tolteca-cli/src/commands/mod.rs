//! Command implementations for tolteca-cli

pub mod config;
pub mod files;
pub mod init;
pub mod link;
pub mod setup;

pub use config::run_config;
pub use files::run_files;
pub use init::run_init;
pub use link::run_link;
pub use setup::run_setup;
