//! Command handlers module.
//!
//! - `config.rs`: configuration display command
//! - `serve.rs`: database initialisation and the HTTP server

mod config;
mod serve;

pub use config::cmd_config;
pub use serve::{cmd_init_db, cmd_serve};
