//! # CLI Commands
//!
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── auth.rs     ◄─── login, logout, whoami
//! ├── catalog.rs  ◄─── product listing through the cache
//! ├── shift.rs    ◄─── current shift, clock in / out
//! ├── sale.rs     ◄─── checkout from a cart file
//! ├── stats.rs    ◄─── monitor / daily stats, metrics summary
//! └── config.rs   ◄─── show / init configuration
//! ```
//!
//! Every command takes the one `PosClient` built in `main` and returns
//! `anyhow::Result`; output goes to stdout, logs to stderr.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod sale;
pub mod shift;
pub mod stats;
