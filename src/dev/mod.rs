// src/dev/mod.rs

//! Development mode.
//!
//! - [`supervisor`] drives the watch-triggered rebuild and restart state
//!   machine.
//! - [`server`] supervises the subordinate server process.
//! - [`reload`] defines the live-reload transport and its default TCP
//!   implementation.

pub mod reload;
pub mod server;
pub mod supervisor;

pub use reload::{LiveReload, TcpReloadServer};
pub use server::ServerEvent;
pub use supervisor::{DevSupervisor, SupervisorState, RELOAD_DEBOUNCE};
