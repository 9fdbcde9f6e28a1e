//! # Printer Module
//!
//! This module provides printer profiles and the session that drives a
//! printer over a link.
//!
//! ## Modules
//!
//! - [`config`]: Printer hardware and link parameters
//! - [`session`]: Connect, handshake, send, disconnect

pub mod config;
pub mod session;

pub use config::PrinterProfile;
pub use session::PrinterSession;
