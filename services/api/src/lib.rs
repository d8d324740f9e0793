//! Learning Path API Library Crate
//!
//! This library contains the web layer of the learning path service: the
//! configuration, the shared state, the HTTP handlers and the routing. The
//! binaries under `bin/` are thin wrappers around it.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
