//! CLI command implementations.
//!
//! - [`track`] - Follow a position feed and print the live distance
//! - [`route`] - One-shot route fetch
//! - [`config`] - Configuration management (path, show, init)

pub mod common;
pub mod config;
pub mod route;
pub mod track;
