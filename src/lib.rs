//! fluxwindow - Flux query window analysis
//!
//! This library inspects already-parsed Flux ASTs to estimate the minimum time
//! window a script's `range` calls require, and manages the Flux tasks of a
//! Kapacitor server.

pub mod ast;
pub mod ast_client;
pub mod cli;
pub mod config;
pub mod duration;
pub mod error;
pub mod tasks;
pub mod window;
