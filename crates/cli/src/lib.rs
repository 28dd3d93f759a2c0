//! Command-line host for the kdbg debugger state.
//!
//! Replays NDJSON host-event scripts against a [`kdbg::Debugger`], persists
//! open debugger panels between runs, and prints structured results.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod state_store;
