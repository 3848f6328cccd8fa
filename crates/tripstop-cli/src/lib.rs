//! tripstop CLI - command line access to a running tripstop server.
//!
//! This crate provides:
//! - `client`: blocking HTTP client for the server API
//! - `report`: plain-text summaries of routes and curated stops
//! - the `tripstop` binary with `route`, `waypoints` and `stops` subcommands

pub mod client;
pub mod report;

pub use client::{ApiClient, StopsSummary};
