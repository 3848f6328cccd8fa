//! Shared library surface for the tripstop server and its tests.

pub mod api;
pub mod config;
pub mod state;
pub mod stop_planner;
