//! # Runtime
//!
//! Process wiring: startup, the watch loop, its error policy and the periodic
//! cache refresh.

pub mod cache_refresh;
pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
