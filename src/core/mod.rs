// RouterLog - core/mod.rs
//
// Core sync logic: entry model, line parsing, persisted-line encoding, diff.
// Must NOT depend on: app, platform, or open files directly.

pub mod diff;
pub mod model;
pub mod parser;
pub mod store;
