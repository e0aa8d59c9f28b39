// RouterLog - platform/mod.rs
//
// Platform layer: directories, config.toml, storage bootstrap.
// Must NOT depend on: core, app.

pub mod config;
