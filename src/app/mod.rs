// RouterLog - app/mod.rs
//
// Application layer: settings resolution, device sources, the filesystem
// store, notification channels, and the sync cycle that ties them together.

pub mod notify;
pub mod settings;
pub mod source;
pub mod store;
pub mod sync;
