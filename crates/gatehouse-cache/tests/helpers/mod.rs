//! Test helpers para gatehouse-cache.

#![allow(dead_code, unused_imports)]

pub mod control_plane;
pub mod loaders;

pub use control_plane::{TOKEN, client_for, mount_json, mount_status};
pub use loaders::CountingLoader;
