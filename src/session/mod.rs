pub mod mount;

pub use mount::{mount_scope, on_mount, MountParams};
