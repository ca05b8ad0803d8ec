//! Async filesystem helpers re-exported from the underlying runtime.
//!
//! The APIs are kept identical to `tokio::fs` so downstream crates can rely on
//! the familiar surface without depending on tokio directly.

pub use tokio::fs::{
    copy, create_dir_all, metadata, read, read_dir, remove_file, rename, try_exists, write,
    DirEntry, File, OpenOptions,
};
