//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-runtime`, `core-assets`). Host applications can
//! depend on `asset-viewer-workspace` and enable the documented features
//! without wiring each crate individually.

#[cfg(any(feature = "assets", feature = "desktop-shims"))]
pub use core_assets as assets;

#[cfg(feature = "desktop-shims")]
pub use core_runtime as runtime;
