//! Runtime utilities that abstract over the underlying async executor.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a lightweight current-thread
/// runtime.
///
/// Returns the build error instead of panicking so sync call sites (logging
/// layers, config builders) can degrade gracefully.
pub fn block_on<F>(future: F) -> std::io::Result<F::Output>
where
    F: std::future::Future,
{
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}
