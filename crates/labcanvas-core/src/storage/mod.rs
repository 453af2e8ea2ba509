//! Storage abstraction for persisting diagrams.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::shapes::Shape;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Diagram not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Generate an id for a diagram saved for the first time.
pub(crate) fn new_diagram_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Trait for diagram storage backends.
///
/// `save` creates a diagram when `id` is `None` and updates it in place
/// otherwise; either way it resolves to the diagram's id.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait Storage: Send + Sync {
    /// Save a shape list.
    fn save(&self, id: Option<&str>, shapes: &[Shape]) -> BoxFuture<'_, StorageResult<String>>;

    /// Load a shape list.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Vec<Shape>>>;

    /// Delete a diagram.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all diagram IDs.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a diagram exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Trait for diagram storage backends (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait Storage {
    /// Save a shape list.
    fn save(&self, id: Option<&str>, shapes: &[Shape]) -> BoxFuture<'_, StorageResult<String>>;

    /// Load a shape list.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Vec<Shape>>>;

    /// Delete a diagram.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all diagram IDs.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a diagram exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Simple blocking executor for tests.
#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {}
        }
    }
}
