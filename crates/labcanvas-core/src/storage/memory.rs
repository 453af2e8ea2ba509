//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult, new_diagram_id};
use crate::shapes::Shape;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    diagrams: RwLock<HashMap<String, Vec<Shape>>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn save(&self, id: Option<&str>, shapes: &[Shape]) -> BoxFuture<'_, StorageResult<String>> {
        let id = id.map(str::to_string).unwrap_or_else(new_diagram_id);
        let shapes = shapes.to_vec();
        Box::pin(async move {
            let mut diagrams = self.diagrams.write().map_err(lock_error)?;
            diagrams.insert(id.clone(), shapes);
            Ok(id)
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Vec<Shape>>> {
        let id = id.to_string();
        Box::pin(async move {
            let diagrams = self.diagrams.read().map_err(lock_error)?;
            diagrams.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut diagrams = self.diagrams.write().map_err(lock_error)?;
            diagrams.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let diagrams = self.diagrams.read().map_err(lock_error)?;
            Ok(diagrams.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let diagrams = self.diagrams.read().map_err(lock_error)?;
            Ok(diagrams.contains_key(&id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeKind;
    use crate::storage::block_on;

    fn sample() -> Vec<Shape> {
        vec![
            Shape::new(ShapeKind::Rect, 0.0, 0.0, 10.0, 10.0),
            Shape::new(ShapeKind::Circle, 20.0, 0.0, 10.0, 10.0),
        ]
    }

    #[test]
    fn test_create_then_update_in_place() {
        let storage = MemoryStorage::new();
        let shapes = sample();

        let id = block_on(storage.save(None, &shapes)).unwrap();
        let again = block_on(storage.save(Some(&id), &shapes[..1])).unwrap();
        assert_eq!(id, again);

        let loaded = block_on(storage.load(&id)).unwrap();
        assert_eq!(loaded, shapes[..1].to_vec());
        assert_eq!(block_on(storage.list()).unwrap().len(), 1);
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load("nonexistent"));

        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_delete() {
        let storage = MemoryStorage::new();

        assert!(!block_on(storage.exists("test")).unwrap());
        block_on(storage.save(Some("test"), &sample())).unwrap();
        assert!(block_on(storage.exists("test")).unwrap());
        block_on(storage.delete("test")).unwrap();
        assert!(!block_on(storage.exists("test")).unwrap());
    }
}
