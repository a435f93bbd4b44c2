use std::sync::Arc;

use parking_lot::RwLock;

use crate::index::Library;

/// Shared pointer to the current catalog snapshot.
///
/// Readers take an `Arc` and keep it for the whole request; a rescan swaps in
/// a new snapshot without disturbing them.
#[derive(Debug, Clone)]
pub struct LibraryHandle {
    current: Arc<RwLock<Arc<Library>>>,
}

impl LibraryHandle {
    pub fn new(library: Library) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(library))),
        }
    }

    pub fn snapshot(&self) -> Arc<Library> {
        self.current.read().clone()
    }

    /// Publish a new snapshot, returning the previous one.
    pub fn replace(&self, library: Library) -> Arc<Library> {
        std::mem::replace(&mut *self.current.write(), Arc::new(library))
    }
}

impl Default for LibraryHandle {
    fn default() -> Self {
        Self::new(Library::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Collection;
    use nf_core::config::CollectionKind;

    #[test]
    fn held_snapshot_survives_replace() {
        let handle = LibraryHandle::default();
        let before = handle.snapshot();
        assert!(before.collections().is_empty());

        let old = handle.replace(Library::new(vec![Collection {
            name: "Movies".into(),
            kind: CollectionKind::Movies,
            source_id: 1,
            directory: "/m".into(),
            items: Vec::new(),
        }]));

        assert!(Arc::ptr_eq(&old, &before));
        assert!(before.collections().is_empty());
        assert_eq!(handle.snapshot().collections().len(), 1);
        assert_eq!(handle.clone().snapshot().collections()[0].name, "Movies");
    }
}
