//! Deletion guard — a culture with descendants cannot be removed
//!
//! Lineage traversal trusts `parent_id` links, so removing a parent would
//! orphan its children. Deletion never cascades.

use crate::culture::CultureRecord;
use crate::error::{CultureError, Result};
use crate::storage::CultureStore;
use log::{info, warn};

/// Names of the cultures that currently point at `id` as their parent
pub fn blocking_children(store: &CultureStore, id: &str) -> Vec<String> {
    store
        .all()
        .iter()
        .filter(|r| r.parent_id.as_deref() == Some(id))
        .map(|r| r.display_name().to_string())
        .collect()
}

/// Remove a childless culture and persist; returns the removed record
pub fn delete_culture(store: &mut CultureStore, id: &str) -> Result<CultureRecord> {
    let children = blocking_children(store, id);
    if !children.is_empty() {
        warn!("Refusing to delete {}: children {:?}", id, children);
        return Err(CultureError::HasChildren {
            id: id.to_string(),
            children,
        });
    }

    let removed = store.take(id).ok_or_else(|| CultureError::not_found(id))?;
    info!("Deleted culture {}: {}", removed.id, removed.summary());
    store.persist()?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culture::NewCulture;
    use crate::passage::{register_passage, PassageRequest};

    fn passaged_store() -> (CultureStore, String, String) {
        let mut store = CultureStore::in_memory();
        let root = store.create(NewCulture::root("HeLa", "stock", 5, 500_000)).unwrap();
        let child = register_passage(
            &mut store,
            &PassageRequest::new(&root.id, 2_000_000, 500_000, 48.0, "P6 flask"),
        )
        .unwrap();
        (store, root.id, child.id)
    }

    #[test]
    fn test_parent_with_child_is_protected() {
        let (mut store, root, _) = passaged_store();
        let err = delete_culture(&mut store, &root).unwrap_err();
        match &err {
            CultureError::HasChildren { id, children } => {
                assert_eq!(id, &root);
                assert_eq!(children, &vec!["P6 flask".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(err.to_string().contains("P6 flask"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_leaf_is_removed() {
        let (mut store, root, child) = passaged_store();
        let removed = delete_culture(&mut store, &child).unwrap();
        assert_eq!(removed.id, child);
        assert_eq!(store.len(), 1);
        assert!(store.find(&child).is_none());

        // now the root is childless
        delete_culture(&mut store, &root).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_id() {
        let (mut store, _, _) = passaged_store();
        assert!(matches!(
            delete_culture(&mut store, "nope"),
            Err(CultureError::NotFound { .. })
        ));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_unlabelled_child_named_by_id() {
        let (mut store, _, child) = passaged_store();
        let grandchild = register_passage(
            &mut store,
            &PassageRequest::new(&child, 1_000_000, 500_000, 48.0, ""),
        )
        .unwrap();
        assert_eq!(blocking_children(&store, &child), vec![grandchild.id]);
    }

    #[test]
    fn test_deletion_is_persisted() {
        let path = std::env::temp_dir()
            .join(format!("cellline-guard-test-{}.json", uuid::Uuid::new_v4()));
        let (mut store, _) = CultureStore::open(&path);
        let a = store.create(NewCulture::root("HeLa", "a", 0, 1000)).unwrap();
        store.create(NewCulture::root("HeLa", "b", 0, 1000)).unwrap();
        delete_culture(&mut store, &a.id).unwrap();

        let (reloaded, _) = CultureStore::open(&path);
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.find(&a.id).is_none());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_save_failure_keeps_deletion_in_memory() {
        let dir = std::env::temp_dir().join(format!("cellline-guard-test-{}", uuid::Uuid::new_v4()));
        // parent directory never created, so every write fails
        let (mut store, _) = CultureStore::open(dir.join("cells.json"));
        assert!(store.create(NewCulture::root("HeLa", "a", 0, 1000)).is_err());
        assert!(store.create(NewCulture::root("HeLa", "b", 0, 1000)).is_err());
        let id = store.all()[0].id.clone();

        let err = delete_culture(&mut store, &id).unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(store.len(), 1);
        assert!(store.find(&id).is_none());
        assert_eq!(store.all()[0].label, "b");
    }
}
