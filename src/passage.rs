//! Passage — harvest a parent culture and seed its child
//!
//! 1. Look up the parent (no mutation if absent)
//! 2. Derive PDL and doubling time from the parent's seeding and the harvest
//! 3. Record the harvest on the parent
//! 4. Create the child carrying the cumulative PDL
//! 5. Persist both in one document rewrite

use crate::culture::{CultureRecord, NewCulture};
use crate::error::{CultureError, Result};
use crate::growth::GrowthMetrics;
use crate::storage::CultureStore;
use log::info;

/// Harvest data for a parent plus seeding data for the child
#[derive(Debug, Clone, PartialEq)]
pub struct PassageRequest {
    pub parent_id: String,
    pub harvested_count: u64,
    pub next_seeded_count: u64,
    /// Incubation time of the parent culture
    pub hours: f64,
    pub child_label: String,
}

impl PassageRequest {
    pub fn new(
        parent_id: impl Into<String>,
        harvested_count: u64,
        next_seeded_count: u64,
        hours: f64,
        child_label: impl Into<String>,
    ) -> Self {
        Self {
            parent_id: parent_id.into(),
            harvested_count,
            next_seeded_count,
            hours,
            child_label: child_label.into(),
        }
    }
}

/// Passage a culture; returns the new child record
pub fn register_passage(store: &mut CultureStore, request: &PassageRequest) -> Result<CultureRecord> {
    let parent = store
        .find_mut(&request.parent_id)
        .ok_or_else(|| CultureError::not_found(&request.parent_id))?;
    let next_passage = parent.passage.checked_add(1).ok_or_else(|| CultureError::PassageLimit {
        id: parent.id.clone(),
        passage: parent.passage,
    })?;

    let metrics = GrowthMetrics::derive(
        parent.seeded_count,
        request.harvested_count,
        parent.pdl,
        request.hours,
    );
    parent.harvested_count = Some(request.harvested_count);
    parent.doubling_time = metrics.doubling_time;

    let fields = NewCulture {
        cell_type: parent.cell_type.clone(),
        label: request.child_label.clone(),
        passage: next_passage,
        seeded_count: request.next_seeded_count,
        parent_id: Some(parent.id.clone()),
        pdl: metrics.cumulative_pdl,
    };
    let child = store.stage(fields);

    info!(
        "Passaged {} -> {} (P{}): +{:.3} PDL, cumulative {:.3}, doubling time {}",
        request.parent_id,
        child.id,
        child.passage,
        metrics.delta_pdl,
        metrics.cumulative_pdl,
        metrics
            .doubling_time
            .map(|h| format!("{:.2}h", h))
            .unwrap_or_else(|| "undefined".into()),
    );

    store.persist()?;
    Ok(child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culture::CultureStatus;
    use crate::storage::LoadReport;
    use std::collections::HashSet;

    #[test]
    fn test_hela_passage_end_to_end() {
        let mut store = CultureStore::in_memory();
        let a = store.create(NewCulture::root("HeLa", "P5", 5, 500_000)).unwrap();

        let b = register_passage(
            &mut store,
            &PassageRequest::new(&a.id, 2_000_000, 500_000, 48.0, "P6"),
        )
        .unwrap();

        assert!((b.pdl - 2.0).abs() < 1e-3);
        assert_eq!(b.passage, 6);
        assert_eq!(b.parent_id.as_deref(), Some(a.id.as_str()));
        assert_eq!(b.cell_type, "HeLa");
        assert_eq!(b.label, "P6");
        assert_eq!(b.seeded_count, 500_000);
        assert_eq!(b.harvested_count, None);
        assert_eq!(b.doubling_time, None);

        let parent = store.find(&a.id).unwrap();
        assert_eq!(parent.harvested_count, Some(2_000_000));
        assert!((parent.doubling_time.unwrap() - 24.0).abs() < 0.01);
        assert_eq!(parent.status, CultureStatus::Active);
        assert_eq!(parent.pdl, 0.0);
    }

    #[test]
    fn test_missing_parent_changes_nothing() {
        let mut store = CultureStore::in_memory();
        store.create(NewCulture::root("HeLa", "", 0, 1000)).unwrap();
        let before = store.all().to_vec();

        let err = register_passage(
            &mut store,
            &PassageRequest::new("ghost", 2_000_000, 500_000, 48.0, ""),
        )
        .unwrap_err();
        assert!(matches!(err, CultureError::NotFound { ref id } if id == "ghost"));
        assert_eq!(store.all(), before.as_slice());
    }

    #[test]
    fn test_pdl_accumulates_over_generations() {
        let mut store = CultureStore::in_memory();
        let mut current = store.create(NewCulture::root("CHO", "", 0, 250_000)).unwrap();
        for _ in 0..4 {
            // eightfold expansion each time: ~3 doublings
            current = register_passage(
                &mut store,
                &PassageRequest::new(&current.id, 2_000_000, 250_000, 72.0, ""),
            )
            .unwrap();
        }
        assert_eq!(current.passage, 4);
        assert!((current.pdl - 12.0).abs() < 0.01);

        let chain = store.index().ancestors_of(&current.id);
        let pdls: Vec<f64> = chain.iter().rev().map(|r| r.pdl).collect();
        assert!(pdls.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_no_growth_keeps_pdl() {
        let mut store = CultureStore::in_memory();
        let a = store.create(NewCulture::root("HeLa", "", 1, 500_000)).unwrap();
        let b = register_passage(&mut store, &PassageRequest::new(&a.id, 0, 500_000, 48.0, "")).unwrap();
        assert_eq!(b.pdl, 0.0);
        let parent = store.find(&a.id).unwrap();
        assert_eq!(parent.harvested_count, Some(0));
        assert_eq!(parent.doubling_time, None);
    }

    #[test]
    fn test_branching_lineage() {
        let mut store = CultureStore::in_memory();
        let root = store.create(NewCulture::root("HEK293T", "stock", 2, 1_000_000)).unwrap();
        let left = register_passage(&mut store, &PassageRequest::new(&root.id, 4_000_000, 1_000_000, 48.0, "L")).unwrap();
        let right = register_passage(&mut store, &PassageRequest::new(&root.id, 4_000_000, 1_000_000, 48.0, "R")).unwrap();
        let left2 = register_passage(&mut store, &PassageRequest::new(&left.id, 2_000_000, 1_000_000, 24.0, "L2")).unwrap();
        store.create(NewCulture::root("CHO", "other", 0, 1000)).unwrap();

        let index = store.index();
        let lineage = index.lineage_of(&root.id);
        let order: Vec<&str> = lineage.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, vec![root.id.as_str(), left.id.as_str(), left2.id.as_str(), right.id.as_str()]);
        let unique: HashSet<&str> = order.iter().copied().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_passage_persists_parent_and_child_together() {
        let path = std::env::temp_dir()
            .join(format!("cellline-passage-test-{}.json", uuid::Uuid::new_v4()));
        let (mut store, _) = CultureStore::open(&path);
        let a = store.create(NewCulture::root("HeLa", "P5", 5, 500_000)).unwrap();
        let b = register_passage(&mut store, &PassageRequest::new(&a.id, 2_000_000, 500_000, 48.0, "P6")).unwrap();

        let (reloaded, report) = CultureStore::open(&path);
        assert!(matches!(report, LoadReport::Loaded { count: 2 }));
        assert_eq!(reloaded.find(&a.id).unwrap().harvested_count, Some(2_000_000));
        assert_eq!(reloaded.find(&b.id), Some(&b));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_last_representable_passage_is_refused() {
        let mut store = CultureStore::in_memory();
        let a = store.create(NewCulture::root("HeLa", "", u32::MAX, 500_000)).unwrap();
        let before = store.all().to_vec();

        let err = register_passage(&mut store, &PassageRequest::new(&a.id, 2_000_000, 500_000, 48.0, "")).unwrap_err();
        assert!(matches!(err, CultureError::PassageLimit { passage, .. } if passage == u32::MAX));
        assert_eq!(store.all(), before.as_slice());
    }

    #[test]
    fn test_unbounded_hours_reload_unchanged() {
        let path = std::env::temp_dir()
            .join(format!("cellline-passage-test-{}.json", uuid::Uuid::new_v4()));
        let (mut store, _) = CultureStore::open(&path);
        let a = store.create(NewCulture::root("HeLa", "", 5, 500_000)).unwrap();
        register_passage(&mut store, &PassageRequest::new(&a.id, 2_000_000, 500_000, f64::INFINITY, "")).unwrap();
        assert_eq!(store.find(&a.id).unwrap().doubling_time, None);

        let (reloaded, _) = CultureStore::open(&path);
        assert_eq!(reloaded.all(), store.all());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_save_failure_keeps_passage_in_memory() {
        let dir = std::env::temp_dir().join(format!("cellline-passage-test-{}", uuid::Uuid::new_v4()));
        // parent directory never created, so every write fails
        let (mut store, _) = CultureStore::open(dir.join("cells.json"));
        assert!(store.create(NewCulture::root("HeLa", "P5", 5, 500_000)).is_err());
        let parent_id = store.all()[0].id.clone();

        let err = register_passage(&mut store, &PassageRequest::new(&parent_id, 2_000_000, 500_000, 48.0, "P6")).unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(store.len(), 2);
        assert_eq!(store.find(&parent_id).unwrap().harvested_count, Some(2_000_000));
        let child = &store.all()[1];
        assert_eq!(child.parent_id.as_deref(), Some(parent_id.as_str()));
        assert_eq!(child.passage, 6);
    }
}
