//! Lineage index — descendant trees and ancestor chains over culture records
//!
//! The index is a snapshot of the collection: a `parent_id -> children`
//! adjacency in insertion order plus an id lookup. Traversals use an explicit
//! worklist and a visited set, so a malformed document with a parent cycle
//! still terminates and yields every record at most once.

use super::CultureRecord;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A directed parent -> child edge for graph renderers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageEdge {
    pub parent_id: String,
    pub child_id: String,
}

pub struct LineageIndex<'a> {
    records: &'a [CultureRecord],
    by_id: HashMap<&'a str, usize>,
    children: HashMap<&'a str, Vec<usize>>,
}

impl<'a> LineageIndex<'a> {
    pub fn build(records: &'a [CultureRecord]) -> Self {
        let mut by_id = HashMap::with_capacity(records.len());
        let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
        for (pos, record) in records.iter().enumerate() {
            by_id.entry(record.id.as_str()).or_insert(pos);
            if let Some(parent) = record.parent_id.as_deref() {
                children.entry(parent).or_default().push(pos);
            }
        }
        Self { records, by_id, children }
    }

    pub fn get(&self, id: &str) -> Option<&'a CultureRecord> {
        self.by_id.get(id).map(|&pos| &self.records[pos])
    }

    /// Direct children in insertion order
    pub fn children_of(&self, id: &str) -> Vec<&'a CultureRecord> {
        self.children
            .get(id)
            .map(|kids| kids.iter().map(|&pos| &self.records[pos]).collect())
            .unwrap_or_default()
    }

    pub fn has_children(&self, id: &str) -> bool {
        self.children.get(id).is_some_and(|kids| !kids.is_empty())
    }

    /// Founding cultures in insertion order
    pub fn roots(&self) -> Vec<&'a CultureRecord> {
        self.records.iter().filter(|r| r.is_root()).collect()
    }

    /// The root followed by all of its transitive descendants, depth-first.
    ///
    /// Siblings are visited in insertion order and each subtree is emitted
    /// before the next sibling. Unknown roots give an empty sequence.
    pub fn lineage_of(&self, root_id: &str) -> Vec<&'a CultureRecord> {
        let Some(&root) = self.by_id.get(root_id) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(pos) = stack.pop() {
            if !visited.insert(pos) {
                continue;
            }
            let record = &self.records[pos];
            out.push(record);
            if let Some(kids) = self.children.get(record.id.as_str()) {
                // reversed so the first-inserted child is popped first
                stack.extend(kids.iter().rev().filter(|k| !visited.contains(*k)));
            }
        }
        out
    }

    /// The record itself, then its parent, and so on up to the root
    pub fn ancestors_of(&self, id: &str) -> Vec<&'a CultureRecord> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = self.by_id.get(id).copied();
        while let Some(pos) = cursor {
            if !visited.insert(pos) {
                break;
            }
            let record = &self.records[pos];
            out.push(record);
            cursor = record
                .parent_id
                .as_deref()
                .and_then(|parent| self.by_id.get(parent).copied());
        }
        out
    }
}

/// Edges among the given records; parents outside the sequence are left out
pub fn edges(records: &[&CultureRecord]) -> Vec<LineageEdge> {
    let present: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
    records
        .iter()
        .filter_map(|r| {
            let parent = r.parent_id.as_deref()?;
            present.contains(parent).then(|| LineageEdge {
                parent_id: parent.to_string(),
                child_id: r.id.clone(),
            })
        })
        .collect()
}
