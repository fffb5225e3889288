//! Result-set diffing: two snapshot generations in, one view batch out.
//!
//! # Responsibility
//! - Translate a result-set change into the minimal ordered set of
//!   section/row operations a view can apply atomically.
//!
//! # Invariants
//! - Section operations precede row operations within a batch.
//! - Row emission order is: deletes (old coordinates), inserts (new
//!   coordinates), moves (old to new), updates (old coordinates).
//! - A row whose relative order survived is never reported as a move, even
//!   when neighbors shifted its absolute position.
//! - A reorder is exactly one move operation, never a delete+insert pair.
//!
//! Rows inside an inserted section are emitted as row inserts after the
//! section insert; rows of a deleted section are dropped with it, without
//! individual row deletes.

use crate::live::query::LiveRow;
use crate::live::snapshot::{RowIndex, Snapshot};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// One row-level view operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowChange {
    /// New row at its position in the new result set.
    Insert { new: RowIndex },
    /// Row removed, positioned in the old result set.
    Delete { old: RowIndex },
    /// In-place payload change, position unchanged.
    Update { old: RowIndex },
    /// Position changed by a sort-order change.
    Move { old: RowIndex, new: RowIndex },
}

/// One section-level view operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionChange {
    Insert { index: usize },
    Delete { index: usize },
}

/// The ordered operations of one change batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDiff {
    pub sections: Vec<SectionChange>,
    pub rows: Vec<RowChange>,
}

impl BatchDiff {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.rows.is_empty()
    }
}

/// Computes the view batch that transforms `old` into `new`.
pub fn diff_snapshots<R: LiveRow>(old: &Snapshot<R>, new: &Snapshot<R>) -> BatchDiff {
    let mut batch = BatchDiff::default();

    let old_keys: HashSet<&Option<String>> =
        old.sections().iter().map(|section| &section.name).collect();
    let new_keys: HashSet<&Option<String>> =
        new.sections().iter().map(|section| &section.name).collect();

    let mut surviving_old_sections = HashSet::new();
    for (index, section) in old.sections().iter().enumerate() {
        if new_keys.contains(&section.name) {
            surviving_old_sections.insert(index);
        } else {
            batch.sections.push(SectionChange::Delete { index });
        }
    }
    for (index, section) in new.sections().iter().enumerate() {
        if !old_keys.contains(&section.name) {
            batch.sections.push(SectionChange::Insert { index });
        }
    }

    // Flat-ordered row tables; rows of deleted sections drop with them.
    let old_rows: Vec<(Uuid, RowIndex, &R)> = old
        .iter_positions()
        .filter(|(at, _)| surviving_old_sections.contains(&at.section))
        .map(|(at, row)| (row.row_id(), at, row))
        .collect();
    let new_rows: Vec<(Uuid, RowIndex, &R)> = new
        .iter_positions()
        .map(|(at, row)| (row.row_id(), at, row))
        .collect();

    let old_by_id: HashMap<Uuid, usize> = old_rows
        .iter()
        .enumerate()
        .map(|(flat, (id, _, _))| (*id, flat))
        .collect();
    let new_by_id: HashMap<Uuid, usize> = new_rows
        .iter()
        .enumerate()
        .map(|(flat, (id, _, _))| (*id, flat))
        .collect();

    for (id, at, _) in &old_rows {
        if !new_by_id.contains_key(id) {
            batch.rows.push(RowChange::Delete { old: *at });
        }
    }
    for (id, at, _) in &new_rows {
        if !old_by_id.contains_key(id) {
            batch.rows.push(RowChange::Insert { new: *at });
        }
    }

    // Survivors, in old flat order, carrying their new flat position. Rows
    // on the longest increasing run kept their relative order; everything
    // else moved.
    let survivors: Vec<(usize, usize)> = old_rows
        .iter()
        .enumerate()
        .filter_map(|(old_flat, (id, _, _))| {
            new_by_id.get(id).map(|new_flat| (old_flat, *new_flat))
        })
        .collect();
    let stable: HashSet<usize> =
        longest_increasing_run(&survivors.iter().map(|(_, n)| *n).collect::<Vec<_>>());

    let mut moves = Vec::new();
    let mut updates = Vec::new();
    for (old_flat, new_flat) in survivors {
        let (_, old_at, old_row) = old_rows[old_flat];
        let (_, new_at, new_row) = new_rows[new_flat];
        if stable.contains(&new_flat) {
            if old_row != new_row {
                updates.push(RowChange::Update { old: old_at });
            }
        } else {
            moves.push(RowChange::Move {
                old: old_at,
                new: new_at,
            });
        }
    }
    batch.rows.extend(moves);
    batch.rows.extend(updates);

    batch
}

/// Returns the values forming one longest strictly-increasing subsequence.
///
/// Input values are distinct (flat positions of distinct rows).
fn longest_increasing_run(values: &[usize]) -> HashSet<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut parent: Vec<Option<usize>> = vec![None; values.len()];

    for (i, &value) in values.iter().enumerate() {
        let pos = tails.partition_point(|&j| values[j] < value);
        if pos > 0 {
            parent[i] = Some(tails[pos - 1]);
        }
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
    }

    let mut run = HashSet::new();
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        run.insert(values[i]);
        cursor = parent[i];
    }
    run
}
