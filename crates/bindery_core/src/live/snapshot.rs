//! Observed result set snapshots.
//!
//! # Responsibility
//! - Hold one ordered, sectioned generation of a live query's matches.
//! - Answer position-based reads without touching the store.
//!
//! # Invariants
//! - An unsectioned snapshot always has exactly one unnamed section, even
//!   when it holds no rows.
//! - Sectioned grouping is contiguous: the query's sort order must cluster
//!   equal section keys together.

use crate::live::query::LiveRow;

/// Position of one row: section ordinal plus row ordinal within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowIndex {
    pub section: usize,
    pub row: usize,
}

impl RowIndex {
    pub fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }
}

/// One section of the result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<R> {
    /// Grouping key; `None` for the single section of unsectioned queries.
    pub name: Option<String>,
    pub rows: Vec<R>,
}

/// Read model describing one section without exposing its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionInfo {
    pub name: Option<String>,
    pub row_count: usize,
}

/// One generation of the observed result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<R> {
    sections: Vec<Section<R>>,
}

impl<R: LiveRow> Snapshot<R> {
    /// Groups fetched rows into sections.
    ///
    /// Rows arrive in query order; runs of equal section key become one
    /// section each. An empty result set or an all-`None` keying collapses
    /// to the single unnamed section.
    pub(crate) fn build(rows: Vec<R>, section_key: impl Fn(&R) -> Option<String>) -> Self {
        let mut sections: Vec<Section<R>> = Vec::new();

        for row in rows {
            let key = section_key(&row);
            match sections.last_mut() {
                Some(section) if section.name == key => section.rows.push(row),
                _ => sections.push(Section {
                    name: key,
                    rows: vec![row],
                }),
            }
        }

        if sections.is_empty() {
            sections.push(Section {
                name: None,
                rows: Vec::new(),
            });
        }

        Self { sections }
    }

    pub fn sections(&self) -> &[Section<R>] {
        &self.sections
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn row_count(&self, section: usize) -> usize {
        self.sections.get(section).map_or(0, |s| s.rows.len())
    }

    pub fn section_info(&self, section: usize) -> Option<SectionInfo> {
        self.sections.get(section).map(|s| SectionInfo {
            name: s.name.clone(),
            row_count: s.rows.len(),
        })
    }

    pub fn row(&self, at: RowIndex) -> Option<&R> {
        self.sections.get(at.section)?.rows.get(at.row)
    }

    pub fn total_rows(&self) -> usize {
        self.sections.iter().map(|s| s.rows.len()).sum()
    }

    /// Rows in flat order with their positions.
    pub fn iter_positions(&self) -> impl Iterator<Item = (RowIndex, &R)> {
        self.sections
            .iter()
            .enumerate()
            .flat_map(|(section, s)| {
                s.rows
                    .iter()
                    .enumerate()
                    .map(move |(row, value)| (RowIndex::new(section, row), value))
            })
    }
}
