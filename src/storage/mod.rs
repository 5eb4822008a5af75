pub mod sheet;

use crate::error::StoreError;
use crate::models::Listing;
use crate::pipeline::dedup::Deduplicator;
use std::path::Path;
use tracing::{info, warn};

pub use self::sheet::{COLUMNS, Column, CsvSheet, TabularStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub rows: Vec<Listing>,
    pub existing: usize,
    pub added: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub existing: usize,
    pub added: usize,
    pub total: usize,
}

// ── Result store ──────────────────────────────────────────────────────────────

/// Merges freshly collected listings into the output file.
pub struct ResultStore<T: TabularStore = CsvSheet> {
    sheet: T,
}

impl<T: TabularStore> ResultStore<T> {
    pub fn new(sheet: T) -> Self {
        Self { sheet }
    }

    /// Previously stored rows, unreadable files count as empty.
    pub fn load(&self, path: &Path) -> Vec<Listing> {
        match self.sheet.read_all_rows(path) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("{}; continuing without previous listings", e);
                Vec::new()
            }
        }
    }

    /// Existing rows first in stored order, then new rows whose URL is not
    /// stored yet, in collection order. Stored rows without a URL are kept
    /// but never match anything.
    pub fn merge(&self, new_rows: &[Listing], path: &Path) -> Merged {
        let existing = self.load(path);
        if !existing.is_empty() {
            info!("📊 {} listings already stored", existing.len());
        }

        let mut seen = Deduplicator::with_persisted(
            existing
                .iter()
                .filter(|r| !r.url.is_empty())
                .map(|r| r.url.clone()),
        );
        let fresh: Vec<Listing> = new_rows
            .iter()
            .filter(|r| seen.add(r.url.as_str()))
            .cloned()
            .collect();
        info!("📊 {} of {} collected listings are new", fresh.len(), new_rows.len());

        let existing_count = existing.len();
        let added = fresh.len();
        let mut rows = existing;
        rows.extend(fresh);
        Merged {
            rows,
            existing: existing_count,
            added,
        }
    }

    pub fn persist(&self, rows: &[Listing], path: &Path) -> Result<(), StoreError> {
        self.sheet.write_all_rows(path, rows, &COLUMNS)
    }

    pub fn save(&self, new_rows: &[Listing], path: &Path) -> Result<MergeOutcome, StoreError> {
        let merged = self.merge(new_rows, path);
        self.persist(&merged.rows, path)?;

        let outcome = MergeOutcome {
            existing: merged.existing,
            added: merged.added,
            total: merged.rows.len(),
        };
        info!(
            "💾 Exported {} listings ({} new + {} existing) to {:?}",
            outcome.total, outcome.added, outcome.existing, path
        );
        Ok(outcome)
    }
}

impl Default for ResultStore<CsvSheet> {
    fn default() -> Self {
        Self::new(CsvSheet)
    }
}
