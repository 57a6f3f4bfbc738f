use std::borrow::Cow;

use rusqlite::Connection;
use thoughtlocker::PromptSpec;

use crate::transaction::in_transaction;
use crate::{StoreError, repository};

/// Summary of a bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub created: u64,
    pub updated: u64,
    /// Specs whose checksum matched the stored one and were left alone.
    pub unchanged: u64,
}

/// Apply a batch of specs in a single transaction.
///
/// New names are inserted, names whose checksum differs are updated, and
/// names with a matching checksum are skipped without a new version row.
/// Any error rolls back the whole batch.
pub fn apply_specs(conn: &mut Connection, specs: &[PromptSpec]) -> Result<LoadReport, StoreError> {
    in_transaction(conn, |tx| {
        let mut report = LoadReport::default();

        for spec in specs {
            let spec = with_checksum(spec);

            match repository::get_by_name(tx, &spec.name)? {
                None => {
                    repository::upsert(tx, &spec)?;
                    report.created += 1;
                }
                Some(existing) if existing.checksum != spec.checksum => {
                    repository::upsert(tx, &spec)?;
                    report.updated += 1;
                }
                Some(_) => {
                    tracing::info!(name = %spec.name, "no change");
                    report.unchanged += 1;
                }
            }
        }

        Ok(report)
    })
}

fn with_checksum(spec: &PromptSpec) -> Cow<'_, PromptSpec> {
    if spec.checksum.is_some() {
        return Cow::Borrowed(spec);
    }

    let mut owned = spec.clone();
    owned.checksum = Some(spec.compute_checksum());
    Cow::Owned(owned)
}
