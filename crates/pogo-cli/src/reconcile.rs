//! Merges freshly extracted candidates into the persisted store.
//!
//! Only candidates with a well-formed friend code that is not yet stored are
//! persisted. Failures are isolated per candidate: a store or QR error for
//! one record is logged and counted, and the batch carries on.

use std::collections::HashSet;

use chrono::NaiveDate;
use pogo_core::FriendRecord;
use pogo_qr::CodeImager;
use pogo_store::RecordStore;

/// Per-batch tallies. `persisted` is the number of rows actually appended.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReconcileSummary {
    pub persisted: usize,
    pub known: usize,
    pub invalid: usize,
    pub store_failures: usize,
    pub qr_failures: usize,
}

/// Appends every genuinely new candidate to `store`, stamping it with
/// `today`, and emits a QR image for it when `imager` is set.
///
/// The existing codes are loaded once. If they cannot be read the batch is
/// reconciled against an empty set: duplicates may then be re-appended, which
/// is accepted in exchange for never stalling collection.
pub(crate) fn reconcile(
    store: &dyn RecordStore,
    imager: Option<&dyn CodeImager>,
    candidates: Vec<FriendRecord>,
    today: NaiveDate,
) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();

    let mut seen: HashSet<String> = match store.all_codes() {
        Ok(codes) => codes,
        Err(e) => {
            tracing::warn!(error = %e, "could not read store — treating it as empty");
            HashSet::new()
        }
    };

    for candidate in candidates {
        if !candidate.has_valid_code() {
            tracing::debug!(
                name = %candidate.name,
                code = %candidate.code,
                "skipping candidate without a well-formed friend code"
            );
            summary.invalid += 1;
            continue;
        }

        if seen.contains(&candidate.code) {
            summary.known += 1;
            continue;
        }

        let stamped = candidate.stamp(today);
        if let Err(e) = store.append(&stamped) {
            tracing::error!(
                code = %stamped.record.code,
                error = %e,
                "failed to persist friend record"
            );
            summary.store_failures += 1;
            continue;
        }

        let record = &stamped.record;
        seen.insert(record.code.clone());
        summary.persisted += 1;
        println!(
            "  + {} (Level {}) from {}",
            record.name, record.level, record.location
        );

        if let Some(imager) = imager {
            match imager.emit(&record.code, &record.name) {
                Ok(path) => {
                    tracing::debug!(code = %record.code, path = %path.display(), "QR emitted");
                }
                Err(e) => {
                    tracing::warn!(
                        code = %record.code,
                        name = %record.name,
                        error = %e,
                        "failed to write QR image — record kept"
                    );
                    summary.qr_failures += 1;
                }
            }
        }
    }

    summary
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
