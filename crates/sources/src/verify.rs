// SPDX-License-Identifier: MIT

//! Post-commit duration verification.
//!
//! Media rows with zero duration usually mean the source exported broken
//! metadata. In warn mode the count lands in the skip bucket and a
//! warning; in strict mode the run fails.

use crate::SourceError;
use airlift_catalog::Catalog;
use airlift_core::ImportResult;

/// Skip bucket recording media rows with zero duration.
pub const DURATION_ZERO_BUCKET: &str = "media_duration_zero";

/// Check imported media durations for one job.
pub async fn verify_durations(
    catalog: &Catalog,
    job_id: &str,
    strict: bool,
    result: &mut ImportResult,
) -> Result<(), SourceError> {
    let (zero, total) = catalog.media_duration_counts(job_id).await?;
    if zero == 0 {
        return Ok(());
    }
    if strict {
        return Err(SourceError::Malformed(format!(
            "{zero} of {total} imported media items have zero duration"
        )));
    }
    result
        .skipped
        .insert(DURATION_ZERO_BUCKET.to_string(), zero as u64);
    result.warn(format!(
        "{zero} of {total} imported media items have zero duration"
    ));
    tracing::warn!(job_id, zero, total, "zero-duration media detected");
    Ok(())
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
