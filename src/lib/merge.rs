//! # Replicate merging
//!
//! Some samples were sequenced in several batches. Their count files share
//! tissue, individual and replicate and are summed into one record.

use itertools::Itertools;
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::lib::common::{Role, SampleRecord};
use crate::lib::errors::{HeterosisError, Result};

#[derive(Debug, Default)]
pub struct MergeOutcome {
    /// surviving records, ordered by (tissue, individual) then merge order
    pub samples: Vec<SampleRecord>,
    /// pairs which could not be merged, both records were kept
    pub failures: Vec<HeterosisError>,
}

/// the key deciding whether two records of one individual are the same sample
fn merge_key(record: &SampleRecord) -> (Role, &str) {
    (record.role, record.replicate.as_str())
}

fn inconsistent(into: &SampleRecord, other: &SampleRecord, reason: String) -> HeterosisError {
    HeterosisError::InconsistentMerge {
        first: into.source_display(),
        second: other.source_display(),
        reason,
    }
}

/// Adds the counts of `other` to `into` and appends its source files.
/// Both records have to describe the identical sample over identical genes,
/// otherwise nothing is changed.
///
/// Unittest: TRUE
///
pub fn merge_into(
    into: &mut SampleRecord,
    other: &SampleRecord
) -> Result<()> {
    let identity = [
        ("tissue", into.tissue == other.tissue),
        ("individual", into.individual == other.individual),
        ("replicate", into.replicate == other.replicate),
        ("role", into.role == other.role),
        ("family", into.family_id == other.family_id),
        ("parent1", into.parent1_code == other.parent1_code),
        ("parent2", into.parent2_code == other.parent2_code),
    ];
    if let Some((field, _)) = identity.iter().find(|(_, same)| !same) {
        return Err(inconsistent(into, other, format!("{} differs", field)));
    }
    if into.gene_ids != other.gene_ids || into.counts.len() != other.counts.len() {
        return Err(inconsistent(into, other, String::from("gene ids differ")));
    }
    let mut summed: Vec<i64> = Vec::with_capacity(into.counts.len());
    for (row, (a, b)) in into.counts.iter().zip(other.counts.iter()).enumerate() {
        match a.checked_add(*b) {
            Some(x) => summed.push(x),
            None => {
                let reason = format!("count of gene {} overflows", into.gene_ids[row]);
                return Err(inconsistent(into, other, reason));
            }
        }
    }
    debug!("Merge '{}' and '{}'", into.source_display(), other.source_display());
    into.counts = summed;
    into.source_paths.extend(other.source_paths.iter().cloned());
    Ok(())
}

/// Merges duplicate sequencing runs. Records are grouped by
/// (tissue, individual), sorted by (role, replicate) within the group and every
/// later record with the same key is absorbed by the first one.
/// The input is consumed, absorbed records do not appear in the output.
///
/// Unittest: TRUE
///
pub fn merge_replicates(
    records: Vec<SampleRecord>
) -> MergeOutcome {
    let mut groups: FxHashMap<(char, String), Vec<SampleRecord>> = FxHashMap::default();
    for record in records {
        groups
            .entry((record.tissue, record.individual.clone()))
            .or_default()
            .push(record);
    }

    let mut outcome = MergeOutcome::default();
    for (_, mut group) in groups.into_iter().sorted_by(|a, b| a.0.cmp(&b.0)) {
        // stable, so equal keys keep their input order
        group.sort_by(|a, b| merge_key(a).cmp(&merge_key(b)));
        let mut slots: Vec<Option<SampleRecord>> = group.into_iter().map(Some).collect();
        for i in 0..slots.len() {
            let mut current = match slots[i].take() {
                Some(x) => x,
                None => continue,
            };
            for slot in slots.iter_mut().skip(i + 1) {
                let absorbed = match slot {
                    Some(other) if merge_key(other) == merge_key(&current) => {
                        match merge_into(&mut current, other) {
                            Ok(()) => true,
                            Err(e) => {
                                warn!("{}", e);
                                outcome.failures.push(e);
                                false
                            }
                        }
                    }
                    _ => false,
                };
                if absorbed {
                    *slot = None;
                }
            }
            outcome.samples.push(current);
        }
    }
    outcome
}
