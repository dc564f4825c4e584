//! # Family grouping
//!
//! A family is a hybrid individual together with its two parents in the same
//! tissue, e.g. `LF18` with `LCS48` (recurrent parent) and `L18`.

use itertools::Itertools;
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::lib::common::{Role, SampleRecord};
use crate::lib::errors::HeterosisError;

#[derive(Debug, Clone, PartialEq)]
/// The samples written into one family matrix.
pub struct FamilyGroup<'a> {
    /// `<tissue>-<hybrid individual>`, e.g. `L-F18`
    pub key: String,
    /// parent 1 samples, then parent 2 samples, then the hybrids
    pub samples: Vec<&'a SampleRecord>,
    /// 1, 2 or 3 per sample, same order as `samples`
    pub labels: Vec<u8>,
}

impl<'a> FamilyGroup<'a> {
    /// the groups file content, e.g. `1,2,3`
    pub fn labels_line(&self) -> String {
        self.labels.iter().join(",")
    }
}

#[derive(Debug, Default)]
pub struct GroupingOutcome<'a> {
    pub families: Vec<FamilyGroup<'a>>,
    /// one `MissingParent` per skipped family
    pub failures: Vec<HeterosisError>,
}

/// Builds one family per hybrid individual and tissue. Families are returned
/// in (tissue, individual) order; within a family every sub-list keeps the
/// order of the input.
/// A family lacking one of its parents is reported and skipped.
///
/// Unittest: TRUE
///
pub fn group_families(
    samples: &[SampleRecord]
) -> GroupingOutcome<'_> {
    let mut index: FxHashMap<(char, &str), Vec<&SampleRecord>> = FxHashMap::default();
    for sample in samples {
        index
            .entry((sample.tissue, sample.individual.as_str()))
            .or_default()
            .push(sample);
    }

    let mut outcome = GroupingOutcome::default();
    for (&(tissue, individual), members) in index.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
        let hybrids: Vec<&SampleRecord> = members
            .iter()
            .copied()
            .filter(|s| s.role == Role::Hybrid)
            .collect();
        let first = match hybrids.first() {
            Some(x) => *x,
            None => continue,
        };
        let key = format!("{}-{}", tissue, individual);
        let mut parents: Vec<Vec<&SampleRecord>> = Vec::with_capacity(2);
        let wanted = [
            (Role::Parent1, first.parent1_code.as_deref()),
            (Role::Parent2, first.parent2_code.as_deref()),
        ];
        for &(role, code) in wanted.iter() {
            let code = code.unwrap_or_default();
            let found: Vec<&SampleRecord> = index
                .get(&(tissue, code))
                .map(|v| v.iter().copied().filter(|s| s.role == role).collect())
                .unwrap_or_default();
            if found.is_empty() {
                let error = HeterosisError::MissingParent {
                    family: key.clone(),
                    role,
                    code: code.to_string(),
                    tissue,
                };
                warn!("{}", error);
                outcome.failures.push(error);
                break;
            }
            parents.push(found);
        }
        if parents.len() != 2 {
            continue;
        }

        let mut family = FamilyGroup { key, samples: Vec::new(), labels: Vec::new() };
        for sample in parents.into_iter().flatten().chain(hybrids.into_iter()) {
            family.samples.push(sample);
            family.labels.push(sample.role.group_label());
        }
        debug!("Family {}: groups {}", family.key, family.labels_line());
        outcome.families.push(family);
    }
    outcome
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib::common::FamilyId;
    use std::path::PathBuf;

    fn record(tissue: char, individual: &str, replicate: &str, role: Role) -> SampleRecord {
        let (parent1_code, parent2_code, family_id) = match role {
            Role::Parent1 => (None, None, FamilyId::Recur),
            Role::Parent2 => (None, None, FamilyId::Number(individual.parse().unwrap())),
            Role::Hybrid => (
                Some(String::from(if individual.starts_with('F') { "CS48" } else { "CS66" })),
                Some(individual[1..].to_string()),
                FamilyId::Number(individual[1..].parse().unwrap()),
            ),
        };
        SampleRecord {
            source_paths: vec![PathBuf::from(format!("{}{}-{}_x.count", tissue, individual, replicate))],
            short_name: format!("{}{}-{}", tissue, individual, replicate),
            tissue,
            individual: individual.to_string(),
            replicate: replicate.to_string(),
            role,
            parent1_code,
            parent2_code,
            family_id,
            gene_ids: vec![String::from("g1")],
            counts: vec![1],
        }
    }

    fn names(family: &FamilyGroup<'_>) -> Vec<String> {
        family.samples.iter().map(|s| s.short_name.clone()).collect()
    }

    #[test]
    fn simple_trio() {
        let samples = vec![
            record('L', "F18", "1", Role::Hybrid),
            record('L', "18", "1", Role::Parent2),
            record('L', "CS48", "1", Role::Parent1),
        ];
        let outcome = group_families(&samples);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.families.len(), 1);
        let family = &outcome.families[0];
        assert_eq!(family.key, "L-F18");
        assert_eq!(names(family), vec!["LCS48-1", "L18-1", "LF18-1"]);
        assert_eq!(family.labels, vec![1, 2, 3]);
        assert_eq!(family.labels_line(), "1,2,3");
    }

    #[test]
    fn replicates_become_columns() {
        let samples = vec![
            record('L', "CS48", "1", Role::Parent1),
            record('L', "CS48", "3", Role::Parent1),
            record('L', "18", "1", Role::Parent2),
            record('L', "F18", "1", Role::Hybrid),
            record('L', "F18", "2", Role::Hybrid),
        ];
        let outcome = group_families(&samples);
        let family = &outcome.families[0];
        assert_eq!(names(family), vec!["LCS48-1", "LCS48-3", "L18-1", "LF18-1", "LF18-2"]);
        assert_eq!(family.labels, vec![1, 1, 2, 3, 3]);
        assert_eq!(family.samples.len(), family.labels.len());
        assert!(family.labels.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn tissues_are_separate() {
        let samples = vec![
            record('L', "CS48", "1", Role::Parent1),
            record('L', "18", "1", Role::Parent2),
            record('L', "F18", "1", Role::Hybrid),
            record('R', "18", "1", Role::Parent2),
            record('R', "F18", "1", Role::Hybrid),
        ];
        let outcome = group_families(&samples);
        assert_eq!(outcome.families.len(), 1);
        assert_eq!(outcome.families[0].key, "L-F18");
        assert_eq!(outcome.failures.len(), 1);
        match &outcome.failures[0] {
            HeterosisError::MissingParent { family, role, code, tissue } => {
                assert_eq!(family, "R-F18");
                assert_eq!(*role, Role::Parent1);
                assert_eq!(code, "CS48");
                assert_eq!(*tissue, 'R');
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn missing_second_parent_skips_only_that_family() {
        let samples = vec![
            record('L', "CS48", "1", Role::Parent1),
            record('L', "CS66", "1", Role::Parent1),
            record('L', "7", "1", Role::Parent2),
            record('L', "C7", "1", Role::Hybrid),
            record('L', "F18", "1", Role::Hybrid),
        ];
        let outcome = group_families(&samples);
        assert_eq!(outcome.families.len(), 1);
        assert_eq!(outcome.families[0].key, "L-C7");
        assert_eq!(names(&outcome.families[0]), vec!["LCS66-1", "L7-1", "LC7-1"]);
        assert!(matches!(
            &outcome.failures[0],
            HeterosisError::MissingParent { role: Role::Parent2, .. }
        ));
    }

    #[test]
    fn families_in_key_order() {
        let samples = vec![
            record('R', "CS48", "1", Role::Parent1),
            record('R', "2", "1", Role::Parent2),
            record('R', "F2", "1", Role::Hybrid),
            record('L', "CS48", "1", Role::Parent1),
            record('L', "2", "1", Role::Parent2),
            record('L', "F2", "1", Role::Hybrid),
        ];
        let outcome = group_families(&samples);
        let keys: Vec<&str> = outcome.families.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["L-F2", "R-F2"]);
    }
}
