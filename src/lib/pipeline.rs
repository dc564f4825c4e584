//! # Family preparation
//!
//! Runs the whole batch: count files are parsed, re-sequenced replicates
//! merged, hybrids grouped with their parents and each family written to
//! the output folder. A bad file, an incomplete family or a sample table
//! which cannot be written is reported and skipped; only problems with the
//! output folder abort the run.

use std::fs;
use std::path::{Path, PathBuf};
use log::{info, warn};

use crate::lib::common::{CrossScheme, SampleRecord, VersionInfo};
use crate::lib::errors::{HeterosisError, Result};
use crate::lib::family::group_families;
use crate::lib::matrix::{write_family, write_sample_table};
use crate::lib::merge::merge_replicates;
use crate::lib::sample::parse_sample;

#[derive(Debug, Clone, Copy)]
pub struct PrepareConfig<'a> {
    /// folder receiving the family matrices, created if absent
    pub families: &'a Path,
    pub scheme: &'a CrossScheme,
    /// optional table listing every merged sample
    pub sample_table: Option<&'a Path>,
    pub infos: VersionInfo<'a>,
}

#[derive(Debug, Default)]
pub struct PrepareReport {
    /// files parsed successfully
    pub parsed: usize,
    /// samples left after merging replicates
    pub samples: usize,
    /// keys of the families written, e.g. `L-F18`
    pub written: Vec<String>,
    /// everything that was reported and skipped
    pub failures: Vec<HeterosisError>,
}

impl PrepareReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parses all files, collecting the failures instead of stopping at the first one.
pub fn parse_all(
    files: &[PathBuf],
    scheme: &CrossScheme,
    failures: &mut Vec<HeterosisError>
) -> Vec<SampleRecord> {
    let mut records: Vec<SampleRecord> = Vec::with_capacity(files.len());
    for file in files {
        match parse_sample(file, scheme) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("skipping {:?}: {}", file, e);
                failures.push(e);
            }
        }
    }
    records
}

/// Parses, merges, groups and writes all families found in `files`.
///
/// Unittest: TRUE
///
pub fn prepare(
    files: &[PathBuf],
    config: &PrepareConfig<'_>
) -> Result<PrepareReport> {
    fs::create_dir_all(config.families).map_err(|e| HeterosisError::io(config.families, e))?;

    let mut report = PrepareReport::default();
    let records = parse_all(files, config.scheme, &mut report.failures);
    report.parsed = records.len();
    info!("Parsed {} of {} count files", report.parsed, files.len());

    let merged = merge_replicates(records);
    report.failures.extend(merged.failures);
    let samples = merged.samples;
    report.samples = samples.len();
    info!("{} samples after merging replicates", report.samples);

    if let Some(table) = config.sample_table {
        match write_sample_table(&samples, table, &config.infos) {
            Ok(()) => info!("Sample table written to {:?}", table),
            Err(e) => {
                warn!("sample table not written: {}", e);
                report.failures.push(e);
            }
        }
    }

    let grouped = group_families(&samples);
    report.failures.extend(grouped.failures);
    for family in grouped.families.iter() {
        match write_family(family, config.families) {
            Ok(_) => report.written.push(family.key.clone()),
            Err(e) => {
                warn!("family {} not written: {}", family.key, e);
                report.failures.push(e);
            }
        }
    }
    info!(
        "{} families written to {:?}, {} problems reported",
        report.written.len(),
        config.families,
        report.failures.len()
    );
    Ok(report)
}
