//! # Family matrix output
//!
//! For every family two files are written into the output folder:
//!
//! ```text
//! L-F18          Gene<TAB>LCS48-1<TAB>L18-1<TAB>LF18-1 followed by one row per gene
//! L-F18.groups   1,2,3
//! ```

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use log::{debug, warn};

use crate::lib::common::{SampleRecord, VersionInfo};
use crate::lib::errors::{HeterosisError, Result};
use crate::lib::family::FamilyGroup;

fn tsv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .flexible(true)
        .from_writer(writer)
}

/// Checks that every sample of the family carries the gene ids of
/// the first sample, in the same order.
///
/// Unittest: TRUE
///
pub fn check_columns(
    family: &FamilyGroup<'_>
) -> Result<()> {
    let reference = match family.samples.first() {
        Some(x) => &x.gene_ids,
        None => return Ok(()),
    };
    for sample in family.samples.iter() {
        let same_order = sample.gene_ids.len() == reference.len()
            && sample.counts.len() == reference.len()
            && sample.gene_ids == *reference;
        if !same_order {
            let row = sample
                .gene_ids
                .iter()
                .zip(reference.iter())
                .position(|(a, b)| a != b)
                .unwrap_or_else(|| sample.gene_ids.len().min(reference.len()));
            return Err(HeterosisError::ColumnMismatch {
                family: family.key.clone(),
                sample: sample.source_display(),
                row: row + 1,
            });
        }
    }
    Ok(())
}

/// Writes the tab-separated count matrix of a family: a `Gene` column
/// followed by one column per sample.
///
/// Unittest: TRUE
///
pub fn write_matrix<W: Write>(
    family: &FamilyGroup<'_>,
    writer: W
) -> Result<()> {
    check_columns(family)?;
    let mut writer = tsv_writer(writer);
    let mut header: Vec<&str> = vec!["Gene"];
    header.extend(family.samples.iter().map(|s| s.short_name.as_str()));
    writer.write_record(&header)?;
    if let Some(first) = family.samples.first() {
        for (row, gene) in first.gene_ids.iter().enumerate() {
            let mut record: Vec<String> = Vec::with_capacity(family.samples.len() + 1);
            record.push(gene.clone());
            record.extend(family.samples.iter().map(|s| s.counts[row].to_string()));
            writer.write_record(&record)?;
        }
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// writes the comma separated group labels as a single line
pub fn write_groups<W: Write>(
    family: &FamilyGroup<'_>,
    mut writer: W
) -> io::Result<()> {
    writeln!(writer, "{}", family.labels_line())?;
    writer.flush()
}

/// the matrix and groups file of a family inside the output folder
pub fn family_paths(
    out_dir: &Path,
    key: &str
) -> (PathBuf, PathBuf) {
    (out_dir.join(key), out_dir.join(format!("{}.groups", key)))
}

/// Writes both files of a family. Nothing is written if the gene
/// columns of the samples disagree, and files already created are
/// removed again when writing fails.
///
/// Unittest: TRUE
///
pub fn write_family(
    family: &FamilyGroup<'_>,
    out_dir: &Path
) -> Result<(PathBuf, PathBuf)> {
    check_columns(family)?;
    let (matrix_path, groups_path) = family_paths(out_dir, &family.key);

    let written = write_matrix_file(family, &matrix_path)
        .and_then(|_| write_groups_file(family, &groups_path));
    if let Err(e) = written {
        for path in [&matrix_path, &groups_path].iter() {
            if path.is_file() {
                if let Err(rm) = fs::remove_file(path) {
                    warn!("could not remove incomplete {:?}: {}", path, rm);
                }
            }
        }
        return Err(e);
    }
    Ok((matrix_path, groups_path))
}

fn write_matrix_file(
    family: &FamilyGroup<'_>,
    path: &Path
) -> Result<()> {
    let matrix = File::create(path).map_err(|e| HeterosisError::io(path, e))?;
    write_matrix(family, BufWriter::new(matrix)).map_err(|e| e.at_path(path))?;
    debug!("File `{}` written (size={}).", path.display(), family.samples.len());
    Ok(())
}

fn write_groups_file(
    family: &FamilyGroup<'_>,
    path: &Path
) -> Result<()> {
    let groups = File::create(path).map_err(|e| HeterosisError::io(path, e))?;
    write_groups(family, BufWriter::new(groups)).map_err(|e| HeterosisError::io(path, e))
}

/// Writes one line per sample record (source files, tissue, label,
/// family, replicate) preceded by a few meta lines documenting the run.
///
/// Unittest: TRUE
///
pub fn write_sample_table(
    samples: &[SampleRecord],
    path: &Path,
    infos: &VersionInfo<'_>
) -> Result<()> {
    let output = File::create(path).map_err(|e| HeterosisError::io(path, e))?;
    write_samples(samples, infos, BufWriter::new(output)).map_err(|e| e.at_path(path))
}

fn write_samples<W: Write>(
    samples: &[SampleRecord],
    infos: &VersionInfo<'_>,
    writer: W
) -> Result<()> {
    let mut writer = tsv_writer(writer);
    writer.write_record(["##", infos.program, infos.version])?;
    writer.write_record(["##", "author:", infos.author])?;
    writer.write_record(["##", "command:", infos.command])?;
    writer.write_record(["#source", "tissue", "label", "family", "replicate"])?;
    for sample in samples {
        writer.write_record(&[
            sample.source_display(),
            sample.tissue.to_string(),
            sample.role.to_string(),
            sample.family_id.to_string(),
            sample.replicate.clone(),
        ])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib::common::{is_same_file, FamilyId, Role};
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    fn record(name: &str, role: Role, counts: Vec<i64>) -> SampleRecord {
        SampleRecord {
            source_paths: vec![PathBuf::from(format!("{}_x.count", name))],
            short_name: name.to_string(),
            tissue: 'L',
            individual: name[1..name.len() - 2].to_string(),
            replicate: String::from("1"),
            role,
            parent1_code: None,
            parent2_code: None,
            family_id: FamilyId::Number(18),
            gene_ids: vec![String::from("g1"), String::from("g2"), String::from("g3")],
            counts,
        }
    }

    fn trio() -> Vec<SampleRecord> {
        vec![
            record("LCS48-1", Role::Parent1, vec![1, 2, 3]),
            record("L18-1", Role::Parent2, vec![4, 5, 6]),
            record("LF18-1", Role::Hybrid, vec![7, 8, 9]),
        ]
    }

    fn family(samples: &[SampleRecord]) -> FamilyGroup<'_> {
        FamilyGroup {
            key: String::from("L-F18"),
            samples: samples.iter().collect(),
            labels: samples.iter().map(|s| s.role.group_label()).collect(),
        }
    }

    #[test]
    fn matrix_layout() {
        let samples = trio();
        let mut out: Vec<u8> = Vec::new();
        write_matrix(&family(&samples), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Gene\tLCS48-1\tL18-1\tLF18-1\ng1\t1\t4\t7\ng2\t2\t5\t8\ng3\t3\t6\t9\n"
        );
    }

    #[test]
    fn matrix_reparsed() {
        let samples = trio();
        let mut out: Vec<u8> = Vec::new();
        write_matrix(&family(&samples), &mut out).unwrap();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(out.as_slice());
        let header: Vec<String> = reader.headers().unwrap().iter().map(|x| x.to_string()).collect();
        let mut parsed: HashMap<(String, String), i64> = HashMap::new();
        for row in reader.records() {
            let row = row.unwrap();
            for (col, name) in header.iter().enumerate().skip(1) {
                parsed.insert((name.clone(), row[0].to_string()), row[col].parse().unwrap());
            }
        }
        for sample in samples.iter() {
            for (gene, count) in sample.gene_ids.iter().zip(sample.counts.iter()) {
                assert_eq!(parsed[&(sample.short_name.clone(), gene.clone())], *count);
            }
        }
    }

    #[test]
    fn groups_line() {
        let samples = trio();
        let mut out: Vec<u8> = Vec::new();
        write_groups(&family(&samples), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1,2,3\n");
    }

    #[test]
    fn column_mismatch() {
        let mut samples = trio();
        samples[1].gene_ids.swap(1, 2);
        match check_columns(&family(&samples)) {
            Err(HeterosisError::ColumnMismatch { family, sample, row }) => {
                assert_eq!(family, "L-F18");
                assert_eq!(sample, "L18-1_x.count");
                assert_eq!(row, 2);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn column_mismatch_shorter() {
        let mut samples = trio();
        samples[2].gene_ids.pop();
        samples[2].counts.pop();
        assert!(matches!(
            check_columns(&family(&samples)),
            Err(HeterosisError::ColumnMismatch { row: 3, .. })
        ));
    }

    #[test]
    fn family_files() {
        let dir = tempdir().unwrap();
        let samples = trio();
        let (matrix, groups) = write_family(&family(&samples), dir.path()).unwrap();
        assert_eq!(matrix, dir.path().join("L-F18"));
        assert_eq!(groups, dir.path().join("L-F18.groups"));
        assert_eq!(fs::read_to_string(&groups).unwrap(), "1,2,3\n");

        let expected = dir.path().join("expected");
        fs::write(&expected, "Gene\tLCS48-1\tL18-1\tLF18-1\ng1\t1\t4\t7\ng2\t2\t5\t8\ng3\t3\t6\t9\n").unwrap();
        assert!(is_same_file(&matrix, &expected).unwrap());
    }

    #[test]
    fn family_files_not_written_on_mismatch() {
        let dir = tempdir().unwrap();
        let mut samples = trio();
        samples[0].gene_ids[0] = String::from("other");
        assert!(write_family(&family(&samples), dir.path()).is_err());
        assert!(!dir.path().join("L-F18").exists());
        assert!(!dir.path().join("L-F18.groups").exists());
    }

    #[test]
    fn family_files_removed_when_groups_fail() {
        let dir = tempdir().unwrap();
        // a folder in place of the groups file makes its creation fail
        fs::create_dir(dir.path().join("L-F18.groups")).unwrap();
        let samples = trio();
        match write_family(&family(&samples), dir.path()) {
            Err(HeterosisError::Io { path, .. }) => assert_eq!(path, dir.path().join("L-F18.groups")),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(!dir.path().join("L-F18").exists());
    }

    #[test]
    fn matrix_file_error_has_path() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("L-F18")).unwrap();
        let samples = trio();
        match write_family(&family(&samples), dir.path()) {
            Err(HeterosisError::Io { path, .. }) => assert_eq!(path, dir.path().join("L-F18")),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(!dir.path().join("L-F18.groups").exists());
    }

    #[test]
    fn sample_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("samples.tsv");
        let mut samples = trio();
        samples[0].family_id = FamilyId::Recur;
        samples[2].source_paths.push(PathBuf::from("LF18-1_y.count"));
        let infos = VersionInfo {
            program: "heterosis_prep",
            version: "0.1.0",
            author: "someone",
            command: "heterosis_prep -i counts",
        };
        write_sample_table(&samples, &path, &infos).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "##\theterosis_prep\t0.1.0");
        assert_eq!(lines[3], "#source\ttissue\tlabel\tfamily\treplicate");
        assert_eq!(lines[4], "LCS48-1_x.count\tL\tP1\tRecur\t1");
        assert_eq!(lines[6], "LF18-1_x.count,LF18-1_y.count\tL\tF1\t18\t1");
    }
}
