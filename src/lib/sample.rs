//! # Sample parsing
//!
//! Count files are named after the sample they were generated from:
//!
//! ```text
//! LCS48-3_GTCCGC_L006_R_tophat_accepted_hits.count
//! RF18-1_GTTTCG_L003_R_tophat_accepted_hits.count
//! ```
//!
//! The first field (up to the first `_`) is the sample token. Its first letter
//! is the tissue (L - leaf, R - root), the rest up to the dash is the
//! individual and the part after the dash is the replicate.
//! CS48 and CS66 are the recurrent parents, `F18` is the hybrid of CS48 and
//! family parent `18`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;
use log::debug;
use regex::Regex;

use crate::lib::common::{CrossScheme, FamilyId, IndividualCode, Role, SampleRecord};
use crate::lib::errors::{HeterosisError, Result};

/// why an individual code could not be classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    Empty,
    NotANumber(String),
}

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"^(?P<tissue>[^-])(?P<individual>[^-]*)-(?P<replicate>[^-]+)$")
            .expect("sample token pattern is valid")
    })
}

/// the sample token: base name of the file up to the first underscore
pub fn sample_token(path: &Path) -> Result<&str> {
    let base = path
        .file_name()
        .and_then(|x| x.to_str())
        .ok_or_else(|| HeterosisError::MalformedFilename {
            path: path.to_path_buf(),
            reason: String::from("file name is missing or not valid UTF-8"),
        })?;
    match base.split('_').next() {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(HeterosisError::MalformedFilename {
            path: path.to_path_buf(),
            reason: String::from("empty sample token"),
        }),
    }
}

/// Splits a sample token such as `LF18-1` into tissue, individual and replicate.
///
/// Unittest: TRUE
///
pub fn split_sample_token(
    path: &Path,
    token: &str
) -> Result<(char, String, String)> {
    let caps = token_regex().captures(token).ok_or_else(|| HeterosisError::MalformedFilename {
        path: path.to_path_buf(),
        reason: format!("sample token {:?} is not <tissue><individual>-<replicate>", token),
    })?;
    // the tissue group matches exactly one character
    let tissue = caps["tissue"].chars().next().ok_or_else(|| HeterosisError::MalformedFilename {
        path: path.to_path_buf(),
        reason: format!("sample token {:?} has no tissue", token),
    })?;
    Ok((tissue, caps["individual"].to_string(), caps["replicate"].to_string()))
}

/// Classifies an individual code. First match wins:
/// a recurrent parent code, then a hybrid marker followed by the
/// family number, otherwise the code is a family number itself.
///
/// Unittest: TRUE
///
pub fn classify_individual(
    individual: &str,
    scheme: &CrossScheme
) -> std::result::Result<IndividualCode, CodeError> {
    if scheme.is_recurrent(individual) {
        return Ok(IndividualCode::ParentCode);
    }
    let mut chars = individual.chars();
    let marker = chars.next().ok_or(CodeError::Empty)?;
    if let Some(recurrent) = scheme.recurrent_for(marker) {
        let second = chars.as_str();
        let family = parse_family(second)?;
        return Ok(IndividualCode::HybridCode {
            recurrent: recurrent.to_string(),
            second: second.to_string(),
            family,
        });
    }
    Ok(IndividualCode::FamilyNumber(parse_family(individual)?))
}

fn parse_family(code: &str) -> std::result::Result<u32, CodeError> {
    code.parse::<u32>()
        .map_err(|_| CodeError::NotANumber(code.to_string()))
}

/// Reads a two-column count file (`gene_id count`, whitespace separated).
///
/// Unittest: TRUE
///
pub fn read_count_file(
    path: &Path
) -> Result<(Vec<String>, Vec<i64>)> {
    let input  = File::open(path).map_err(|e| HeterosisError::io(path, e))?;
    let reader = BufReader::new(input);
    let mut gene_ids : Vec<String> = Vec::new();
    let mut counts   : Vec<i64>    = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let l = line.map_err(|e| HeterosisError::io(path, e))?;
        let fields: Vec<&str> = l.split_whitespace().collect();
        if fields.len() != 2 {
            return Err(HeterosisError::MalformedCountFile {
                path: path.to_path_buf(),
                line: n + 1,
                reason: format!("expected 2 fields, found {}", fields.len()),
            });
        }
        let count = fields[1].parse::<i64>().map_err(|_| HeterosisError::MalformedCountFile {
            path: path.to_path_buf(),
            line: n + 1,
            reason: format!("count {:?} is not an integer", fields[1]),
        })?;
        gene_ids.push(fields[0].to_string());
        counts.push(count);
    }
    if gene_ids.is_empty() {
        return Err(HeterosisError::MalformedCountFile {
            path: path.to_path_buf(),
            line: 0,
            reason: String::from("no gene rows"),
        });
    }
    Ok((gene_ids, counts))
}

/// Parses one count file into a sample record. The file name is checked
/// before the file is opened.
///
/// Unittest: TRUE
///
pub fn parse_sample(
    path: &Path,
    scheme: &CrossScheme
) -> Result<SampleRecord> {
    let token = sample_token(path)?;
    let (tissue, individual, replicate) = split_sample_token(path, token)?;
    let code = classify_individual(&individual, scheme).map_err(|e| match e {
        CodeError::Empty => HeterosisError::MalformedFilename {
            path: path.to_path_buf(),
            reason: format!("sample token {:?} has no individual code", token),
        },
        CodeError::NotANumber(value) => HeterosisError::MalformedFamilyId {
            path: path.to_path_buf(),
            value,
        },
    })?;
    let (role, parent1_code, parent2_code, family_id) = match code {
        IndividualCode::ParentCode => (Role::Parent1, None, None, FamilyId::Recur),
        IndividualCode::HybridCode { recurrent, second, family } => {
            (Role::Hybrid, Some(recurrent), Some(second), FamilyId::Number(family))
        }
        IndividualCode::FamilyNumber(family) => (Role::Parent2, None, None, FamilyId::Number(family)),
    };
    let short_name = token.to_string();
    let (gene_ids, counts) = read_count_file(path)?;
    debug!("Parsed {:?}: {} {} family {} ({} genes)", path, short_name, role, family_id, gene_ids.len());
    Ok(SampleRecord {
        source_paths: vec![path.to_path_buf()],
        short_name,
        tissue,
        individual,
        replicate,
        role,
        parent1_code,
        parent2_code,
        family_id,
        gene_ids,
        counts,
    })
}
