use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use itertools::Itertools;
use log::debug;

use crate::lib::errors::{HeterosisError, Result};


/// # Role of a sample within a cross
/// The declaration order is the fixed total order used to sort
/// records before replicate merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// one of the recurrent parent lines, e.g. CS48
    Parent1,
    /// the F1 offspring of a recurrent parent and a family parent
    Hybrid,
    /// the numbered family parent, e.g. 18
    Parent2,
}

impl Role {
    /// the group label used in the `.groups` file
    pub fn group_label(&self) -> u8 {
        match self {
            Role::Parent1 => 1,
            Role::Parent2 => 2,
            Role::Hybrid  => 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Parent1 => "P1",
            Role::Parent2 => "P2",
            Role::Hybrid  => "F1",
        };
        write!(f, "{}", label)
    }
}

/// Family a sample belongs to. Recurrent parents are shared by
/// all families and carry the `Recur` sentinel instead of a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FamilyId {
    Recur,
    Number(u32),
}

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FamilyId::Recur     => write!(f, "Recur"),
            FamilyId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// The classification of an individual code, e.g. `CS48`, `F18` or `18`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndividualCode {
    /// a recurrent parent line
    ParentCode,
    /// a hybrid: recurrent parent, second parent code and family number
    HybridCode {
        recurrent: String,
        second: String,
        family: u32,
    },
    /// a family parent, the code is the family number itself
    FamilyNumber(u32),
}

/// # Crossing scheme
/// Maps the hybrid marker character (first letter of a hybrid code) to
/// the recurrent parent used in that cross. The set of recurrent parent
/// codes is the set of mapped codes.
///
/// The default is the rice scheme: `F` crosses use CS48 (9311) and
/// `C` crosses use CS66 (nipponbare).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossScheme {
    markers: Vec<(char, String)>,
}

impl Default for CrossScheme {
    fn default() -> Self {
        CrossScheme {
            markers: vec![
                ('F', String::from("CS48")),
                ('C', String::from("CS66")),
            ],
        }
    }
}

impl CrossScheme {
    pub fn new(markers: Vec<(char, String)>) -> Self {
        CrossScheme { markers }
    }

    /// Builds a scheme out of `MARKER:CODE` entries as given on the command line.
    ///
    /// Unittest: TRUE
    ///
    pub fn from_specs<I, S>(specs: I) -> std::result::Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut markers: Vec<(char, String)> = Vec::new();
        for spec in specs {
            let spec = spec.as_ref();
            let (marker, code) = match spec.split_once(':') {
                Some(x) => x,
                None => return Err(format!("cross {:?} is not of the form MARKER:CODE", spec)),
            };
            let mut chars = marker.chars();
            let marker = match (chars.next(), chars.next()) {
                (Some(m), None) => m,
                _ => return Err(format!("marker {:?} must be a single character", marker)),
            };
            if code.is_empty() {
                return Err(format!("cross {:?} has an empty parent code", spec));
            }
            if markers.iter().any(|(m, _)| *m == marker) {
                return Err(format!("marker {:?} given twice", marker));
            }
            markers.push((marker, code.to_string()));
        }
        if markers.is_empty() {
            return Err(String::from("at least one cross is required"));
        }
        Ok(CrossScheme { markers })
    }

    pub fn is_recurrent(&self, code: &str) -> bool {
        self.markers.iter().any(|(_, c)| c == code)
    }

    /// the recurrent parent crossed under this hybrid marker
    pub fn recurrent_for(&self, marker: char) -> Option<&str> {
        self.markers
            .iter()
            .find(|(m, _)| *m == marker)
            .map(|(_, c)| c.as_str())
    }
}

impl fmt::Display for CrossScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.markers.iter().map(|(m, c)| format!("{}:{}", m, c)).join(",")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One count file, or several files of the same sample once
/// re-sequenced replicates were merged.
pub struct SampleRecord {
    /// originating files, in merge order
    pub source_paths: Vec<PathBuf>,
    /// the sample token, e.g. `LF18-1`, used as matrix column name
    pub short_name: String,
    /// first letter of the token: L - leaf, R - root
    pub tissue: char,
    /// e.g. CS48, F18 or 18
    pub individual: String,
    /// sequencing lane/replicate id after the dash
    pub replicate: String,
    pub role: Role,
    /// recurrent parent, only known for hybrids
    pub parent1_code: Option<String>,
    /// family parent, only known for hybrids
    pub parent2_code: Option<String>,
    pub family_id: FamilyId,
    /// first column of the count file
    pub gene_ids: Vec<String>,
    /// second column of the count file, same order as `gene_ids`
    pub counts: Vec<i64>,
}

impl SampleRecord {
    /// comma joined source files, e.g. `a.count,b.count`
    pub fn source_display(&self) -> String {
        self.source_paths.iter().map(|p| p.display()).join(",")
    }

    /// the sample name before the replicate: tissue followed by individual
    pub fn sample_name(&self) -> String {
        format!("{}{}", self.tissue, self.individual)
    }
}

impl fmt::Display for SampleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.source_display(),
            self.tissue,
            self.role,
            self.family_id,
            self.replicate
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VersionInfo <'a>{
    /// the used program/sub-program
    pub program  : &'a str,
    /// the version of the program
    pub version  : &'a str,
    /// the author
    pub author : &'a str,
    /// the executed command
    pub command : &'a str,
}


/// One run of digits or of other characters of a name.
/// Digit runs compare by value: fewer significant digits first, then the digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum NaturalChunk {
    Number(usize, String),
    Text(String),
}

/// Splits a name into digit and non-digit runs so that `LF18-2` sorts
/// before `LF18-10`. Names differing only in leading zeros get equal keys,
/// callers break such ties on the full name.
///
/// Unittest: TRUE
///
pub fn natural_key(name: &str) -> Vec<NaturalChunk> {
    let mut chunks: Vec<NaturalChunk> = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;
    for c in name.chars() {
        let digit = c.is_ascii_digit();
        if !current.is_empty() && digit != in_digits {
            chunks.push(to_chunk(std::mem::take(&mut current), in_digits));
        }
        in_digits = digit;
        current.push(c);
    }
    if !current.is_empty() {
        chunks.push(to_chunk(current, in_digits));
    }
    chunks
}

fn to_chunk(run: String, digits: bool) -> NaturalChunk {
    if digits {
        let significant = run.trim_start_matches('0').to_string();
        NaturalChunk::Number(significant.len(), significant)
    } else {
        NaturalChunk::Text(run)
    }
}

/// Lists all `*.count` files directly inside a folder.
/// The list is sorted in natural order, so that a run does not
/// depend on the order the file system returns entries in.
///
/// Unittest: TRUE
///
pub fn collect_count_files(
    folder: &Path
) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(folder).map_err(|e| HeterosisError::io(folder, e))?;
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| HeterosisError::io(folder, e))?.path();
        let is_count = path
            .file_name()
            .and_then(|x| x.to_str())
            .map_or(false, |x| x.ends_with(".count"));
        if is_count && path.is_file() {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(HeterosisError::NoCountFiles { path: folder.to_path_buf() });
    }
    let files: Vec<PathBuf> = files
        .into_iter()
        .sorted_by_cached_key(|p| (natural_key(&p.to_string_lossy()), p.clone()))
        .collect();
    debug!("Found {} count files in {:?}", files.len(), folder);
    Ok(files)
}

/// this function takes a fofn file
/// with one entry per line and returns simply an array.
/// Empty lines are ignored, entries must not contain whitespace.
///
/// Unittest: TRUE
///
pub fn parse_fofn(
    my_file: &Path
) -> Result<Vec<PathBuf>> {
    let input  = File::open(my_file).map_err(|e| HeterosisError::io(my_file, e))?;
    let reader = BufReader::new(input);
    let mut files : Vec<PathBuf> = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let l = line.map_err(|e| HeterosisError::io(my_file, e))?;
        let entry = l.trim_end();
        if entry.is_empty() {
            continue;
        }
        if entry.split_whitespace().count() != 1 {
            return Err(HeterosisError::MalformedFofn {
                path: my_file.to_path_buf(),
                line: n + 1,
                reason: String::from("contains whitespace delimited entries"),
            });
        }
        files.push(PathBuf::from(entry));
    }
    if files.is_empty() {
        return Err(HeterosisError::NoCountFiles { path: my_file.to_path_buf() });
    }
    Ok(files)
}

/// adapted from here https://users.rust-lang.org/t/efficient-way-of-checking-if-two-files-have-the-same-content/74735
/// very useful for tests with external files and to verify that the results is identical
/// to a previously manually generated result file
pub fn is_same_file(
    file1: &Path,
    file2: &Path
) -> std::result::Result<bool, std::io::Error> {
    let f1 = File::open(file1)?;
    let f2 = File::open(file2)?;
    if f1.metadata()?.len() != f2.metadata()?.len() {
        return Ok(false);
    }

    // Use buf readers since they are much faster
    let f1r = BufReader::new(f1);
    let f2r = BufReader::new(f2);

    // Do a byte to byte comparison of the two files
    for (b1, b2) in f1r.bytes().zip(f2r.bytes()) {
        if b1? != b2? {
            return Ok(false);
        }
    }
    Ok(true)
}
