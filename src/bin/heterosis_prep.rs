//! ## heterosis_prep ##
//! ---------------------
//! Parses a folder of HTSeq count files and groups them per family into
//! a families folder. Samples sequenced in several batches (same tissue,
//! individual and replicate) are summed first. For every hybrid with both
//! parents present two files are written: the count matrix `<tissue>-<hybrid>`
//! and its group labels `<tissue>-<hybrid>.groups` (1 = recurrent parent,
//! 2 = family parent, 3 = hybrid).

use clap::{app_from_crate,crate_name,crate_description,crate_authors,crate_version,Arg};
use std::env;
use std::path::{Path, PathBuf};
use std::process;
extern crate pretty_env_logger;
#[macro_use] extern crate log;

// our library which is within the same project
extern crate heterosis;
use heterosis::lib::common::{*};
use heterosis::lib::pipeline::{prepare, PrepareConfig};


fn main() {
    pretty_env_logger::init();

    // now the next is not really for any argument
    // parsing but simply to get the command which
    // was used to execute as I cant get this from clap
    let args: Vec<String> = env::args().collect();
    let args_string = args.join(" ");
    let matches = app_from_crate!()
    .about("This tool takes a folder of HTSeq count files named <tissue><individual>-<replicate>_<suffix>.count \
    and prepares per family count matrices for heterosis analysis. \
    The first letter of the sample is the tissue (e.g. L - leaf, R - root). \
    Recurrent parents (default CS48 and CS66) are grouped with the family parent (e.g. 18) \
    and the hybrid (e.g. F18, where F marks a cross with CS48 and C one with CS66).
    ")
    .arg(Arg::with_name("COUNTS")
            .short("i")
            .long("counts")
            .value_name("DIR")
            .help("folder containing the *.count files")
            .takes_value(true)
            .required_unless("FOFN")
            .conflicts_with("FOFN"))
    .arg(Arg::with_name("FOFN")
            .short("f")
            .long("fofn")
            .value_name("FILE")
            .help("file with one count file per line, used instead of a folder")
            .takes_value(true))
    .arg(Arg::with_name("OUT")
            .short("o")
            .long("families")
            .value_name("DIR")
            .help("output folder for the family matrices, created if absent")
            .takes_value(true)
            .default_value("families"))
    .arg(Arg::with_name("CROSS")
            .short("c")
            .long("cross")
            .value_name("MARKER:CODE")
            .help("hybrid marker and the recurrent parent it was crossed with, can be repeated [default: F:CS48 C:CS66]")
            .takes_value(true)
            .multiple(true)
            .number_of_values(1))
    .arg(Arg::with_name("SAMPLES")
            .short("s")
            .long("samples")
            .value_name("FILE")
            .help("write a table of all samples after merging replicates")
            .takes_value(true))
    .arg(Arg::with_name("STRICT")
            .long("strict")
            .help("exit with an error if any file or family had to be skipped")
            .takes_value(false))
    .get_matches();

    let families     = Path::new(matches.value_of("OUT").unwrap());
    let sample_table = matches.value_of("SAMPLES").map(Path::new);
    let strict       = matches.is_present("STRICT");
    let scheme = match matches.values_of("CROSS") {
        Some(crosses) => match CrossScheme::from_specs(crosses) {
            Ok(x) => x,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(2);
            }
        },
        None => CrossScheme::default(),
    };
    eprintln!("INFO: crossing scheme {}", scheme);

    // either a folder which we scan or an explicit list of files
    let files: Result<Vec<PathBuf>, _> = match matches.value_of("FOFN") {
        Some(fofn) => parse_fofn(Path::new(fofn)),
        None => collect_count_files(Path::new(matches.value_of("COUNTS").unwrap())),
    };
    let files = match files {
        Ok(x) => x,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };
    eprintln!("INFO: {} count files provided", files.len());

    let config = PrepareConfig {
        families,
        scheme: &scheme,
        sample_table,
        infos: VersionInfo {
            program: "heterosis_prep",
            version: crate_version!(),
            author : crate_authors!(),
            command: &args_string,
        },
    };
    let report = match prepare(&files, &config) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    for failure in report.failures.iter() {
        error!("{}", failure);
    }
    eprintln!(
        "INFO: {} files parsed, {} samples after merging, {} families written into {}",
        report.parsed,
        report.samples,
        report.written.len(),
        families.display()
    );
    if !report.is_clean() {
        eprintln!("WARNING: {} files or families were skipped, see messages above", report.failures.len());
        if strict {
            process::exit(1);
        }
    }
}
