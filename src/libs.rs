//! # Heterosis family preparation libraries
//!
//! Author: Emanuel Schmid-Siegert
//!
//! These libraries collect per-sample gene-count files (as produced by HTSeq),
//! infer tissue, individual and replicate from the file names, merge samples
//! which were sequenced in several batches and regroup everything into one
//! count matrix per family (recurrent parent, family parent and hybrid).
//! The matrices together with their group labels are the input of the
//! heterosis (parent versus hybrid expression) analysis.
//!
//! The libraries are split into :
//!  - common: structures shared by all steps + input discovery
//!  - errors: the error type of all steps
//!  - sample: parsing of a single count file
//!  - merge: merging of re-sequenced replicates
//!  - family: grouping of hybrids with their parents
//!  - matrix: writing family matrices and group labels
//!  - pipeline: the complete batch run
//!

pub mod lib {
    /// structures shared by all steps
    pub mod common;
    pub mod errors;
    /// parsing of a single count file
    pub mod sample;
    pub mod merge;
    pub mod family;
    /// writing of family matrices
    pub mod matrix;
    pub mod pipeline;
}
