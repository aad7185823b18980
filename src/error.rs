use genomap::GenomeMapError;
use std::io;
use thiserror::Error;

use crate::file::FileError;
use crate::Position;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Table parsing error: {0}")]
    TableParsingError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
    #[error("File reading error: {0}")]
    FileError(#[from] FileError),
    #[error("Missing field")]
    MissingField,
    #[error("Parsing error: {0}")]
    ParseError(String),
    #[error("Config error: {0}")]
    ConfigError(#[from] serde_json::Error),
    #[error("Family id '{0}' uses the '_' prefix reserved for control families")]
    ReservedFamilyId(String),
    #[error("Individual '{0}' appears more than once in the pedigree")]
    DuplicateIndividual(String),
    #[error("SNP '{0}' is not in the SNP table")]
    UnknownSnp(String),
    #[error("Chromosome key '{0}' does not exist")]
    NoChrom(String),
    #[error("IBD segment for ({0}, {1}) starts at {2}, after all reference intervals")]
    SegmentAfterIntervals(String, String, Position),
    #[error("IBD segment for ({0}, {1}) starts at {2}, before reference interval [{3}, {4})")]
    SegmentBeforeInterval(String, String, Position, Position, Position),
    #[error("IBD segment for ({0}, {1}) ends at {2}, past reference interval [{3}, {4})")]
    SegmentPastInterval(String, String, Position, Position, Position),
    #[error("IBD segments for ({0}, {1}) overlap at {2}")]
    OverlappingSegments(String, String, Position),
    #[error("IBD segment for ({0}, {1}) has start {2} after end {3}")]
    InvalidSegment(String, String, Position, Position),
    #[error("Reference intervals overlap at {0}")]
    OverlappingIntervals(Position),
    #[error("Invalid IBD type '{0}'")]
    InvalidIbdType(String),
    #[error("Genotype shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("Neither phased nor unphased genotypes were provided")]
    NoGenotypes,
    #[error("A chromosome must be specified when the SNP table comes from phased data")]
    PhasedChromosomeRequired,
    #[error("GenomeMap Error: error updating GenomeMap")]
    GenomeMapError(#[from] GenomeMapError),
}
