//! Prepare family data for imputing the genotypes of missing parents.
//!
//! A [`Pedigree`] is either read from a pedigree file or reconstructed from
//! KING relationship calls and the individuals' ages and sexes with
//! [`create_pedigree`]. Individuals missing at least one genotyped parent are
//! grouped into [`Sibship`]s, and for every sibling pair the IBD segments
//! of each chromosome are reconciled into a gap-free tiling of the analyzable
//! intervals. Finally the genotypes of the individuals to impute for are
//! assembled into `i8` matrices with [`prepare_genotypes`].
//!
//! ```no_run
//! use sibprep::prelude::*;
//! let pedigree = create_pedigree("sample.king", "sample.agesex")
//!                    .expect("could not build pedigree");
//! let pedigree = add_control(&pedigree);
//! let sibships = extract_sibships(&pedigree);
//!
//! let snps = SnpTable::from_bim("sample.bim").expect("could not read bim");
//! let chroms = vec!["1".to_string()];
//! let reference = read_king_segments("sample.segments", &snps, &chroms)
//!                     .expect("could not read segments");
//! let raw = read_king_ibd("sample.seg", &snps, &chroms)
//!               .expect("could not read IBD");
//! let ibd = reconcile_genome(&raw, &reference, &chroms, &sibships)
//!               .expect("IBD calls disagree with the segments");
//! ```

pub mod config;
pub mod control;
pub mod error;
pub mod file;
pub mod genotype;
pub mod ibd;
pub mod kinship;
mod numeric;
pub mod pedigree;
pub mod prepare;
pub mod sibship;
pub mod snps;

/// The integer type for physical positions.
pub type Position = u64;

pub use config::PrepConfig;
pub use control::add_control;
pub use error::PrepError;
pub use genotype::{prepare_genotypes, GenotypeBlock, GenotypeSource, NAN_INTEGER};
pub use ibd::{IbdSegment, IbdTable, IbdType, ReferenceIntervals};
pub use kinship::create_pedigree;
pub use pedigree::Pedigree;
pub use sibship::{extract_sibships, Sibship, Sibships};
pub use snps::SnpTable;

pub mod prelude {
    pub use crate::config::PrepConfig;
    pub use crate::control::add_control;
    pub use crate::error::PrepError;
    pub use crate::genotype::{
        prepare_genotypes, CoordinateWindow, GenotypeBlock, GenotypeSource, InMemoryGenotypes,
        NAN_INTEGER,
    };
    pub use crate::ibd::{
        read_ibd, read_king_ibd, read_king_segments, reconcile, reconcile_genome, write_ibd_tsv,
        IbdSegment, IbdTable, IbdType, RawIbd, ReferenceIntervals, IBD_COLUMNS,
    };
    pub use crate::kinship::create_pedigree;
    pub use crate::pedigree::{FamilyId, ParentLink, Pedigree};
    pub use crate::prepare::{prepare_data, IbdInput, PreparedData};
    pub use crate::sibship::{extract_sibships, Sibship, Sibships};
    pub use crate::snps::SnpTable;
}
