//! Per-chromosome preparation of the data needed to impute missing parents.
//!
//! ```no_run
//! use sibprep::prelude::*;
//! let config = PrepConfig::default();
//! let pedigree = create_pedigree("sample.king", "sample.agesex")
//!                    .expect("could not build pedigree");
//! let snps = SnpTable::from_bim("sample.bim").expect("could not read bim");
//! let prepared = prepare_data(
//!     &pedigree,
//!     snps,
//!     "sample.segments",
//!     IbdInput::King("sample.seg"),
//!     &config,
//! )
//! .expect("could not prepare data");
//! println!("{} sibships", prepared.sibships.len());
//! ```
use genomap::GenomeMap;
use indexmap::IndexSet;

use crate::config::PrepConfig;
use crate::control::add_control;
use crate::error::PrepError;
use crate::genotype::{prepare_genotypes, GenotypeBlock, GenotypeSource};
use crate::ibd::{read_ibd, read_king_ibd, read_king_segments, reconcile_genome, IbdTable};
use crate::pedigree::Pedigree;
use crate::sibship::{extract_sibships, Sibships};
use crate::snps::SnpTable;

/// Where raw IBD calls come from.
#[derive(Debug, Clone, Copy)]
pub enum IbdInput<'a> {
    /// KING segment calls, with boundaries given as SNP ids.
    King(&'a str),
    /// Calls already in physical coordinates.
    Precomputed(&'a str),
}

/// Everything but the genotypes.
pub struct PreparedData {
    pub pedigree: Pedigree,
    pub sibships: Sibships,
    /// Reconciled IBD segments per chromosome.
    pub ibd: GenomeMap<IbdTable>,
    pub snps: SnpTable,
    pub chromosomes: Vec<String>,
}

impl PreparedData {
    /// Individuals missing at least one genotyped parent.
    pub fn target_ids(&self) -> &IndexSet<String> {
        &self.sibships.target_ids
    }

    /// Load the genotypes of the target individuals.
    pub fn genotypes<S: GenotypeSource + ?Sized>(
        &self,
        source: &S,
        config: &PrepConfig,
    ) -> Result<GenotypeBlock, PrepError> {
        log::info!(
            "with chromosomes {:?} loading genotypes with window {:?}",
            self.chromosomes,
            config.window()
        );
        prepare_genotypes(
            source,
            &self.snps,
            self.pedigree.to_table(),
            self.target_ids(),
            config.window(),
        )
    }
}

/// Extract sibships from `pedigree` and reconcile their IBD segments against
/// the reference intervals in `segments_path`.
pub fn prepare_data(
    pedigree: &Pedigree,
    snps: SnpTable,
    segments_path: &str,
    ibd: IbdInput<'_>,
    config: &PrepConfig,
) -> Result<PreparedData, PrepError> {
    let chromosomes = if config.chromosomes.is_empty() {
        snps.chromosomes()
    } else {
        config.chromosomes.clone()
    };
    log::info!("with chromosomes {:?} initializing data", chromosomes);

    let pedigree = if config.add_control {
        add_control(pedigree)
    } else {
        pedigree.clone()
    };
    let sibships = extract_sibships(&pedigree);

    log::info!("with chromosomes {:?} loading and reconciling IBD", chromosomes);
    let reference = read_king_segments(segments_path, &snps, &chromosomes)?;
    let raw = match ibd {
        IbdInput::King(path) => read_king_ibd(path, &snps, &chromosomes)?,
        IbdInput::Precomputed(path) => read_ibd(path, &chromosomes)?,
    };
    let ibd = reconcile_genome(&raw, &reference, &chromosomes, &sibships)?;

    Ok(PreparedData {
        pedigree,
        sibships,
        ibd,
        snps,
        chromosomes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::{InMemoryGenotypes, NAN_INTEGER};
    use crate::ibd::IbdType;
    use crate::kinship::create_pedigree;
    use ndarray::Array2;

    fn prepared(config: &PrepConfig, ibd: IbdInput<'_>) -> PreparedData {
        let pedigree = Pedigree::from_file("tests/data/sample.ped", &config.pedigree_nan).unwrap();
        let snps = SnpTable::from_bim("tests/data/sample.bim").unwrap();
        prepare_data(&pedigree, snps, "tests/data/sample.segments", ibd, config).unwrap()
    }

    #[test]
    fn test_prepare_from_king() {
        let data = prepared(&PrepConfig::default(), IbdInput::King("tests/data/sample.seg"));
        assert_eq!(data.chromosomes, vec!["1"]);
        assert_eq!(data.sibships.len(), 1);
        let table = data.ibd.get("1").unwrap();
        assert_eq!(table.ibd_type_at("S1", "S2", 150), Some(IbdType::Two));
        assert_eq!(table.ibd_type_at("S1", "S2", 450), Some(IbdType::One));
    }

    #[test]
    fn test_prepare_precomputed_with_controls() {
        let config = PrepConfig {
            add_control: true,
            ..PrepConfig::default()
        };
        let data = prepared(&config, IbdInput::Precomputed("tests/data/sample.ibd"));
        // organic sibship plus three control sibships of C1 and C2
        assert_eq!(data.sibships.len(), 4);
        let table = data.ibd.get("1").unwrap();
        // C1-C2 have no precomputed calls, so they default to IBD0
        assert_eq!(table.get("C2", "C1").unwrap().len(), 2);
        assert_eq!(table.ibd_type_at("C1", "C2", 100), Some(IbdType::Zero));
        assert!(data.target_ids().contains("C1"));
        let pedigree = data.pedigree.to_table();
        assert_eq!(pedigree.len(), 1 + 7 + 6);
    }

    #[test]
    fn test_genotypes_of_targets() {
        let config = PrepConfig {
            start: Some(100),
            end: Some(300),
            ..PrepConfig::default()
        };
        let data = prepared(&config, IbdInput::King("tests/data/sample.seg"));
        let samples: Vec<String> = ["F1", "S1", "S2", "C1"].iter().map(|s| s.to_string()).collect();
        let mut genotypes = Array2::<f32>::ones((4, 8));
        genotypes[[2, 2]] = 5.0;
        let source = InMemoryGenotypes::new(samples, Some(genotypes), None).unwrap();
        let block = data.genotypes(&source, &config).unwrap();
        assert_eq!(block.iid_to_row.keys().collect::<Vec<_>>(), vec!["S1", "S2"]);
        assert_eq!(block.output.non_duplicates, vec![1, 2]);
        assert_eq!(block.unphased[[1, 1]], NAN_INTEGER);
        assert_eq!(block.violations.total(), 1);
        assert_eq!(block.output.pedigree[0], vec!["FID", "IID", "FATHER_ID", "MOTHER_ID"]);
    }

    #[test]
    fn test_prepare_from_kinship() {
        let pedigree = create_pedigree("tests/data/sample.king", "tests/data/sample.agesex").unwrap();
        let snps = SnpTable::from_bim("tests/data/sample.bim").unwrap();
        let data = prepare_data(
            &pedigree,
            snps,
            "tests/data/sample.segments",
            IbdInput::King("tests/data/sample.seg"),
            &PrepConfig::default(),
        )
        .unwrap();
        // C1 has both parents genotyped, C2 was only linked as a sibling
        assert!(data.target_ids().contains("C2"));
        let table = data.ibd.get("1").unwrap();
        assert!(table.get("C1", "C2").is_some());
    }
}
