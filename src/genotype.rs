//! Assemble the genotype slice needed for imputation.
//!
//! Genotype files themselves are read by a [`GenotypeSource`]. This module
//! selects the individuals and SNPs to use, drops duplicated SNP ids, checks
//! value ranges and computes allele frequencies. Missing values are `NaN` while
//! the data is floating point, and [`NAN_INTEGER`] once converted to `i8`.
use indexmap::{IndexMap, IndexSet};
use ndarray::{s, Array1, Array2, Array3, ArrayView3, Axis};

use crate::error::PrepError;
use crate::numeric::{coerce_out_of_range, nan_mean_columns, to_i8_with_sentinel, OutOfRange};
use crate::snps::SnpTable;
use crate::Position;

/// The missing-genotype sentinel of the `i8` genotype matrices.
pub const NAN_INTEGER: i8 = i8::MIN;

/// Allele probabilities above this threshold are called.
pub const PHASED_CALL_THRESHOLD: f32 = 0.99;

/// A provider of genotypes, e.g. a PLINK `.bed` or a phased `.bgen` reader.
///
/// Rows are samples and columns SNPs, both in the order of the source;
/// missing calls are `NaN`.
pub trait GenotypeSource {
    fn sample_ids(&self) -> &[String];

    fn n_snps(&self) -> usize;

    /// Unphased genotypes (0, 1 or 2 alternate alleles) of the selected rows
    /// and SNPs, or `None` if the source has no unphased data.
    fn read_unphased(
        &self,
        rows: &[usize],
        snps: &[usize],
    ) -> Result<Option<Array2<f32>>, PrepError>;

    /// Phased haplotypes (samples × SNPs × 2), or `None` if the source is unphased.
    fn read_phased(&self, rows: &[usize], snps: &[usize])
        -> Result<Option<Array3<f32>>, PrepError>;
}

/// A [`GenotypeSource`] holding its genotypes in memory.
#[derive(Debug, Clone)]
pub struct InMemoryGenotypes {
    sample_ids: Vec<String>,
    n_snps: usize,
    unphased: Option<Array2<f32>>,
    phased: Option<Array3<f32>>,
}

impl InMemoryGenotypes {
    pub fn new(
        sample_ids: Vec<String>,
        unphased: Option<Array2<f32>>,
        phased: Option<Array3<f32>>,
    ) -> Result<Self, PrepError> {
        let n_snps = match (&unphased, &phased) {
            (Some(u), _) => u.ncols(),
            (None, Some(p)) => p.len_of(Axis(1)),
            (None, None) => return Err(PrepError::NoGenotypes),
        };
        if let Some(u) = &unphased {
            if u.nrows() != sample_ids.len() {
                return Err(PrepError::ShapeMismatch(format!(
                    "{} unphased rows for {} samples",
                    u.nrows(),
                    sample_ids.len()
                )));
            }
        }
        if let Some(p) = &phased {
            let (n, m, h) = p.dim();
            if n != sample_ids.len() || m != n_snps || h != 2 {
                return Err(PrepError::ShapeMismatch(format!(
                    "phased genotypes of shape ({}, {}, {}) for {} samples and {} SNPs",
                    n,
                    m,
                    h,
                    sample_ids.len(),
                    n_snps
                )));
            }
        }
        Ok(Self {
            sample_ids,
            n_snps,
            unphased,
            phased,
        })
    }
}

impl GenotypeSource for InMemoryGenotypes {
    fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    fn n_snps(&self) -> usize {
        self.n_snps
    }

    fn read_unphased(
        &self,
        rows: &[usize],
        snps: &[usize],
    ) -> Result<Option<Array2<f32>>, PrepError> {
        Ok(self
            .unphased
            .as_ref()
            .map(|u| u.select(Axis(0), rows).select(Axis(1), snps)))
    }

    fn read_phased(
        &self,
        rows: &[usize],
        snps: &[usize],
    ) -> Result<Option<Array3<f32>>, PrepError> {
        Ok(self
            .phased
            .as_ref()
            .map(|p| p.select(Axis(0), rows).select(Axis(1), snps)))
    }
}

/// Convert bgen-style probabilities into haplotype calls.
///
/// `probs` is samples × SNPs × 4, holding for each haplotype the probability of
/// the first and of the second allele. A haplotype is 1 if its first allele has
/// probability above [`PHASED_CALL_THRESHOLD`], 0 if the second one does, and
/// missing otherwise.
pub fn phased_from_probabilities(probs: ArrayView3<f32>) -> Result<Array3<f32>, PrepError> {
    let (n, m, k) = probs.dim();
    if k != 4 {
        return Err(PrepError::ShapeMismatch(format!(
            "expected 4 probabilities per SNP, found {}",
            k
        )));
    }
    let mut haplotypes = Array3::from_elem((n, m, 2), f32::NAN);
    for ((i, j, hap), call) in haplotypes.indexed_iter_mut() {
        if probs[[i, j, 2 * hap]] > PHASED_CALL_THRESHOLD {
            *call = 1.0;
        } else if probs[[i, j, 2 * hap + 1]] > PHASED_CALL_THRESHOLD {
            *call = 0.0;
        }
    }
    Ok(haplotypes)
}

/// Number of genotype calls set to missing for being out of range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeViolations {
    pub unphased: OutOfRange,
    pub phased: OutOfRange,
}

impl RangeViolations {
    pub fn total(&self) -> usize {
        self.unphased.total() + self.phased.total()
    }
}

/// Physical coordinate window `[start, end)`; unset bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinateWindow {
    pub start: Option<Position>,
    pub end: Option<Position>,
}

impl CoordinateWindow {
    pub fn contains(&self, position: Position) -> bool {
        self.start.map_or(true, |start| position >= start)
            && self.end.map_or(true, |end| position < end)
    }
}

/// Data handed to the output writer alongside the genotypes.
#[derive(Debug, Clone, Default)]
pub struct OutputBundle {
    /// SNP table column name to the byte values of the selected SNPs.
    pub bim: IndexMap<String, Vec<Vec<u8>>>,
    /// Pedigree table, header row first.
    pub pedigree: Vec<Vec<String>>,
    /// Indices into the SNP table of the selected SNPs.
    pub non_duplicates: Vec<usize>,
}

/// Genotypes aligned to a selection of individuals and SNPs.
#[derive(Debug, Clone)]
pub struct GenotypeBlock {
    pub phased: Option<Array3<i8>>,
    pub unphased: Array2<i8>,
    /// Individual id to row of the genotype matrices.
    pub iid_to_row: IndexMap<String, usize>,
    pub positions: Array1<Position>,
    /// Frequency of the counted allele; `NaN` where no call is present.
    pub freqs: Array1<f64>,
    pub violations: RangeViolations,
    pub output: OutputBundle,
}

/// Load the genotypes of `target_ids` for SNPs inside `window`.
///
/// Duplicated SNP ids keep their first occurrence in the SNP table, even if a
/// later copy is the one inside the window.
pub fn prepare_genotypes<S: GenotypeSource + ?Sized>(
    source: &S,
    snps: &SnpTable,
    pedigree_table: Vec<Vec<String>>,
    target_ids: &IndexSet<String>,
    window: CoordinateWindow,
) -> Result<GenotypeBlock, PrepError> {
    if source.n_snps() != snps.len() {
        return Err(PrepError::ShapeMismatch(format!(
            "genotype source has {} SNPs, SNP table has {}",
            source.n_snps(),
            snps.len()
        )));
    }

    let selected: Vec<usize> = snps
        .non_duplicates()
        .into_iter()
        .filter(|&i| window.contains(snps.records()[i].coordinate))
        .collect();
    let positions: Array1<Position> = selected
        .iter()
        .map(|&i| snps.records()[i].coordinate)
        .collect();

    let mut iid_to_row = IndexMap::new();
    let mut rows = Vec::new();
    for (i, iid) in source.sample_ids().iter().enumerate() {
        if target_ids.contains(iid) && !iid_to_row.contains_key(iid) {
            iid_to_row.insert(iid.clone(), rows.len());
            rows.push(i);
        }
    }
    log::info!(
        "loading genotypes of {} individuals at {} SNPs",
        rows.len(),
        selected.len()
    );

    let mut violations = RangeViolations::default();
    let mut phased = source.read_phased(&rows, &selected)?;
    if let Some(haplotypes) = phased.as_mut() {
        violations.phased = coerce_out_of_range(haplotypes, 0.0, 1.0);
    }
    let mut unphased = match source.read_unphased(&rows, &selected)? {
        Some(genotypes) => genotypes,
        // NaN in either haplotype propagates through the sum
        None => match phased.as_ref() {
            Some(haplotypes) => &haplotypes.slice(s![.., .., 0]) + &haplotypes.slice(s![.., .., 1]),
            None => return Err(PrepError::NoGenotypes),
        },
    };
    violations.unphased = coerce_out_of_range(&mut unphased, 0.0, 2.0);

    if violations.phased.above > 0 {
        log::warn!(
            "phased genotypes are greater than 1 in {} locations. Converted to missing",
            violations.phased.above
        );
    }
    if violations.phased.below > 0 {
        log::warn!(
            "phased genotypes are less than 0 in {} locations. Converted to missing",
            violations.phased.below
        );
    }
    if violations.unphased.above > 0 {
        log::warn!(
            "unphased genotypes are greater than 2 in {} locations. Converted to missing",
            violations.unphased.above
        );
    }
    if violations.unphased.below > 0 {
        log::warn!(
            "unphased genotypes are less than 0 in {} locations. Converted to missing",
            violations.unphased.below
        );
    }

    let freqs = nan_mean_columns(unphased.view()).mapv(|mean| f64::from(mean) / 2.0);

    let output = OutputBundle {
        bim: snps.byte_columns(&selected),
        pedigree: pedigree_table,
        non_duplicates: selected,
    };
    Ok(GenotypeBlock {
        phased: phased.map(|haplotypes| to_i8_with_sentinel(&haplotypes, NAN_INTEGER)),
        unphased: to_i8_with_sentinel(&unphased, NAN_INTEGER),
        iid_to_row,
        positions,
        freqs,
        violations,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::assert_float_eq;
    use ndarray::array;

    const NAN: f32 = f32::NAN;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn targets(values: &[&str]) -> IndexSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn snps() -> SnpTable {
        SnpTable::from_bim("tests/data/sample.bim").unwrap()
    }

    fn unphased_source() -> InMemoryGenotypes {
        // 3 samples × 8 SNPs; the last SNP duplicates rs2
        let genotypes = array![
            [0., 1., 2., 3., 0., 1., NAN, 2.],
            [1., 1., 0., 0., -1., 1., NAN, 2.],
            [2., 0., 0., 1., 0., 1., NAN, 2.],
        ];
        InMemoryGenotypes::new(ids(&["A", "B", "C"]), Some(genotypes), None).unwrap()
    }

    #[test]
    fn test_unphased_assembly() {
        let block = prepare_genotypes(
            &unphased_source(),
            &snps(),
            vec![],
            &targets(&["C", "A"]),
            CoordinateWindow::default(),
        )
        .unwrap();
        // rows follow the source order
        assert_eq!(block.iid_to_row["A"], 0);
        assert_eq!(block.iid_to_row["C"], 1);
        assert_eq!(block.unphased.dim(), (2, 7));
        assert_eq!(block.output.non_duplicates, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(block.positions.to_vec(), vec![0, 100, 200, 300, 400, 500, 600]);
        // the 3 is coerced and counted once; B's -1 is not selected
        assert_eq!(block.violations.unphased, OutOfRange { below: 0, above: 1 });
        assert_eq!(block.violations.total(), 1);
        assert_eq!(block.unphased[[0, 3]], NAN_INTEGER);
        assert_eq!(block.unphased[[1, 0]], 2);
        assert_eq!(block.unphased[[0, 6]], NAN_INTEGER);

        assert_float_eq(block.freqs[0], 0.5, 1e-9);
        // the missing entry is ignored
        assert_float_eq(block.freqs[3], 0.5, 1e-9);
        assert!(block.freqs[6].is_nan());
    }

    #[test]
    fn test_window_restricts_snps() {
        let block = prepare_genotypes(
            &unphased_source(),
            &snps(),
            vec![],
            &targets(&["A", "B", "C"]),
            CoordinateWindow {
                start: Some(100),
                end: Some(800),
            },
        )
        .unwrap();
        // rs2's duplicate at 700 is dropped even though it is in the window
        assert_eq!(block.output.non_duplicates, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(block.output.bim["id"][0], b"rs2".to_vec());
        assert_eq!(block.violations.unphased, OutOfRange { below: 1, above: 1 });
    }

    #[test]
    fn test_phased_only_derives_unphased() {
        let phased = array![
            [[0., 1.], [1., 1.], [NAN, 1.], [2., 0.]],
            [[0., 0.], [1., 0.], [0., 0.], [1., 1.]],
        ];
        let source = InMemoryGenotypes::new(ids(&["A", "B"]), None, Some(phased)).unwrap();
        let table = SnpTable::from_bim("tests/data/sample.bim").unwrap();
        let snps = SnpTable::new(table.records()[..4].to_vec());
        let block = prepare_genotypes(
            &source,
            &snps,
            vec![vec!["FID".into()]],
            &targets(&["A", "B"]),
            CoordinateWindow::default(),
        )
        .unwrap();
        let phased = block.phased.unwrap();
        assert_eq!(phased.dim(), (2, 4, 2));
        assert_eq!(phased[[0, 3, 0]], NAN_INTEGER);
        assert_eq!(block.violations.phased, OutOfRange { below: 0, above: 1 });
        assert_eq!(
            block.unphased,
            array![[1i8, 2, NAN_INTEGER, NAN_INTEGER], [0, 1, 0, 2]]
        );
        assert_float_eq(block.freqs[2], 0.0, 1e-9);
        assert_eq!(block.output.pedigree, vec![vec!["FID".to_string()]]);
    }

    #[test]
    fn test_phased_from_probabilities() {
        let probs = array![[[0.995, 0.005, 0.01, 0.99], [0.5, 0.5, 1.0, 0.0]]];
        let haplotypes = phased_from_probabilities(probs.view()).unwrap();
        assert_eq!(haplotypes[[0, 0, 0]], 1.0);
        // 0.99 is not above the threshold
        assert!(haplotypes[[0, 0, 1]].is_nan());
        assert!(haplotypes[[0, 1, 0]].is_nan());
        assert_eq!(haplotypes[[0, 1, 1]], 1.0);
    }

    #[test]
    fn test_source_must_match_snp_table() {
        let source =
            InMemoryGenotypes::new(ids(&["A"]), Some(Array2::zeros((1, 3))), None).unwrap();
        assert!(matches!(
            prepare_genotypes(&source, &snps(), vec![], &targets(&["A"]), CoordinateWindow::default()),
            Err(PrepError::ShapeMismatch(_))
        ));
        assert!(matches!(
            InMemoryGenotypes::new(ids(&["A"]), None, None),
            Err(PrepError::NoGenotypes)
        ));
    }
}
