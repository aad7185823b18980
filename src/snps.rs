//! The SNP table, read from a PLINK `.bim` file or built from the variant
//! metadata of a phased genotype file.
use indexmap::IndexMap;
use std::collections::HashMap;

use crate::error::PrepError;
use crate::file::InputFile;
use crate::Position;

/// Column names of the SNP table, as written to the output bundle.
pub const BIM_COLUMNS: [&str; 6] = ["Chr", "id", "morgans", "coordinate", "allele1", "allele2"];

#[derive(Debug, Clone, PartialEq)]
pub struct SnpRecord {
    pub chrom: String,
    pub id: String,
    /// Genetic position; carried along but not used for any computation.
    pub morgans: f64,
    pub coordinate: Position,
    pub allele1: String,
    pub allele2: String,
}

impl SnpRecord {
    fn column_values(&self) -> [String; 6] {
        [
            self.chrom.clone(),
            self.id.clone(),
            self.morgans.to_string(),
            self.coordinate.to_string(),
            self.allele1.clone(),
            self.allele2.clone(),
        ]
    }
}

/// Variant metadata of a phased genotype file, which does not carry a chromosome.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantMeta {
    pub id: String,
    pub position: Position,
    /// Comma-separated alleles, e.g. `A,G`.
    pub allele_ids: String,
}

/// SNP records in file order, with a lookup of each id's first occurrence.
#[derive(Debug, Clone, Default)]
pub struct SnpTable {
    records: Vec<SnpRecord>,
    first_index: HashMap<String, usize>,
}

impl SnpTable {
    pub fn new(records: Vec<SnpRecord>) -> Self {
        let mut first_index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            first_index.entry(record.id.clone()).or_insert(i);
        }
        Self {
            records,
            first_index,
        }
    }

    /// Read a whitespace-delimited `.bim` file (no header).
    pub fn from_bim(filepath: &str) -> Result<SnpTable, PrepError> {
        let table = InputFile::new(filepath).whitespace_table(false)?;
        table.require_width(BIM_COLUMNS.len())?;
        let mut records = Vec::with_capacity(table.rows.len());
        for fields in table.rows.iter() {
            let morgans: f64 = fields[2].parse().map_err(|_| {
                PrepError::ParseError(format!("Failed to parse morgans from string: {}", fields[2]))
            })?;
            let coordinate: Position = fields[3].parse().map_err(|_| {
                PrepError::ParseError(format!("Failed to parse coordinate from string: {}", fields[3]))
            })?;
            records.push(SnpRecord {
                chrom: fields[0].clone(),
                id: fields[1].clone(),
                morgans,
                coordinate,
                allele1: fields[4].clone(),
                allele2: fields[5].clone(),
            });
        }
        log::info!("loaded {} SNPs from {}", records.len(), filepath);
        Ok(SnpTable::new(records))
    }

    /// Build the table from phased variant metadata.
    ///
    /// Phased files need not encode the chromosome, so it must be supplied.
    pub fn from_variants(
        chrom: Option<&str>,
        variants: &[VariantMeta],
    ) -> Result<SnpTable, PrepError> {
        let chrom = chrom.ok_or(PrepError::PhasedChromosomeRequired)?;
        let records = variants
            .iter()
            .map(|variant| {
                let mut alleles = variant.allele_ids.split(',');
                SnpRecord {
                    chrom: chrom.to_string(),
                    id: variant.id.clone(),
                    morgans: 0.0,
                    coordinate: variant.position,
                    allele1: alleles.next().unwrap_or_default().to_string(),
                    allele2: alleles.next().unwrap_or_default().to_string(),
                }
            })
            .collect();
        Ok(SnpTable::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SnpRecord] {
        &self.records
    }

    /// Physical coordinate of the first SNP with this id.
    pub fn coordinate(&self, id: &str) -> Result<Position, PrepError> {
        self.first_index
            .get(id)
            .map(|&i| self.records[i].coordinate)
            .ok_or_else(|| PrepError::UnknownSnp(id.to_string()))
    }

    /// Distinct chromosomes, in order of appearance.
    pub fn chromosomes(&self) -> Vec<String> {
        let mut chroms: Vec<String> = Vec::new();
        for record in self.records.iter() {
            if !chroms.contains(&record.chrom) {
                chroms.push(record.chrom.clone());
            }
        }
        chroms
    }

    /// Indices of the first occurrence of every SNP id, ascending.
    pub fn non_duplicates(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.first_index.values().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// The selected rows as a map of column name to byte values.
    pub fn byte_columns(&self, indices: &[usize]) -> IndexMap<String, Vec<Vec<u8>>> {
        let mut columns: IndexMap<String, Vec<Vec<u8>>> = BIM_COLUMNS
            .iter()
            .map(|name| (name.to_string(), Vec::with_capacity(indices.len())))
            .collect();
        for &i in indices {
            let values = self.records[i].column_values();
            for (column, value) in columns.values_mut().zip(values) {
                column.push(value.into_bytes());
            }
        }
        columns
    }
}
