//! Reconstruct a pedigree from KING relationship inference.
//!
//! Only parent-offspring (`PO`) and full-sibling (`FS`) calls are used. The
//! direction of a parent-offspring link comes from the age difference of the
//! pair; sibling links group individuals into families.
//!
//! Two known limitations are kept as-is:
//!
//! * a `PO` pair whose age difference is under [`PARENT_AGE_GAP`] is dropped,
//!   even though the pair really are parent and offspring. So is a pair with an
//!   unknown age, or whose older member has an unknown sex;
//! * an `FS` pair whose members already belong to two different families does
//!   not merge those families.
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::PrepError;
use crate::file::InputFile;
use crate::pedigree::{FamilyId, ParentLink, Pedigree, PedigreeRow, DEFAULT_PEDIGREE_NAN};

/// Minimum age difference, in years, for a parent-offspring call to be oriented.
pub const PARENT_AGE_GAP: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    ParentOffspring,
    FullSibling,
    Other,
}

impl Relationship {
    pub fn from_inf_type(inf_type: &str) -> Relationship {
        match inf_type {
            "PO" => Relationship::ParentOffspring,
            "FS" => Relationship::FullSibling,
            _ => Relationship::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

impl Sex {
    pub fn parse(sex: &str) -> Sex {
        match sex {
            "M" => Sex::Male,
            "F" => Sex::Female,
            _ => Sex::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeSex {
    /// `None` when the age column is not a number, e.g. `NA`.
    pub age: Option<f64>,
    pub sex: Sex,
}

/// A relationship call joined to the age and sex of both individuals.
#[derive(Debug, Clone, PartialEq)]
pub struct KinshipRecord {
    pub id1: String,
    pub id2: String,
    pub relationship: Relationship,
    pub first: AgeSex,
    pub second: AgeSex,
}

/// A row of a KING `.kin0`/`.kin` file. Other columns are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct KingRow {
    #[serde(rename = "ID1")]
    pub id1: String,
    #[serde(rename = "ID2")]
    pub id2: String,
    #[serde(rename = "InfType")]
    pub inf_type: String,
}

/// Read the relationship calls from a tab-delimited KING file.
pub fn read_king(filepath: &str) -> Result<Vec<KingRow>, PrepError> {
    let mut rdr = InputFile::new(filepath).tsv_reader()?;
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: KingRow = result?;
        rows.push(row);
    }
    log::info!("loaded kinship file {} ({} records)", filepath, rows.len());
    Ok(rows)
}

/// Read the whitespace-delimited age/sex file, keyed by `IID`.
pub fn read_agesex(filepath: &str) -> Result<HashMap<String, AgeSex>, PrepError> {
    let table = InputFile::new(filepath).whitespace_table(true)?;
    let iid_col = table.column("IID")?;
    let sex_col = table.column("sex")?;
    let age_col = table.column("age")?;

    let mut agesex = HashMap::with_capacity(table.rows.len());
    for record in table.rows.iter() {
        let iid = record.get(iid_col).ok_or(PrepError::MissingField)?;
        let sex = record.get(sex_col).ok_or(PrepError::MissingField)?;
        let age_str = record.get(age_col).ok_or(PrepError::MissingField)?;
        let age = age_str.parse::<f64>().ok().filter(|age| !age.is_nan());
        if age.is_none() {
            log::debug!("age '{}' of {} is not a number", age_str, iid);
        }
        agesex.insert(
            iid.clone(),
            AgeSex {
                age,
                sex: Sex::parse(sex),
            },
        );
    }
    log::info!("loaded agesex file {} ({} individuals)", filepath, agesex.len());
    Ok(agesex)
}

/// Attach age and sex to each relationship call.
///
/// Calls involving an individual missing from `agesex` are dropped.
pub fn join_agesex(rows: &[KingRow], agesex: &HashMap<String, AgeSex>) -> Vec<KinshipRecord> {
    let mut dropped = 0;
    let records: Vec<KinshipRecord> = rows
        .iter()
        .filter_map(|row| {
            match (agesex.get(&row.id1), agesex.get(&row.id2)) {
                (Some(first), Some(second)) => Some(KinshipRecord {
                    id1: row.id1.clone(),
                    id2: row.id2.clone(),
                    relationship: Relationship::from_inf_type(&row.inf_type),
                    first: *first,
                    second: *second,
                }),
                _ => {
                    dropped += 1;
                    None
                }
            }
        })
        .collect();
    if dropped > 0 {
        log::warn!("{} kinship records without age/sex information were dropped", dropped);
    }
    records
}

/// An individual during pedigree construction.
#[derive(Debug, Clone, Default)]
struct Individual {
    fid: Option<usize>,
    father: Option<String>,
    mother: Option<String>,
}

/// Builds a [`Pedigree`] from relationship calls in a single pass.
#[derive(Debug, Default)]
pub struct PedigreeBuilder {
    individuals: IndexMap<String, Individual>,
    next_fid: usize,
    skipped_parent_offspring: usize,
    unmerged_siblings: usize,
}

impl PedigreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the individual, created on first sight.
    fn index_of(&mut self, id: &str) -> usize {
        match self.individuals.get_index_of(id) {
            Some(idx) => idx,
            None => self.individuals.insert_full(id.to_string(), Individual::default()).0,
        }
    }

    fn mint_fid(&mut self) -> usize {
        let fid = self.next_fid;
        self.next_fid += 1;
        fid
    }

    fn individual(&mut self, idx: usize) -> &mut Individual {
        // indices only come from index_of
        &mut self.individuals[idx]
    }

    pub fn add_record(&mut self, record: &KinshipRecord) {
        let i1 = self.index_of(&record.id1);
        let i2 = self.index_of(&record.id2);
        match record.relationship {
            Relationship::ParentOffspring => {
                let (Some(age1), Some(age2)) = (record.first.age, record.second.age) else {
                    self.skipped_parent_offspring += 1;
                    log::debug!(
                        "skipping PO record ({}, {}): unknown age",
                        record.id1,
                        record.id2
                    );
                    return;
                };
                let assigned = if age1 >= age2 + PARENT_AGE_GAP {
                    self.assign_parent(&record.id1, record.first.sex, i2)
                } else if age2 >= age1 + PARENT_AGE_GAP {
                    self.assign_parent(&record.id2, record.second.sex, i1)
                } else {
                    log::debug!(
                        "skipping PO record ({}, {}): age gap under {} years",
                        record.id1,
                        record.id2,
                        PARENT_AGE_GAP
                    );
                    false
                };
                if !assigned {
                    self.skipped_parent_offspring += 1;
                }
            }
            Relationship::FullSibling => {
                let fid1 = self.individuals[i1].fid;
                let fid2 = self.individuals[i2].fid;
                match (fid1, fid2) {
                    (None, None) => {
                        let fid = self.mint_fid();
                        self.individual(i1).fid = Some(fid);
                        self.individual(i2).fid = Some(fid);
                    }
                    (None, Some(fid)) => self.individual(i1).fid = Some(fid),
                    (Some(fid), None) => self.individual(i2).fid = Some(fid),
                    (Some(a), Some(b)) if a != b => {
                        self.unmerged_siblings += 1;
                        log::debug!(
                            "FS record ({}, {}) links families {} and {}; not merged",
                            record.id1,
                            record.id2,
                            a,
                            b
                        );
                    }
                    _ => {}
                }
            }
            Relationship::Other => {}
        }
    }

    /// Link the parent to the child. Returns false if the parent's sex is unknown.
    fn assign_parent(&mut self, parent_id: &str, sex: Sex, child_idx: usize) -> bool {
        let child = self.individual(child_idx);
        match sex {
            Sex::Female => child.mother = Some(parent_id.to_string()),
            Sex::Male => child.father = Some(parent_id.to_string()),
            Sex::Unknown => {
                log::debug!("skipping PO record with parent {}: unknown sex", parent_id);
                return false;
            }
        }
        true
    }

    /// Finish construction: singleton families for ungrouped individuals, and
    /// placeholders for unassigned parents.
    pub fn build(mut self) -> Result<Pedigree, PrepError> {
        if self.skipped_parent_offspring > 0 {
            log::warn!(
                "{} PO records skipped: unknown age or parent sex, or an age gap under {} years",
                self.skipped_parent_offspring,
                PARENT_AGE_GAP
            );
        }
        if self.unmerged_siblings > 0 {
            log::warn!(
                "{} FS records connect already different families and were not merged",
                self.unmerged_siblings
            );
        }

        let individuals = std::mem::take(&mut self.individuals);
        let mut rows = Vec::with_capacity(individuals.len());
        for (iid, person) in individuals {
            let fid = match person.fid {
                Some(fid) => fid,
                None => self.mint_fid(),
            };
            let link = |parent: Option<String>| parent.map_or(ParentLink::Placeholder, ParentLink::Known);
            rows.push(PedigreeRow {
                fid: FamilyId::Organic(fid.to_string()),
                iid,
                father: link(person.father),
                mother: link(person.mother),
            });
        }
        log::info!("created pedigree with {} individuals", rows.len());
        Pedigree::new(rows, DEFAULT_PEDIGREE_NAN)
    }
}

/// Build a pedigree from joined relationship calls.
pub fn build_pedigree(records: &[KinshipRecord]) -> Result<Pedigree, PrepError> {
    let mut builder = PedigreeBuilder::new();
    for record in records {
        builder.add_record(record);
    }
    builder.build()
}

/// Build a pedigree from a KING relationship file and an age/sex file.
pub fn create_pedigree(king_path: &str, agesex_path: &str) -> Result<Pedigree, PrepError> {
    let king = read_king(king_path)?;
    let agesex = read_agesex(agesex_path)?;
    let records = join_agesex(&king, &agesex);
    build_pedigree(&records)
}
