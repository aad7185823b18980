//! The pedigree table: one row per individual with its family and parent links.
//!
//! Parent links are stored as a [`ParentLink`] rather than as sentinel strings.
//! The sentinel forms (per-family placeholders such as `<fid>___P`, and the
//! configured missing value such as `0`) only appear when a [`Pedigree`] is
//! written out or turned into a table.
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use std::io::Write;

use crate::error::PrepError;
use crate::file::{InputFile, OutputFile};

/// Family ids starting with this character are reserved for control families.
pub const RESERVED_MARKER: char = '_';

/// Placeholder suffixes for parents of organic families.
pub const FATHER_PLACEHOLDER_SUFFIX: &str = "___P";
pub const MOTHER_PLACEHOLDER_SUFFIX: &str = "___M";

/// Placeholder suffixes for parents removed from control families.
pub const CONTROL_FATHER_SUFFIX: &str = "_P";
pub const CONTROL_MOTHER_SUFFIX: &str = "_M";

/// The default value of a parent column meaning "parent unknown".
pub const DEFAULT_PEDIGREE_NAN: &str = "0";

/// Column names of the pedigree table.
pub const PEDIGREE_COLUMNS: [&str; 4] = ["FID", "IID", "FATHER_ID", "MOTHER_ID"];

/// Which parents a control family keeps from its source family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControlKind {
    /// Both parents removed.
    NoParents,
    /// Mother removed, father kept.
    FatherOnly,
    /// Father removed, mother kept.
    MotherOnly,
}

impl ControlKind {
    pub const ALL: [ControlKind; 3] = [
        ControlKind::NoParents,
        ControlKind::FatherOnly,
        ControlKind::MotherOnly,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            ControlKind::NoParents => "_o_",
            ControlKind::FatherOnly => "_p_",
            ControlKind::MotherOnly => "_m_",
        }
    }

    pub fn keeps_father(&self) -> bool {
        matches!(self, ControlKind::FatherOnly)
    }

    pub fn keeps_mother(&self) -> bool {
        matches!(self, ControlKind::MotherOnly)
    }
}

/// A family identifier, either assigned from the data or generated as a control.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FamilyId {
    Organic(String),
    /// A control family derived from the organic family with the given id.
    Control(ControlKind, String),
}

impl FamilyId {
    /// Parse a serialized family id, recognizing control prefixes.
    ///
    /// Any other id starting with [`RESERVED_MARKER`] is rejected.
    pub fn parse(fid: &str) -> Result<FamilyId, PrepError> {
        for kind in ControlKind::ALL {
            if let Some(base) = fid.strip_prefix(kind.prefix()) {
                return Ok(FamilyId::Control(kind, base.to_string()));
            }
        }
        if fid.starts_with(RESERVED_MARKER) {
            return Err(PrepError::ReservedFamilyId(fid.to_string()));
        }
        Ok(FamilyId::Organic(fid.to_string()))
    }

    pub fn is_control(&self) -> bool {
        matches!(self, FamilyId::Control(..))
    }

    fn placeholder(&self, role: ParentRole) -> String {
        let suffix = match (self, role) {
            (FamilyId::Organic(_), ParentRole::Father) => FATHER_PLACEHOLDER_SUFFIX,
            (FamilyId::Organic(_), ParentRole::Mother) => MOTHER_PLACEHOLDER_SUFFIX,
            (FamilyId::Control(..), ParentRole::Father) => CONTROL_FATHER_SUFFIX,
            (FamilyId::Control(..), ParentRole::Mother) => CONTROL_MOTHER_SUFFIX,
        };
        format!("{}{}", self, suffix)
    }
}

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FamilyId::Organic(fid) => write!(f, "{}", fid),
            FamilyId::Control(kind, base) => write!(f, "{}{}", kind.prefix(), base),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRole {
    Father,
    Mother,
}

/// The link from an individual to one of its parents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParentLink {
    /// A parent with a known identifier, who may or may not be genotyped.
    Known(String),
    /// No parent was identified; serialized as a family-scoped placeholder.
    Placeholder,
    /// The input marked this parent as unknown; nothing can be imputed toward it.
    Missing,
}

impl ParentLink {
    pub fn known(&self) -> Option<&str> {
        match self {
            ParentLink::Known(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

/// A single row of the pedigree table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PedigreeRow {
    pub fid: FamilyId,
    pub iid: String,
    pub father: ParentLink,
    pub mother: ParentLink,
}

impl PedigreeRow {
    /// Serialized parent id, with placeholders and missing values expanded.
    pub fn parent_id(&self, role: ParentRole, pedigree_nan: &str) -> String {
        let link = match role {
            ParentRole::Father => &self.father,
            ParentRole::Mother => &self.mother,
        };
        match link {
            ParentLink::Known(id) => id.clone(),
            ParentLink::Placeholder => self.fid.placeholder(role),
            ParentLink::Missing => pedigree_nan.to_string(),
        }
    }

    pub fn father_id(&self, pedigree_nan: &str) -> String {
        self.parent_id(ParentRole::Father, pedigree_nan)
    }

    pub fn mother_id(&self, pedigree_nan: &str) -> String {
        self.parent_id(ParentRole::Mother, pedigree_nan)
    }
}

/// An ordered pedigree table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pedigree {
    rows: Vec<PedigreeRow>,
    pedigree_nan: String,
}

impl Pedigree {
    /// Create a pedigree from its rows.
    ///
    /// Organic individuals must be unique. Control families repeat the ids of
    /// their source family, so they are exempt.
    pub fn new(rows: Vec<PedigreeRow>, pedigree_nan: &str) -> Result<Pedigree, PrepError> {
        let mut seen = HashSet::new();
        for row in rows.iter().filter(|row| !row.fid.is_control()) {
            if !seen.insert(row.iid.as_str()) {
                return Err(PrepError::DuplicateIndividual(row.iid.clone()));
            }
        }
        Ok(Pedigree {
            rows,
            pedigree_nan: pedigree_nan.to_string(),
        })
    }

    /// Read a whitespace-delimited pedigree file.
    ///
    /// With a `FID IID FATHER_ID MOTHER_ID` header, columns are found by name;
    /// without one, the first four columns are taken in PLINK `.fam` order.
    /// Parent columns equal to `pedigree_nan` become [`ParentLink::Missing`].
    pub fn from_file(filepath: &str, pedigree_nan: &str) -> Result<Pedigree, PrepError> {
        let input = InputFile::new(filepath);
        let has_header = input.has_header(PEDIGREE_COLUMNS[0])?;
        let table = input.whitespace_table(has_header)?;
        let [fid_col, iid_col, father_col, mother_col] = if has_header {
            [
                table.column(PEDIGREE_COLUMNS[0])?,
                table.column(PEDIGREE_COLUMNS[1])?,
                table.column(PEDIGREE_COLUMNS[2])?,
                table.column(PEDIGREE_COLUMNS[3])?,
            ]
        } else {
            table.require_width(PEDIGREE_COLUMNS.len())?;
            [0, 1, 2, 3]
        };

        let parent = |value: &str| {
            if value == pedigree_nan {
                ParentLink::Missing
            } else {
                ParentLink::Known(value.to_string())
            }
        };

        let mut rows = Vec::with_capacity(table.rows.len());
        for record in table.rows.iter() {
            let get = |col: usize| {
                record
                    .get(col)
                    .map(String::as_str)
                    .ok_or(PrepError::MissingField)
            };
            rows.push(PedigreeRow {
                fid: FamilyId::parse(get(fid_col)?)?,
                iid: get(iid_col)?.to_string(),
                father: parent(get(father_col)?),
                mother: parent(get(mother_col)?),
            });
        }
        log::info!("loaded {} pedigree rows from {}", rows.len(), filepath);
        Pedigree::new(rows, pedigree_nan)
    }

    pub fn rows(&self) -> &[PedigreeRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &PedigreeRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn pedigree_nan(&self) -> &str {
        &self.pedigree_nan
    }

    /// The set of individual ids present in the table.
    pub fn individual_ids(&self) -> HashSet<&str> {
        self.rows.iter().map(|row| row.iid.as_str()).collect()
    }

    /// Whether each row's father and mother are themselves individuals of the table.
    pub fn parent_status(&self) -> Vec<(bool, bool)> {
        let ids = self.individual_ids();
        let present = |link: &ParentLink| link.known().map_or(false, |id| ids.contains(id));
        self.rows
            .iter()
            .map(|row| (present(&row.father), present(&row.mother)))
            .collect()
    }

    /// Look up rows by individual id. Control rows share their source's id, so
    /// the first (organic) occurrence wins.
    pub fn by_id(&self) -> IndexMap<&str, &PedigreeRow> {
        let mut lookup = IndexMap::with_capacity(self.rows.len());
        for row in self.rows.iter() {
            lookup.entry(row.iid.as_str()).or_insert(row);
        }
        lookup
    }

    /// Append rows, e.g. generated control families.
    pub fn extend(&mut self, rows: impl IntoIterator<Item = PedigreeRow>) {
        self.rows.extend(rows);
    }

    /// The serialized pedigree: a header row followed by one row per individual.
    pub fn to_table(&self) -> Vec<Vec<String>> {
        let mut table = Vec::with_capacity(self.rows.len() + 1);
        table.push(PEDIGREE_COLUMNS.iter().map(|s| s.to_string()).collect());
        for row in self.rows.iter() {
            table.push(vec![
                row.fid.to_string(),
                row.iid.clone(),
                row.father_id(&self.pedigree_nan),
                row.mother_id(&self.pedigree_nan),
            ]);
        }
        table
    }

    /// Write the pedigree as a TSV with a header.
    ///
    /// If `filepath` is `None`, output is written to standard out.
    pub fn write_tsv(&self, filepath: Option<&str>) -> Result<(), PrepError> {
        let mut writer: Box<dyn Write> = match filepath {
            Some(path) => OutputFile::new(path).writer()?,
            None => Box::new(std::io::stdout()),
        };
        for row in self.to_table() {
            writeln!(writer, "{}", row.join("\t"))?;
        }
        writer.flush()?;
        Ok(())
    }
}
