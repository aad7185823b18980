//! Sibships: children of a family who share parents and lack at least one
//! genotyped parent.
use indexmap::IndexSet;
use std::collections::BTreeMap;

use crate::pedigree::{FamilyId, ParentLink, Pedigree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sibship {
    pub fid: FamilyId,
    pub father_id: String,
    pub mother_id: String,
    pub has_father: bool,
    pub has_mother: bool,
    /// Sibling ids, in pedigree order.
    pub iids: Vec<String>,
}

impl Sibship {
    /// Exactly one parent is genotyped.
    pub fn single_parent(&self) -> bool {
        self.has_father ^ self.has_mother
    }

    pub fn sib_count(&self) -> usize {
        self.iids.len()
    }

    /// Whether the sibship carries information for imputation.
    pub fn is_informative(&self) -> bool {
        self.sib_count() > 1 || self.single_parent()
    }

    /// Every unordered sibling pair, as `(later, earlier)` in sibling order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        (1..self.iids.len())
            .flat_map(move |i| (0..i).map(move |j| (self.iids[i].as_str(), self.iids[j].as_str())))
    }
}

/// The informative sibships of a pedigree, and the individuals to impute for.
#[derive(Debug, Clone, Default)]
pub struct Sibships {
    pub sibships: Vec<Sibship>,
    /// Ids of individuals missing at least one genotyped parent, whose parent
    /// links are not marked missing.
    pub target_ids: IndexSet<String>,
}

impl Sibships {
    pub fn len(&self) -> usize {
        self.sibships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sibships.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sibship> {
        self.sibships.iter()
    }
}

type SibshipKey = (FamilyId, String, String, bool, bool);

/// Group individuals lacking a genotyped parent into sibships.
///
/// Individuals whose father or mother is [`ParentLink::Missing`] are left out:
/// there is no parent to impute. Sibships are returned sorted by family and
/// parent ids.
pub fn extract_sibships(pedigree: &Pedigree) -> Sibships {
    let nan = pedigree.pedigree_nan();
    let mut groups: BTreeMap<SibshipKey, Vec<String>> = BTreeMap::new();
    let mut target_ids = IndexSet::new();

    for (row, (has_father, has_mother)) in pedigree.iter().zip(pedigree.parent_status()) {
        if has_father && has_mother {
            continue;
        }
        if row.father == ParentLink::Missing || row.mother == ParentLink::Missing {
            continue;
        }
        target_ids.insert(row.iid.clone());
        let key = (
            row.fid.clone(),
            row.father_id(nan),
            row.mother_id(nan),
            has_father,
            has_mother,
        );
        groups.entry(key).or_default().push(row.iid.clone());
    }

    let sibships: Vec<Sibship> = groups
        .into_iter()
        .map(|((fid, father_id, mother_id, has_father, has_mother), iids)| Sibship {
            fid,
            father_id,
            mother_id,
            has_father,
            has_mother,
            iids,
        })
        .filter(Sibship::is_informative)
        .collect();

    log::info!(
        "found {} informative sibships covering {} individuals without both parents",
        sibships.len(),
        target_ids.len()
    );
    Sibships {
        sibships,
        target_ids,
    }
}
