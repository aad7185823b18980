//! Control families for measuring imputation accuracy.
//!
//! Every family with both parents genotyped and more than one child is copied
//! three times, with both parents, the mother, or the father withheld. Imputed
//! genotypes of the withheld parents can then be compared with the observed ones.
use std::collections::{BTreeSet, HashMap};

use crate::pedigree::{ControlKind, FamilyId, ParentLink, Pedigree, PedigreeRow};

/// Build the control rows for `pedigree`, in the order no-parent, father-only,
/// mother-only.
pub fn control_families(pedigree: &Pedigree) -> Vec<PedigreeRow> {
    let both_parents: Vec<&PedigreeRow> = pedigree
        .iter()
        .zip(pedigree.parent_status())
        .filter(|(row, (has_father, has_mother))| {
            *has_father && *has_mother && !row.fid.is_control()
        })
        .map(|(row, _)| row)
        .collect();

    // sibship sizes per (family, father, mother)
    let mut sib_counts: HashMap<(&FamilyId, &ParentLink, &ParentLink), usize> = HashMap::new();
    for row in both_parents.iter() {
        *sib_counts
            .entry((&row.fid, &row.father, &row.mother))
            .or_default() += 1;
    }
    let families: BTreeSet<&FamilyId> = sib_counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|((fid, _, _), _)| *fid)
        .collect();

    let mut controls = Vec::new();
    for kind in ControlKind::ALL {
        for row in both_parents.iter().filter(|row| families.contains(&row.fid)) {
            controls.push(PedigreeRow {
                fid: FamilyId::Control(kind, row.fid.to_string()),
                iid: row.iid.clone(),
                father: if kind.keeps_father() {
                    row.father.clone()
                } else {
                    ParentLink::Placeholder
                },
                mother: if kind.keeps_mother() {
                    row.mother.clone()
                } else {
                    ParentLink::Placeholder
                },
            });
        }
    }
    controls
}

/// Return a copy of `pedigree` with its control families appended.
pub fn add_control(pedigree: &Pedigree) -> Pedigree {
    let controls = control_families(pedigree);
    log::info!("added {} control rows to the pedigree", controls.len());
    let mut with_controls = pedigree.clone();
    with_controls.extend(controls);
    with_controls
}
