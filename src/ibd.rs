//! IBD segments between pairs of individuals.
//!
//! Raw IBD calls are sparse: they only list the stretches where a pair shares
//! one or two haplotypes. Imputation needs, for every pair, a list of segments
//! that tiles the analyzable part of the chromosome exactly, so the calls are
//! reconciled against [`ReferenceIntervals`] and the gaps filled with IBD0.
use genomap::GenomeMap;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;
use std::io::Write;

use crate::error::PrepError;
use crate::file::InputFile;
use crate::sibship::Sibships;
use crate::snps::SnpTable;
use crate::Position;

/// Column names of the reconciled IBD output.
pub const IBD_COLUMNS: [&str; 6] = ["chrom", "ID1", "ID2", "start", "end", "IBDType"];

/// An ordered pair of individual ids.
pub type PairKey = (String, String);

/// The number of haplotypes a pair shares identical by descent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IbdType {
    Zero,
    One,
    Two,
}

impl IbdType {
    pub fn from_code(code: u8) -> Result<IbdType, PrepError> {
        match code {
            0 => Ok(IbdType::Zero),
            1 => Ok(IbdType::One),
            2 => Ok(IbdType::Two),
            _ => Err(PrepError::InvalidIbdType(code.to_string())),
        }
    }

    /// Parse either a numeric type or KING's `IBD0`/`IBD1`/`IBD2` labels.
    pub fn parse(value: &str) -> Result<IbdType, PrepError> {
        let code = value.strip_prefix("IBD").unwrap_or(value);
        let code: u8 = code
            .parse()
            .map_err(|_| PrepError::InvalidIbdType(value.to_string()))?;
        IbdType::from_code(code)
    }

    pub fn code(&self) -> u8 {
        match self {
            IbdType::Zero => 0,
            IbdType::One => 1,
            IbdType::Two => 2,
        }
    }
}

impl fmt::Display for IbdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IbdSegment {
    pub start: Position,
    pub end: Position,
    pub ibd_type: IbdType,
}

impl IbdSegment {
    pub fn new(start: Position, end: Position, ibd_type: IbdType) -> Self {
        Self {
            start,
            end,
            ibd_type,
        }
    }

    pub fn width(&self) -> Position {
        self.end - self.start
    }
}

/// The sorted, non-overlapping spans of a chromosome that can be analyzed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceIntervals {
    intervals: Vec<(Position, Position)>,
}

impl ReferenceIntervals {
    pub fn new(mut intervals: Vec<(Position, Position)>) -> Result<Self, PrepError> {
        intervals.sort_unstable();
        for (i, &(start, end)) in intervals.iter().enumerate() {
            if end < start {
                return Err(PrepError::OverlappingIntervals(start));
            }
            if i > 0 && start < intervals[i - 1].1 {
                return Err(PrepError::OverlappingIntervals(start));
            }
        }
        Ok(Self { intervals })
    }

    pub fn intervals(&self) -> &[(Position, Position)] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Total width of all intervals.
    pub fn total_span(&self) -> Position {
        self.intervals.iter().map(|(start, end)| end - start).sum()
    }

    /// Segments covering every interval with IBD0, the default for a pair
    /// with no IBD calls.
    pub fn unrelated(&self) -> Vec<IbdSegment> {
        self.intervals
            .iter()
            .map(|&(start, end)| IbdSegment::new(start, end, IbdType::Zero))
            .collect()
    }
}

/// Raw IBD calls of one chromosome, grouped by pair in order of appearance.
#[derive(Debug, Clone, Default)]
pub struct RawIbd {
    pairs: IndexMap<PairKey, Vec<IbdSegment>>,
}

impl RawIbd {
    pub fn add(&mut self, id1: &str, id2: &str, segment: IbdSegment) {
        self.pairs
            .entry((id1.to_string(), id2.to_string()))
            .or_default()
            .push(segment);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &Vec<IbdSegment>)> {
        self.pairs.iter()
    }
}

/// Tile `reference` with the raw `segments` of one pair, filling gaps with IBD0.
///
/// Raw segments must each fall inside a single reference interval and must not
/// overlap; anything else means the calls and the reference disagree, which is
/// an error.
pub fn reconcile_pair(
    id1: &str,
    id2: &str,
    segments: &[IbdSegment],
    reference: &ReferenceIntervals,
) -> Result<Vec<IbdSegment>, PrepError> {
    let intervals = reference.intervals();
    let mut segments = segments.to_vec();
    segments.sort_by_key(|seg| seg.start);

    let Some(&(mut start, mut end)) = intervals.first() else {
        return match segments.first() {
            Some(seg) => Err(PrepError::SegmentAfterIntervals(
                id1.to_string(),
                id2.to_string(),
                seg.start,
            )),
            None => Ok(Vec::new()),
        };
    };

    let mut tiled = Vec::with_capacity(2 * segments.len() + intervals.len());
    let mut current = 0;
    let mut covered = start;
    for seg in segments.iter() {
        if seg.end < seg.start {
            return Err(PrepError::InvalidSegment(
                id1.to_string(),
                id2.to_string(),
                seg.start,
                seg.end,
            ));
        }
        // move to the interval holding this segment, filling what is skipped
        while seg.start > end {
            if covered < end {
                tiled.push(IbdSegment::new(covered, end, IbdType::Zero));
            }
            current += 1;
            match intervals.get(current) {
                Some(&(next_start, next_end)) => {
                    start = next_start;
                    end = next_end;
                    covered = start;
                }
                None => {
                    return Err(PrepError::SegmentAfterIntervals(
                        id1.to_string(),
                        id2.to_string(),
                        seg.start,
                    ))
                }
            }
        }
        if seg.start < start {
            return Err(PrepError::SegmentBeforeInterval(
                id1.to_string(),
                id2.to_string(),
                seg.start,
                start,
                end,
            ));
        }
        if seg.start < covered {
            return Err(PrepError::OverlappingSegments(
                id1.to_string(),
                id2.to_string(),
                seg.start,
            ));
        }
        if seg.end > end {
            return Err(PrepError::SegmentPastInterval(
                id1.to_string(),
                id2.to_string(),
                seg.end,
                start,
                end,
            ));
        }
        if seg.start > covered {
            tiled.push(IbdSegment::new(covered, seg.start, IbdType::Zero));
        }
        tiled.push(*seg);
        covered = seg.end;
    }

    if covered < end {
        tiled.push(IbdSegment::new(covered, end, IbdType::Zero));
    }
    tiled.extend(
        intervals[current + 1..]
            .iter()
            .map(|&(start, end)| IbdSegment::new(start, end, IbdType::Zero)),
    );
    Ok(tiled)
}

/// Reconciled segments of one chromosome, keyed by pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IbdTable {
    pairs: IndexMap<PairKey, Vec<IbdSegment>>,
}

impl IbdTable {
    fn key(id1: &str, id2: &str) -> PairKey {
        (id1.to_string(), id2.to_string())
    }

    /// Segments of a pair, looked up in either orientation.
    pub fn get(&self, id1: &str, id2: &str) -> Option<&[IbdSegment]> {
        self.pairs
            .get(&Self::key(id1, id2))
            .or_else(|| self.pairs.get(&Self::key(id2, id1)))
            .map(|segments| segments.as_slice())
    }

    pub fn contains(&self, id1: &str, id2: &str) -> bool {
        self.get(id1, id2).is_some()
    }

    /// The IBD type of a pair at a physical position. Segment ends are
    /// inclusive; at a shared boundary the later segment wins.
    pub fn ibd_type_at(&self, id1: &str, id2: &str, position: Position) -> Option<IbdType> {
        let segments = self.get(id1, id2)?;
        let idx = segments.partition_point(|seg| seg.start <= position);
        let seg = segments.get(idx.checked_sub(1)?)?;
        (position <= seg.end).then_some(seg.ibd_type)
    }

    /// Segments of a pair as a flat `[start, end, type, start, end, type, ...]` list.
    pub fn flattened(&self, id1: &str, id2: &str) -> Option<Vec<Position>> {
        let segments = self.get(id1, id2)?;
        Some(
            segments
                .iter()
                .flat_map(|seg| [seg.start, seg.end, seg.ibd_type.code() as Position])
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &Vec<IbdSegment>)> {
        self.pairs.iter()
    }

    /// Write one line per segment: chromosome, ids, start, end and IBD type.
    pub fn write_tsv(&self, writer: &mut dyn Write, chrom: &str) -> Result<(), PrepError> {
        for ((id1, id2), segments) in self.pairs.iter() {
            for seg in segments {
                writeln!(
                    writer,
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    chrom, id1, id2, seg.start, seg.end, seg.ibd_type
                )?;
            }
        }
        Ok(())
    }
}

/// Write the reconciled segments of `chromosomes` as a TSV with an
/// [`IBD_COLUMNS`] header, one segment per line.
pub fn write_ibd_tsv(
    writer: &mut dyn Write,
    tables: &GenomeMap<IbdTable>,
    chromosomes: &[String],
) -> Result<(), PrepError> {
    writeln!(writer, "{}", IBD_COLUMNS.join("\t"))?;
    for chrom in chromosomes {
        let table = tables
            .get(chrom)
            .ok_or_else(|| PrepError::NoChrom(chrom.clone()))?;
        table.write_tsv(writer, chrom)?;
    }
    Ok(())
}

/// Reconcile every pair with raw calls, then give sibling pairs without any
/// call the all-IBD0 tiling.
pub fn reconcile(
    raw: &RawIbd,
    reference: &ReferenceIntervals,
    sibships: &Sibships,
) -> Result<IbdTable, PrepError> {
    let mut table = IbdTable::default();
    for ((id1, id2), segments) in raw.iter() {
        let tiled = reconcile_pair(id1, id2, segments, reference)?;
        table.pairs.insert((id1.clone(), id2.clone()), tiled);
    }

    let mut defaulted = 0;
    for sibship in sibships.iter() {
        for (sib1, sib2) in sibship.pairs() {
            if !table.contains(sib1, sib2) {
                table
                    .pairs
                    .insert(IbdTable::key(sib1, sib2), reference.unrelated());
                defaulted += 1;
            }
        }
    }
    log::info!(
        "reconciled {} pairs with IBD calls, {} sibling pairs default to IBD0",
        raw.len(),
        defaulted
    );
    Ok(table)
}

/// Reconcile each requested chromosome. Chromosomes without reference
/// intervals are an error; chromosomes without calls give all-IBD0 sibling pairs.
pub fn reconcile_genome(
    raw: &GenomeMap<RawIbd>,
    reference: &GenomeMap<ReferenceIntervals>,
    chromosomes: &[String],
    sibships: &Sibships,
) -> Result<GenomeMap<IbdTable>, PrepError> {
    let empty = RawIbd::default();
    let mut tables = GenomeMap::new();
    for chrom in chromosomes {
        let intervals = reference
            .get(chrom)
            .ok_or_else(|| PrepError::NoChrom(chrom.clone()))?;
        let calls = raw.get(chrom).unwrap_or(&empty);
        log::info!("reconciling IBD segments on chromosome {}", chrom);
        tables.insert(chrom, reconcile(calls, intervals, sibships)?)?;
    }
    Ok(tables)
}

#[derive(Debug, Deserialize)]
struct KingSegmentRow {
    #[serde(rename = "Chr")]
    chrom: String,
    #[serde(rename = "StartSNP")]
    start_snp: String,
    #[serde(rename = "StopSNP")]
    stop_snp: String,
}

#[derive(Debug, Deserialize)]
struct KingIbdRow {
    #[serde(rename = "ID1")]
    id1: String,
    #[serde(rename = "ID2")]
    id2: String,
    #[serde(rename = "IBDType")]
    ibd_type: String,
    #[serde(rename = "Chr")]
    chrom: String,
    #[serde(rename = "StartSNP")]
    start_snp: String,
    #[serde(rename = "StopSNP")]
    stop_snp: String,
}

#[derive(Debug, Deserialize)]
struct IbdRow {
    #[serde(rename = "ID1")]
    id1: String,
    #[serde(rename = "ID2")]
    id2: String,
    #[serde(rename = "IBDType")]
    ibd_type: String,
    #[serde(rename = "Chr")]
    chrom: String,
    start_coordinate: Position,
    stop_coordinate: Position,
}

/// Read the reference intervals from a KING segments file, translating the
/// boundary SNP ids into coordinates.
pub fn read_king_segments(
    filepath: &str,
    snps: &SnpTable,
    chromosomes: &[String],
) -> Result<GenomeMap<ReferenceIntervals>, PrepError> {
    let mut rdr = InputFile::new(filepath).tsv_reader()?;
    let mut by_chrom: IndexMap<String, Vec<(Position, Position)>> = IndexMap::new();
    for result in rdr.deserialize() {
        let row: KingSegmentRow = result?;
        if !chromosomes.contains(&row.chrom) {
            continue;
        }
        let start = snps.coordinate(&row.start_snp)?;
        let end = snps.coordinate(&row.stop_snp)?;
        by_chrom.entry(row.chrom).or_default().push((start, end));
    }

    let mut reference = GenomeMap::new();
    for (chrom, intervals) in by_chrom {
        reference.insert(&chrom, ReferenceIntervals::new(intervals)?)?;
    }
    Ok(reference)
}

/// Read KING IBD segment calls, translating the boundary SNP ids into coordinates.
pub fn read_king_ibd(
    filepath: &str,
    snps: &SnpTable,
    chromosomes: &[String],
) -> Result<GenomeMap<RawIbd>, PrepError> {
    let mut rdr = InputFile::new(filepath).tsv_reader()?;
    let mut raw: GenomeMap<RawIbd> = GenomeMap::new();
    for result in rdr.deserialize() {
        let row: KingIbdRow = result?;
        if !chromosomes.contains(&row.chrom) {
            continue;
        }
        let segment = IbdSegment::new(
            snps.coordinate(&row.start_snp)?,
            snps.coordinate(&row.stop_snp)?,
            IbdType::parse(&row.ibd_type)?,
        );
        raw.entry_or_default(&row.chrom)
            .add(&row.id1, &row.id2, segment);
    }
    Ok(raw)
}

/// Read pre-computed IBD segments already expressed in physical coordinates.
pub fn read_ibd(filepath: &str, chromosomes: &[String]) -> Result<GenomeMap<RawIbd>, PrepError> {
    let mut rdr = InputFile::new(filepath).tsv_reader()?;
    let mut raw: GenomeMap<RawIbd> = GenomeMap::new();
    for result in rdr.deserialize() {
        let row: IbdRow = result?;
        if !chromosomes.contains(&row.chrom) {
            continue;
        }
        let segment = IbdSegment::new(
            row.start_coordinate,
            row.stop_coordinate,
            IbdType::parse(&row.ibd_type)?,
        );
        raw.entry_or_default(&row.chrom)
            .add(&row.id1, &row.id2, segment);
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pedigree::FamilyId;
    use crate::sibship::Sibship;

    fn seg(start: Position, end: Position, code: u8) -> IbdSegment {
        IbdSegment::new(start, end, IbdType::from_code(code).unwrap())
    }

    fn sibships(iids: &[&str]) -> Sibships {
        Sibships {
            sibships: vec![Sibship {
                fid: FamilyId::Organic("1".into()),
                father_id: "1___P".into(),
                mother_id: "1___M".into(),
                has_father: false,
                has_mother: false,
                iids: iids.iter().map(|s| s.to_string()).collect(),
            }],
            target_ids: iids.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn assert_tiles(tiled: &[IbdSegment], reference: &ReferenceIntervals) {
        let total: Position = tiled.iter().map(IbdSegment::width).sum();
        assert_eq!(total, reference.total_span());
        for pair in tiled.windows(2) {
            assert!(pair[0].start <= pair[1].start);
            assert!(pair[0].end <= pair[1].start, "overlap: {:?}", pair);
        }
    }

    #[test]
    fn test_single_interval_fill() {
        let reference = ReferenceIntervals::new(vec![(0, 500)]).unwrap();
        let tiled = reconcile_pair("S1", "S2", &[seg(100, 200, 2)], &reference).unwrap();
        assert_eq!(tiled, vec![seg(0, 100, 0), seg(100, 200, 2), seg(200, 500, 0)]);
    }

    #[test]
    fn test_multiple_intervals_and_skipped_intervals() {
        let reference =
            ReferenceIntervals::new(vec![(600, 900), (0, 100), (200, 300), (400, 500)]).unwrap();
        let raw = [seg(650, 900, 1), seg(0, 50, 1)];
        let tiled = reconcile_pair("A", "B", &raw, &reference).unwrap();
        assert_eq!(
            tiled,
            vec![
                seg(0, 50, 1),
                seg(50, 100, 0),
                seg(200, 300, 0),
                seg(400, 500, 0),
                seg(600, 650, 0),
                seg(650, 900, 1),
            ]
        );
        assert_tiles(&tiled, &reference);
    }

    #[test]
    fn test_adjacent_segments_without_filler() {
        let reference = ReferenceIntervals::new(vec![(0, 300)]).unwrap();
        let raw = [seg(100, 300, 2), seg(0, 100, 1)];
        let tiled = reconcile_pair("A", "B", &raw, &reference).unwrap();
        assert_eq!(tiled, vec![seg(0, 100, 1), seg(100, 300, 2)]);
    }

    #[test]
    fn test_inconsistent_segments_are_fatal() {
        let reference = ReferenceIntervals::new(vec![(100, 200), (300, 400)]).unwrap();
        assert!(matches!(
            reconcile_pair("A", "B", &[seg(500, 600, 1)], &reference),
            Err(PrepError::SegmentAfterIntervals(_, _, 500))
        ));
        assert!(matches!(
            reconcile_pair("A", "B", &[seg(50, 150, 1)], &reference),
            Err(PrepError::SegmentBeforeInterval(_, _, 50, 100, 200))
        ));
        assert!(matches!(
            reconcile_pair("A", "B", &[seg(250, 350, 1)], &reference),
            Err(PrepError::SegmentBeforeInterval(_, _, 250, 300, 400))
        ));
        assert!(matches!(
            reconcile_pair("A", "B", &[seg(150, 250, 1)], &reference),
            Err(PrepError::SegmentPastInterval(_, _, 250, 100, 200))
        ));
        assert!(matches!(
            reconcile_pair("A", "B", &[seg(100, 180, 1), seg(150, 200, 2)], &reference),
            Err(PrepError::OverlappingSegments(_, _, 150))
        ));
    }

    #[test]
    fn test_reconcile_is_deterministic() {
        let reference = ReferenceIntervals::new(vec![(0, 100), (200, 300)]).unwrap();
        let mut raw = RawIbd::default();
        raw.add("A", "B", seg(210, 250, 2));
        raw.add("A", "B", seg(10, 20, 1));
        let sibs = sibships(&["A", "B", "C"]);
        let first = reconcile(&raw, &reference, &sibs).unwrap();
        let second = reconcile(&raw, &reference, &sibs).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_siblings_without_calls_are_unrelated() {
        let reference = ReferenceIntervals::new(vec![(0, 100), (200, 300)]).unwrap();
        let mut raw = RawIbd::default();
        raw.add("B", "A", seg(10, 20, 1));
        let table = reconcile(&raw, &reference, &sibships(&["A", "B", "C"])).unwrap();
        assert_eq!(table.len(), 3);
        // the (B, A) call covers the A-B pair in either orientation
        assert_eq!(table.get("A", "B").unwrap()[1], seg(10, 20, 1));
        assert_eq!(table.get("C", "A").unwrap(), reference.unrelated().as_slice());
        assert_eq!(table.get("B", "C").unwrap(), reference.unrelated().as_slice());
        for (_, tiled) in table.iter() {
            assert_tiles(tiled, &reference);
        }
    }

    #[test]
    fn test_lookups() {
        let reference = ReferenceIntervals::new(vec![(0, 500)]).unwrap();
        let mut raw = RawIbd::default();
        raw.add("S1", "S2", seg(100, 200, 2));
        let table = reconcile(&raw, &reference, &Sibships::default()).unwrap();
        assert_eq!(table.ibd_type_at("S2", "S1", 150), Some(IbdType::Two));
        assert_eq!(table.ibd_type_at("S1", "S2", 250), Some(IbdType::Zero));
        assert_eq!(table.ibd_type_at("S1", "S2", 600), None);
        assert_eq!(table.ibd_type_at("S1", "S3", 150), None);
        assert_eq!(
            table.flattened("S1", "S2").unwrap(),
            vec![0, 100, 0, 100, 200, 2, 200, 500, 0]
        );
    }

    #[test]
    fn test_write_ibd_tsv() {
        let reference = ReferenceIntervals::new(vec![(0, 300), (400, 600)]).unwrap();
        let mut raw = RawIbd::default();
        raw.add("S1", "S2", seg(100, 200, 2));
        let mut tables = GenomeMap::new();
        tables
            .insert("1", reconcile(&raw, &reference, &sibships(&["S1", "S2"])).unwrap())
            .unwrap();

        let mut buffer: Vec<u8> = Vec::new();
        write_ibd_tsv(&mut buffer, &tables, &["1".to_string()]).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "chrom\tID1\tID2\tstart\tend\tIBDType",
                "1\tS1\tS2\t0\t100\t0",
                "1\tS1\tS2\t100\t200\t2",
                "1\tS1\tS2\t200\t300\t0",
                "1\tS1\tS2\t400\t600\t0",
            ]
        );

        let mut buffer: Vec<u8> = Vec::new();
        assert!(matches!(
            write_ibd_tsv(&mut buffer, &tables, &["2".to_string()]),
            Err(PrepError::NoChrom(chrom)) if chrom == "2"
        ));
    }

    #[test]
    fn test_ibd_type_parse() {
        assert_eq!(IbdType::parse("IBD2").unwrap(), IbdType::Two);
        assert_eq!(IbdType::parse("1").unwrap(), IbdType::One);
        assert!(IbdType::parse("IBD3").is_err());
        assert!(IbdType::parse("HBD").is_err());
    }

    #[test]
    fn test_overlapping_reference_rejected() {
        assert!(matches!(
            ReferenceIntervals::new(vec![(0, 100), (50, 200)]),
            Err(PrepError::OverlappingIntervals(50))
        ));
    }

    #[test]
    fn test_king_files() {
        let snps = SnpTable::from_bim("tests/data/sample.bim").unwrap();
        let chroms = vec!["1".to_string()];
        let reference = read_king_segments("tests/data/sample.segments", &snps, &chroms).unwrap();
        let intervals = reference.get("1").unwrap();
        assert_eq!(intervals.intervals(), &[(0, 300), (400, 600)]);

        let raw = read_king_ibd("tests/data/sample.seg", &snps, &chroms).unwrap();
        let sibs = sibships(&["S1", "S2"]);
        let tables = reconcile_genome(&raw, &reference, &chroms, &sibs).unwrap();
        let table = tables.get("1").unwrap();
        assert_eq!(
            table.get("S1", "S2").unwrap(),
            &[
                seg(0, 100, 0),
                seg(100, 200, 2),
                seg(200, 300, 0),
                seg(400, 500, 1),
                seg(500, 600, 0),
            ]
        );
        assert_eq!(
            table.get("C1", "C2").unwrap(),
            &[seg(0, 300, 1), seg(400, 600, 0)]
        );
    }

    #[test]
    fn test_precomputed_ibd_filters_chromosomes() {
        let raw = read_ibd("tests/data/sample.ibd", &["1".to_string()]).unwrap();
        assert_eq!(raw.len(), 1);
        let calls = raw.get("1").unwrap();
        let (_, segments) = calls.iter().next().unwrap();
        assert_eq!(segments, &vec![seg(100, 200, 2), seg(400, 500, 1)]);
    }

    #[test]
    fn test_missing_reference_chromosome() {
        let reference: GenomeMap<ReferenceIntervals> = GenomeMap::new();
        let raw: GenomeMap<RawIbd> = GenomeMap::new();
        assert!(matches!(
            reconcile_genome(&raw, &reference, &["2".to_string()], &Sibships::default()),
            Err(PrepError::NoChrom(chrom)) if chrom == "2"
        ));
    }
}
