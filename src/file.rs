//! Encapsulates plaintext and gzip-compressed file input and output.
//!
//! The [`InputFile`] and [`OutputFile`] abstractions are for working with
//! possibly gzip-compressed tables. KING output is tab-delimited and is read
//! through [`InputFile::tsv_reader`]; PLINK-style tables (bim, pedigree and
//! age/sex files) separate columns by runs of whitespace, and are read into a
//! [`WhitespaceTable`].
//!
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::io::{self, BufWriter};
use std::io::{BufRead, BufReader, Read};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
    #[error("Column '{0}' not found in '{1}'")]
    MissingColumn(String, String),
    #[error("Row {0} of '{1}' has {2} fields, expected at least {3}")]
    ShortRow(usize, String, usize, usize),
}

/// Check if a file is a gzipped by looking for the magic numbers
fn is_gzipped_file(file_path: &str) -> io::Result<bool> {
    let mut file = File::open(file_path)?;
    let mut buffer = [0; 2];
    match file.read_exact(&mut buffer) {
        Ok(()) => Ok(buffer == [0x1f, 0x8b]),
        // files shorter than two bytes cannot be gzipped
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Represents an input file.
///
/// This abstracts how data is read in, allowing for both plaintext and gzip-compressed input
/// to be read through a common interface.
pub struct InputFile {
    pub filepath: String,
}

impl InputFile {
    /// Constructs a new `InputFile`.
    ///
    /// # Arguments
    ///
    /// * `filepath` - A string slice that holds the path to the file. Gzip-compressed
    /// files are detected by their magic number, not by their extension.
    pub fn new(filepath: &str) -> Self {
        Self {
            filepath: filepath.to_string(),
        }
    }

    /// Opens the file and returns a buffered reader, decompressing if needed.
    pub fn reader(&self) -> Result<BufReader<Box<dyn Read>>, FileError> {
        let file = File::open(&self.filepath)?;
        let is_gzipped = is_gzipped_file(&self.filepath)?;
        let reader: Box<dyn Read> = if is_gzipped {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(BufReader::new(reader))
    }

    /// Checks if the first line of the file matches the expected header.
    pub fn has_header(&self, expect: &str) -> Result<bool, FileError> {
        let mut buf_reader = self.reader()?;
        let mut first_line = String::new();
        buf_reader.read_line(&mut first_line)?;
        let has_header = first_line.starts_with(expect);
        Ok(has_header)
    }

    /// Opens a tab-delimited file with a header row as a [`csv::Reader`].
    ///
    /// Rows are allowed to have a varying number of fields, since KING appends
    /// optional columns depending on the analysis that produced the file.
    pub fn tsv_reader(&self) -> Result<csv::Reader<BufReader<Box<dyn Read>>>, FileError> {
        let reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(self.reader()?);
        Ok(reader)
    }

    /// Reads a whitespace-delimited table into memory.
    ///
    /// # Arguments
    ///
    /// * `has_header` - whether the first non-empty line holds the column names.
    pub fn whitespace_table(&self, has_header: bool) -> Result<WhitespaceTable, FileError> {
        let reader = self.reader()?;
        let mut header = None;
        let mut rows = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let fields: Vec<String> = line.split_whitespace().map(String::from).collect();
            if fields.is_empty() {
                continue;
            }
            if has_header && header.is_none() {
                header = Some(fields);
            } else {
                rows.push(fields);
            }
        }
        Ok(WhitespaceTable {
            filepath: self.filepath.clone(),
            header: header.unwrap_or_default(),
            rows,
        })
    }
}

/// An in-memory whitespace-delimited table.
#[derive(Debug, Clone)]
pub struct WhitespaceTable {
    pub filepath: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl WhitespaceTable {
    /// Returns the index of the named column.
    pub fn column(&self, name: &str) -> Result<usize, FileError> {
        self.header
            .iter()
            .position(|col| col == name)
            .ok_or_else(|| FileError::MissingColumn(name.to_string(), self.filepath.clone()))
    }

    /// Check every row has at least `min_fields` fields.
    pub fn require_width(&self, min_fields: usize) -> Result<(), FileError> {
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() < min_fields {
                return Err(FileError::ShortRow(
                    i + 1,
                    self.filepath.clone(),
                    row.len(),
                    min_fields,
                ));
            }
        }
        Ok(())
    }
}

/// Represents an output file.
///
/// This abstracts writing both plaintext and gzip-compressed files.
pub struct OutputFile {
    pub filepath: String,
}

impl OutputFile {
    /// Constructs a new `OutputFile`.
    ///
    /// # Arguments
    ///
    /// * `filepath` - A string slice that holds the path to the file. If the file extension is
    /// `.gz`, `OutputFile` will automatically write gzip-compressed output.
    pub fn new(filepath: &str) -> Self {
        Self {
            filepath: filepath.to_string(),
        }
    }

    /// Opens the file and returns a writer.
    ///
    /// If the file path ends with ".gz", the file is treated as gzip-compressed, and the
    /// function will handle compression automatically.
    pub fn writer(&self) -> Result<Box<dyn Write>, io::Error> {
        let outfile = &self.filepath;
        let is_gzip = outfile.ends_with(".gz");
        let writer: Box<dyn Write> = if is_gzip {
            Box::new(BufWriter::new(GzEncoder::new(
                File::create(outfile)?,
                Compression::default(),
            )))
        } else {
            Box::new(BufWriter::new(File::create(outfile)?))
        };
        Ok(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_gzip_round_trip_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.txt.gz");
        let path = path.to_str().unwrap();
        {
            let mut writer = OutputFile::new(path).writer().unwrap();
            writeln!(writer, "FID IID  age").unwrap();
            writeln!(writer, "f1\tA 40").unwrap();
            writeln!(writer).unwrap();
            writeln!(writer, "f1 B   10").unwrap();
        }
        let table = InputFile::new(path).whitespace_table(true).unwrap();
        assert_eq!(table.header, vec!["FID", "IID", "age"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["f1", "B", "10"]);
        assert_eq!(table.column("age").unwrap(), 2);
        assert!(matches!(
            table.column("sex"),
            Err(FileError::MissingColumn(_, _))
        ));
    }

    #[test]
    fn test_short_rows_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.bim");
        std::fs::write(&path, "1 rs1 0 100 A G\n1 rs2 0\n").unwrap();
        let table = InputFile::new(path.to_str().unwrap())
            .whitespace_table(false)
            .unwrap();
        assert!(matches!(
            table.require_width(6),
            Err(FileError::ShortRow(2, _, 3, 6))
        ));
    }

    #[test]
    fn test_has_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("king.kin0");
        std::fs::write(&path, "FID1\tID1\tFID2\tID2\tInfType\n").unwrap();
        let input = InputFile::new(path.to_str().unwrap());
        assert!(input.has_header("FID1").unwrap());
        assert!(!input.has_header("Chromosome").unwrap());
    }
}
