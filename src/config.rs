use serde::Deserialize;

use crate::error::PrepError;
use crate::file::InputFile;
use crate::genotype::CoordinateWindow;
use crate::pedigree::DEFAULT_PEDIGREE_NAN;
use crate::Position;

/// Settings shared by the preparation steps of one run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Value of a pedigree parent column meaning the parent is unknown.
    pub pedigree_nan: String,
    /// Chromosomes to prepare. If empty, every chromosome of the SNP table.
    pub chromosomes: Vec<String>,
    /// Append control families to the pedigree.
    pub add_control: bool,
    /// Start of the genotype coordinate window (inclusive).
    pub start: Option<Position>,
    /// End of the genotype coordinate window (exclusive).
    pub end: Option<Position>,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            pedigree_nan: DEFAULT_PEDIGREE_NAN.to_string(),
            chromosomes: Vec::new(),
            add_control: false,
            start: None,
            end: None,
        }
    }
}

impl PrepConfig {
    /// Load a (possibly gzip-compressed) JSON config. Missing keys take their
    /// default values.
    pub fn from_json(filepath: &str) -> Result<PrepConfig, PrepError> {
        let reader = InputFile::new(filepath).reader()?;
        let config: PrepConfig = serde_json::from_reader(reader)?;
        log::info!("loaded config from {}", filepath);
        Ok(config)
    }

    pub fn window(&self) -> CoordinateWindow {
        CoordinateWindow {
            start: self.start,
            end: self.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prep.json");
        std::fs::write(&path, r#"{"chromosomes": ["21", "22"], "start": 1000}"#).unwrap();
        let config = PrepConfig::from_json(path.to_str().unwrap()).unwrap();
        assert_eq!(config.chromosomes, vec!["21", "22"]);
        assert_eq!(config.pedigree_nan, "0");
        assert!(!config.add_control);
        assert_eq!(
            config.window(),
            CoordinateWindow {
                start: Some(1000),
                end: None
            }
        );
    }

    #[test]
    fn test_malformed_json_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prep.json");
        std::fs::write(&path, r#"{"add_control": "yes"}"#).unwrap();
        assert!(matches!(
            PrepConfig::from_json(path.to_str().unwrap()),
            Err(PrepError::ConfigError(_))
        ));
    }
}
