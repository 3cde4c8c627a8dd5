//! Score snapshot input.
//!
//! The CLI reads one [`ScoreSnapshot`] as JSON, from a file argument or
//! from piped stdin. Field names follow the editor's store (`camelCase`,
//! with `macrobeatGroupings` / `tonicSignPlacements` accepted as aliases).

use crate::model::error::InputError;
use crate::model::ScoreSnapshot;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use tracing::debug;

/// Where the score comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreSource {
    /// A JSON file on disk.
    File(PathBuf),
    /// JSON piped on stdin.
    Stdin,
}

impl ScoreSource {
    /// Read and parse the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `InputError::Io` for read failures and `InputError::Parse`
    /// for malformed JSON.
    pub fn load(&self) -> Result<ScoreSnapshot, InputError> {
        match self {
            ScoreSource::File(path) => {
                let file = std::fs::File::open(path).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        InputError::FileNotFound { path: path.clone() }
                    } else {
                        InputError::Io(e)
                    }
                })?;
                let score = parse_score(std::io::BufReader::new(file))?;
                debug!(path = %path.display(), "Loaded score file");
                Ok(score)
            }
            ScoreSource::Stdin => parse_score(std::io::stdin().lock()),
        }
    }
}

/// Pick the input source.
///
/// # Logic:
/// 1. If a file path is provided it must exist
/// 2. Otherwise stdin must be piped
///
/// # Errors
///
/// Returns `InputError::FileNotFound` for a missing file and
/// `InputError::NoInput` when stdin is an interactive terminal.
pub fn detect_score_source(file: Option<PathBuf>) -> Result<ScoreSource, InputError> {
    match file {
        Some(path) if path.exists() => Ok(ScoreSource::File(path)),
        Some(path) => Err(InputError::FileNotFound { path }),
        None if std::io::stdin().is_terminal() => Err(InputError::NoInput),
        None => Ok(ScoreSource::Stdin),
    }
}

/// Parse a snapshot from any reader.
///
/// # Errors
///
/// Returns `InputError::Parse` with the line and column of the first
/// problem.
pub fn parse_score<R: Read>(reader: R) -> Result<ScoreSnapshot, InputError> {
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Anchor, ModulationRatio};
    use std::fs;

    const SCORE: &str = r#"{
        "macrobeatGroupings": [2, 3, 2],
        "macrobeatBoundaryStyles": ["solid", "dashed", "anacrusis"],
        "tonicSignPlacements": [
            {"uuid": "t1", "row": 40, "columnIndex": 4, "preMacrobeatIndex": 0}
        ],
        "modulationMarkers": [
            {"id": "m1", "ratio": 0.6666666667, "measureIndex": 2}
        ],
        "totalRanks": 88
    }"#;

    #[test]
    fn parse_score_reads_store_field_names() {
        let score = parse_score(SCORE.as_bytes()).unwrap();
        assert_eq!(score.rhythm.groupings, vec![2, 3, 2]);
        assert_eq!(score.tonic_signs.len(), 1);
        assert_eq!(score.tonic_signs[0].pre_macrobeat_index, 0);
        assert_eq!(score.total_ranks, 88);

        let marker = &score.modulation_markers[0];
        assert_eq!(marker.ratio, ModulationRatio::Compress);
        assert_eq!(marker.anchor, Anchor::Measure(2));
        assert!(marker.active);
    }

    #[test]
    fn parse_score_reports_position_of_bad_json() {
        let err = parse_score("{\n  \"totalRanks\": ,\n}".as_bytes()).unwrap_err();
        assert!(
            matches!(err, InputError::Parse { line: 2, .. }),
            "unexpected error: {:?}",
            err
        );
    }

    #[test]
    fn parse_score_rejects_bad_ratio() {
        let json = r#"{"groupings": [2], "totalRanks": 10,
            "modulationMarkers": [{"id": "m", "ratio": 2.0, "xPosition": 10}]}"#;
        assert!(matches!(
            parse_score(json.as_bytes()),
            Err(InputError::Parse { .. })
        ));
    }

    #[test]
    fn detect_missing_file_is_file_not_found() {
        let path = PathBuf::from("/nonexistent/gridscale/score.json");
        let err = detect_score_source(Some(path.clone())).unwrap_err();
        assert!(matches!(err, InputError::FileNotFound { path: p } if p == path));
    }

    #[test]
    fn file_source_loads_snapshot() {
        let path = std::env::temp_dir().join("gridscale_source_test_score.json");
        fs::write(&path, SCORE).unwrap();

        let source = detect_score_source(Some(path.clone())).unwrap();
        let result = source.load();
        let _ = fs::remove_file(&path);

        assert_eq!(source, ScoreSource::File(path));
        assert_eq!(result.unwrap().rhythm.len(), 3);
    }
}
