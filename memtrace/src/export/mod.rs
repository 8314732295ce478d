//! JSON export of query reports.
//!
//! The wire shape is a flattened mirror of the in-memory reports:
//! addresses as hex strings, access masks as their rendered symbols,
//! shape hashes decoded to their offset sequences. Downstream tooling
//! should not need this crate's types to consume a report.

use crate::domain::ExportError;
use crate::pattern::{describe, MatchInfo, MatchKind};
use crate::query::{AccessMatrix, LocalityReport, PatternReport};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub matrix: Vec<JsonMatrixRow>,
    pub locality: JsonLocality,
    pub patterns: Vec<JsonPatternRow>,
}

#[derive(Debug, Serialize)]
pub struct JsonMatrixRow {
    pub name: String,
    pub location: String,
    pub size: u64,
    pub accesses: u64,
    /// thread id -> { access symbol, count }
    pub threads: BTreeMap<u32, JsonThreadCell>,
}

#[derive(Debug, Serialize)]
pub struct JsonThreadCell {
    pub access: &'static str,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct JsonLocality {
    pub spatial: f64,
    pub temporal: f64,
}

#[derive(Debug, Serialize)]
pub struct JsonPatternRow {
    pub variable: String,
    pub matches: Vec<JsonMatch>,
    pub shapes: Vec<JsonShape>,
}

#[derive(Debug, Serialize)]
pub struct JsonMatch {
    pub kind: String,
    pub begin_addr: String,
    pub end_addr: String,
    pub count: u32,
}

#[derive(Debug, Serialize)]
pub struct JsonShape {
    pub shape: String,
    pub name: String,
    pub count: u32,
}

impl JsonReport {
    #[must_use]
    pub fn new(
        matrix: &AccessMatrix,
        locality: LocalityReport,
        patterns: &[PatternReport],
    ) -> Self {
        let matrix_rows = matrix
            .entries()
            .values()
            .map(|entry| JsonMatrixRow {
                name: entry.name.clone(),
                location: entry.src_loc.to_string(),
                size: entry.size,
                accesses: entry.total_accesses(),
                threads: entry
                    .threads
                    .iter()
                    .map(|(&thread_id, cell)| {
                        (thread_id, JsonThreadCell { access: cell.mask.symbol(), count: cell.count })
                    })
                    .collect(),
            })
            .collect();
        let pattern_rows = patterns
            .iter()
            .map(|report| JsonPatternRow {
                variable: report.name.clone(),
                matches: report.matches.iter().map(json_match).collect(),
                shapes: report
                    .shapes
                    .iter()
                    .map(|shape| JsonShape {
                        shape: describe(shape.hash),
                        name: shape.name.clone(),
                        count: shape.count,
                    })
                    .collect(),
            })
            .collect();
        Self {
            matrix: matrix_rows,
            locality: JsonLocality { spatial: locality.spatial, temporal: locality.temporal },
            patterns: pattern_rows,
        }
    }
}

fn json_match(info: &MatchInfo) -> JsonMatch {
    let kind = match info.kind {
        MatchKind::Consecutive { stride } => format!("consecutive/{stride}"),
        MatchKind::Stat { hash } => describe(hash),
        MatchKind::Rw => "same-address".to_string(),
    };
    JsonMatch {
        kind,
        begin_addr: format!("{:#x}", info.begin_addr),
        end_addr: format!("{:#x}", info.end_addr),
        count: info.count,
    }
}

/// Write a report as pretty-printed JSON.
pub fn export_json(path: impl AsRef<Path>, report: &JsonReport) -> Result<(), ExportError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VarId;

    #[test]
    fn test_report_serializes_symbols_and_hex() {
        let matrix = AccessMatrix::new();
        let patterns = vec![PatternReport {
            var: VarId(0),
            name: "a".to_string(),
            matches: vec![MatchInfo {
                kind: MatchKind::Consecutive { stride: 8 },
                begin_addr: 0x1000,
                end_addr: 0x1018,
                count: 3,
            }],
            shapes: Vec::new(),
        }];
        let report = JsonReport::new(
            &matrix,
            LocalityReport { spatial: 0.5, temporal: 0.25 },
            &patterns,
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["patterns"][0]["matches"][0]["kind"], "consecutive/8");
        assert_eq!(json["patterns"][0]["matches"][0]["begin_addr"], "0x1000");
        assert_eq!(json["locality"]["spatial"], 0.5);
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = JsonReport::new(
            &AccessMatrix::new(),
            LocalityReport { spatial: 0.0, temporal: 0.0 },
            &[],
        );
        export_json(&path, &report).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"locality\""));
    }
}
