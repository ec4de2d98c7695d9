//! Loosely-typed tabular rows, as handed over by a spreadsheet decoder.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;

/// One decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(n) => !n.is_finite(),
        }
    }

    /// Cell rendered as trimmed text; integral numbers lose the `.0`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) => {
                let t = s.trim();
                (!t.is_empty()).then(|| t.to_string())
            }
            Self::Number(n) if !n.is_finite() => None,
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Self::Number(n) => Some(n.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

pub type RawRow = HashMap<String, CellValue>;

/// Header list plus rows keyed by header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Decode CSV text. Every non-blank cell stays text; typing is the
    /// classifier's job, so identifiers such as `00123` keep their zeros.
    pub fn from_csv(data: &str) -> Result<Self, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: RawRow = headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), CellValue::from(record.get(i).unwrap_or(""))))
                .collect();
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }
}
