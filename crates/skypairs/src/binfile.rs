//! Resolution of the caller's bin specification into a concrete file.
//!
//! The engine boundary speaks files: a whitespace-separated two-column
//! `(min, max)` row per separation bin. Callers can hand over such a file
//! directly, or pass a flat edge sequence that gets materialized as a
//! temporary file for the duration of one engine call.

use crate::error::Error;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The caller-facing bin specification.
#[derive(Clone, Debug)]
pub enum BinSpec {
    /// path to an existing two-column bin file
    File(PathBuf),
    /// explicit bin edges; need not be pre-sorted
    Edges(Vec<f64>),
}

impl BinSpec {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn from_edges(edges: impl Into<Vec<f64>>) -> Self {
        Self::Edges(edges.into())
    }
}

/// A bin specification resolved down to a path the engine can open.
///
/// When the specification was an edge sequence, `temp` owns the backing
/// temporary file; dropping this value deletes it. The adapter drops the
/// resolved value right after the engine call returns, so the file is gone
/// on the success and failure paths alike.
pub struct ResolvedBins {
    path: PathBuf,
    temp: Option<NamedTempFile>,
}

impl ResolvedBins {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

/// Resolve a [`BinSpec`] into a concrete file path.
pub fn resolve_bins(spec: &BinSpec) -> Result<ResolvedBins, Error> {
    match spec {
        BinSpec::File(path) => {
            if !path.is_file() {
                return Err(Error::bin_spec(format!(
                    "bin file {} does not exist",
                    path.display()
                )));
            }
            Ok(ResolvedBins {
                path: path.clone(),
                temp: None,
            })
        }
        BinSpec::Edges(edges) => {
            let rows = edges_to_rows(edges)?;
            let mut temp = NamedTempFile::new()
                .map_err(|err| Error::bin_spec(format!("could not create a temporary file: {err}")))?;
            for (lo, hi) in rows {
                writeln!(temp, "{lo} {hi}")
                    .map_err(|err| Error::bin_spec(format!("could not write bin edges: {err}")))?;
            }
            temp.flush()
                .map_err(|err| Error::bin_spec(format!("could not write bin edges: {err}")))?;
            Ok(ResolvedBins {
                path: temp.path().to_path_buf(),
                temp: Some(temp),
            })
        }
    }
}

/// Sort an edge sequence and pair consecutive edges into `(min, max)` rows.
fn edges_to_rows(edges: &[f64]) -> Result<Vec<(f64, f64)>, Error> {
    if edges.len() < 2 {
        return Err(Error::bin_spec(
            "an edge sequence needs at least two entries".to_owned(),
        ));
    } else if edges.iter().any(|v| !v.is_finite()) {
        return Err(Error::bin_spec("bin edges must be finite".to_owned()));
    }
    let mut sorted = edges.to_vec();
    sorted.sort_by(f64::total_cmp);
    if sorted.windows(2).any(|w| w[0] == w[1]) {
        return Err(Error::bin_spec("bin edges must be distinct".to_owned()));
    }
    Ok(sorted.windows(2).map(|w| (w[0], w[1])).collect())
}

/// Parse a two-column bin file. Rows must hold at least two numeric columns
/// with `min < max`; extra columns are ignored, as are blank lines.
pub fn read_bins(path: &Path) -> Result<Vec<(f64, f64)>, Error> {
    let contents = fs::read_to_string(path)
        .map_err(|err| Error::bin_spec(format!("could not read {}: {err}", path.display())))?;

    let mut rows = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(lo), Some(hi)) = (fields.next(), fields.next()) else {
            return Err(Error::bin_spec(format!(
                "line {} of {} needs two columns",
                line_no + 1,
                path.display()
            )));
        };
        let parse = |field: &str| {
            field.parse::<f64>().map_err(|_| {
                Error::bin_spec(format!(
                    "line {} of {} holds a non-numeric value",
                    line_no + 1,
                    path.display()
                ))
            })
        };
        let (lo, hi) = (parse(lo)?, parse(hi)?);
        if lo >= hi {
            return Err(Error::bin_spec(format!(
                "line {} of {} needs min < max",
                line_no + 1,
                path.display()
            )));
        }
        rows.push((lo, hi));
    }
    if rows.is_empty() {
        return Err(Error::bin_spec(format!(
            "{} holds no bins",
            path.display()
        )));
    }
    Ok(rows)
}
