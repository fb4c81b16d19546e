//! Plain-text accuracy files.
//!
//! One line per row; a row is either a scalar or a sequence, sequences are
//! comma-joined.  Every value is printed with six decimals and each line
//! ends in `\n`.  No header, no quoting:
//!
//! ```text
//! 1.000000
//! 2.000000,3.500000
//! 4.250000
//! ```
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::{Result, XaiError};
use crate::sensitivity::AccuracyResult;

/// One output line.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Scalar(f64),
    Values(Vec<f64>),
}

impl From<f64> for Row {
    fn from(v: f64) -> Self {
        Row::Scalar(v)
    }
}

impl From<f32> for Row {
    fn from(v: f32) -> Self {
        Row::Scalar(v as f64)
    }
}

impl From<Vec<f64>> for Row {
    fn from(v: Vec<f64>) -> Self {
        Row::Values(v)
    }
}

impl From<&[f32]> for Row {
    fn from(v: &[f32]) -> Self {
        Row::Values(v.iter().map(|&x| x as f64).collect())
    }
}

impl From<&AccuracyResult> for Row {
    fn from(r: &AccuracyResult) -> Self {
        r.accuracies.as_slice().into()
    }
}

/// Write `rows` to `sink`.
pub fn write_rows<W: Write>(rows: &[Row], sink: &mut W) -> std::io::Result<()> {
    for row in rows {
        match row {
            Row::Scalar(v) => writeln!(sink, "{v:.6}")?,
            Row::Values(vs) => {
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        sink.write_all(b",")?;
                    }
                    write!(sink, "{v:.6}")?;
                }
                sink.write_all(b"\n")?;
            }
        }
    }
    sink.flush()
}

/// Write `rows` to the file at `path`, replacing any previous content.
///
/// # Errors
///
/// [`XaiError::Io`] if the file cannot be created or written.  A failed
/// write may leave a truncated file behind.
pub fn save(rows: &[Row], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let io_err = |source| XaiError::Io { path: path.to_path_buf(), source };
    let file = File::create(path).map_err(io_err)?;
    write_rows(rows, &mut BufWriter::new(file)).map_err(io_err)?;
    info!(path = %path.display(), rows = rows.len(), "saved");
    Ok(())
}

/// Save each result on its own line, in order.
pub fn save_results<'a>(results: impl IntoIterator<Item = &'a AccuracyResult>, path: impl AsRef<Path>) -> Result<()> {
    let rows: Vec<Row> = results.into_iter().map(Row::from).collect();
    save(&rows, path)
}

/// Parse text written by [`write_rows`] back into rows.
///
/// Single-value lines come back as [`Row::Scalar`].
pub fn parse_rows(text: &str) -> std::result::Result<Vec<Row>, std::num::ParseFloatError> {
    text.lines()
        .filter(|l| !l.is_empty())
        .map(|line| {
            let values = line.split(',').map(str::parse::<f64>).collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(match values.as_slice() {
                [v] => Row::Scalar(*v),
                _ => Row::Values(values),
            })
        })
        .collect()
}
