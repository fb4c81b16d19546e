//! Safetensors I/O for trial sets.
//!
//! A trial-set file holds two F32 tensors:
//!
//! | key      | shape       | content                                  |
//! |----------|-------------|------------------------------------------|
//! | `trials` | `[N, C, T]` | trial tensor                             |
//! | `labels` | `[N]`       | class index (1 or 2)                     |
//! |          | `[N, 2]`    | or one-hot rows (`[1,0]` / `[0,1]`)      |
use anyhow::{bail, ensure, Context, Result};
use ndarray::{Array2, Array3};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::labels::{check_aligned, Labels};

// ── Low-level safetensors parser (raw bytes → ndarray, no tensor-crate types) ─

fn parse_header(bytes: &[u8]) -> Result<(HashMap<String, serde_json::Value>, usize)> {
    ensure!(bytes.len() >= 8, "safetensors file too small");
    let mut len = [0u8; 8];
    len.copy_from_slice(&bytes[..8]);
    let n = u64::from_le_bytes(len) as usize;
    ensure!(bytes.len() >= 8 + n, "safetensors header runs past the end of the file");
    let header: HashMap<String, serde_json::Value> =
        serde_json::from_slice(&bytes[8..8 + n]).context("failed to parse safetensors header")?;
    Ok((header, 8 + n))
}

fn shape_of(name: &str, entry: &serde_json::Value) -> Result<Vec<usize>> {
    entry["shape"]
        .as_array()
        .with_context(|| format!("'{name}' has no shape"))?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize).with_context(|| format!("'{name}' has a bad dimension")))
        .collect()
}

fn read_f32_tensor(bytes: &[u8], data_start: usize, name: &str, entry: &serde_json::Value) -> Result<Vec<f32>> {
    let dtype = entry["dtype"].as_str().unwrap_or("");
    ensure!(dtype == "F32", "'{name}' must be F32, found {dtype:?}");
    let offsets = entry["data_offsets"]
        .as_array()
        .filter(|o| o.len() == 2)
        .with_context(|| format!("'{name}' has no data_offsets"))?;
    let s = offsets[0].as_u64().context("bad start offset")? as usize;
    let e = offsets[1].as_u64().context("bad end offset")? as usize;
    let raw = bytes
        .get(data_start + s..data_start + e)
        .with_context(|| format!("'{name}' data lies outside the file"))?;
    Ok(raw
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

// ── Writer ────────────────────────────────────────────────────────────────────

/// Minimal safetensors writer for F32 tensors.
///
/// ```rust,no_run
/// use exg_xai::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f32("labels", &[1.0f32, 2.0, 2.0], &[3]);
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, Vec<usize>)>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f32(&mut self, name: &str, data: &[f32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, shape.to_vec()));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": "F32",
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes.into_iter().chain(std::iter::repeat(b' ').take(pad)).collect();
        let mut f = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}

// ── Trial set ─────────────────────────────────────────────────────────────────

/// Aligned trial tensor and labels.
#[derive(Debug, Clone)]
pub struct TrialSet {
    /// `[N, C, T]`
    pub trials: Array3<f32>,
    pub labels: Labels,
}

impl TrialSet {
    pub fn new(trials: Array3<f32>, labels: Labels) -> Result<Self> {
        check_aligned(&trials, &labels)?;
        Ok(Self { trials, labels })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let (header, data_start) = parse_header(&bytes)?;

        let entry = header.get("trials").context("missing 'trials' key")?;
        let shape = shape_of("trials", entry)?;
        let [n, c, t] = shape[..] else {
            bail!("'trials' must be rank 3 [N, C, T], got shape {shape:?}");
        };
        let trials = Array3::from_shape_vec((n, c, t), read_f32_tensor(&bytes, data_start, "trials", entry)?)?;

        let entry = header.get("labels").context("missing 'labels' key")?;
        let shape = shape_of("labels", entry)?;
        let values = read_f32_tensor(&bytes, data_start, "labels", entry)?;
        let labels = match shape[..] {
            [_] => Labels::Classes(
                values
                    .iter()
                    .map(|&v| {
                        ensure!(v == 1.0 || v == 2.0, "class label {v} is neither 1 nor 2");
                        Ok(v as u8)
                    })
                    .collect::<Result<_>>()?,
            ),
            [rows, 2] => Labels::OneHot(Array2::from_shape_vec((rows, 2), values)?),
            _ => bail!("'labels' must be [N] or [N, 2], got shape {shape:?}"),
        };
        // rejects one-hot rows that are neither class
        labels.classes()?;

        debug!(path = %path.display(), trials = n, channels = c, samples = t, "trial set loaded");
        Self::new(trials, labels)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let (n, c, t) = self.trials.dim();
        let mut w = StWriter::new();
        let data: Vec<f32> = self.trials.iter().copied().collect();
        w.add_f32("trials", &data, &[n, c, t]);
        match &self.labels {
            Labels::Classes(classes) => {
                let values: Vec<f32> = classes.iter().map(|&k| k as f32).collect();
                w.add_f32("labels", &values, &[n]);
            }
            Labels::OneHot(m) => {
                let values: Vec<f32> = m.iter().copied().collect();
                w.add_f32("labels", &values, &[m.nrows(), m.ncols()]);
            }
        }
        w.write(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("exg_xai_{name}_{}.safetensors", std::process::id()))
    }

    #[test]
    fn class_labels_survive_a_save() {
        let trials = Array3::from_shape_fn((3, 2, 5), |(i, j, k)| (i * 10 + j * 5 + k) as f32 * 0.5);
        let set = TrialSet::new(trials.clone(), Labels::Classes(vec![1, 2, 2])).unwrap();
        let path = tmp("classes");
        set.save(&path).unwrap();
        let back = TrialSet::load(&path).unwrap();
        assert_eq!(back.trials, trials);
        assert_eq!(back.labels, Labels::Classes(vec![1, 2, 2]));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn one_hot_labels_load() {
        let path = tmp("onehot");
        let mut w = StWriter::new();
        w.add_f32("trials", &[0.0; 8], &[2, 2, 2]);
        w.add_f32("labels", &[0.0, 1.0, 1.0, 0.0], &[2, 2]);
        w.write(&path).unwrap();
        let set = TrialSet::load(&path).unwrap();
        assert_eq!(set.labels.classes().unwrap(), vec![2, 1]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn bad_class_rejected() {
        let path = tmp("badclass");
        let mut w = StWriter::new();
        w.add_f32("trials", &[0.0; 4], &[2, 1, 2]);
        w.add_f32("labels", &[1.0, 3.0], &[2]);
        w.write(&path).unwrap();
        assert!(TrialSet::load(&path).is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn misaligned_rejected() {
        assert!(TrialSet::new(Array3::zeros((3, 1, 4)), Labels::Classes(vec![1, 2])).is_err());
    }
}
