//! Anchor-transform file parsing.
//!
//! The anchor record is a small text file of whitespace-separated floats,
//! one matrix row per line: either the two rows of an affine map, or three
//! rows where the trailing homogeneous row is discarded. Any other shape is
//! fatal — assembly never starts from a transform it cannot trust.

use std::fs;
use std::path::Path;

use crate::error::AssemblyError;
use crate::transform::Transform;

pub fn load_anchor_transform(path: &Path) -> Result<Transform, AssemblyError> {
    let text = fs::read_to_string(path).map_err(|e| AssemblyError::MalformedAnchorTransform {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_anchor_transform(&text).map_err(|reason| AssemblyError::MalformedAnchorTransform {
        path: path.to_path_buf(),
        reason,
    })
}

pub fn parse_anchor_transform(text: &str) -> Result<Transform, String> {
    let mut rows: Vec<[f64; 3]> = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let values: Result<Vec<f64>, _> = line.split_whitespace().map(str::parse).collect();
        let values = values.map_err(|e| format!("line {}: {e}", lineno + 1))?;
        let row: [f64; 3] = values
            .try_into()
            .map_err(|v: Vec<f64>| format!("line {}: expected 3 values, got {}", lineno + 1, v.len()))?;
        rows.push(row);
    }

    match rows.len() {
        2 => Ok(Transform::from_affine_rows([rows[0], rows[1]])),
        // Trailing homogeneous row is discarded regardless of its content.
        3 => Ok(Transform::from_affine_rows([rows[0], rows[1]])),
        n => Err(format!("expected 2 or 3 matrix rows, got {n}")),
    }
}
