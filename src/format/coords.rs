//! Plain-text coordinate files.
//!
//! One pick per line, whitespace separated, with one of these layouts:
//!
//! | Columns | Layout                 |
//! |---------|------------------------|
//! | 2       | `x y`                  |
//! | 3       | `x y label`            |
//! | 4       | `x1 y1 x2 y2`          |
//! | 5       | `x1 y1 x2 y2 label`    |
//!
//! Any other column count, or a non-integer position, is a malformed line.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::format::error::FormatError;
use crate::model::Coordinate;

/// How malformed lines are handled while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// A malformed line fails the whole file
    #[default]
    Strict,
    /// Malformed lines are skipped and reported
    Permissive,
}

/// Result of parsing a coordinate file.
#[derive(Debug, Clone, Default)]
pub struct CoordinateFile {
    /// Parsed picks in file order
    pub coordinates: Vec<Coordinate>,
    /// 1-based numbers of lines skipped in permissive mode
    pub skipped_lines: Vec<usize>,
}

/// Read a coordinate file from disk.
pub fn read_coordinates(
    path: &Path,
    strictness: Strictness,
) -> Result<CoordinateFile, FormatError> {
    if !path.exists() {
        return Err(FormatError::missing_file(path));
    }
    let content = std::fs::read_to_string(path)?;
    parse_coordinates(&content, path, strictness)
}

/// Parse coordinate text; `path` is only used for error messages.
pub fn parse_coordinates(
    content: &str,
    path: &Path,
    strictness: Strictness,
) -> Result<CoordinateFile, FormatError> {
    let mut file = CoordinateFile::default();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(coord) => file.coordinates.push(coord),
            Err(message) => match strictness {
                Strictness::Strict => {
                    return Err(FormatError::invalid_line(path, idx + 1, message));
                }
                Strictness::Permissive => {
                    log::warn!("Skipping line {} of {:?}: {}", idx + 1, path, message);
                    file.skipped_lines.push(idx + 1);
                }
            },
        }
    }

    Ok(file)
}

fn parse_line(line: &str) -> Result<Coordinate, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let int = |s: &str| {
        s.parse::<i32>()
            .map_err(|_| format!("'{}' is not an integer position", s))
    };

    let coord = match parts.as_slice() {
        [x, y] => Coordinate::new(int(*x)?, int(*y)?),
        [x, y, label] => Coordinate::new(int(*x)?, int(*y)?).with_label(*label),
        [x1, y1, x2, y2] => Coordinate::segment(int(*x1)?, int(*y1)?, int(*x2)?, int(*y2)?),
        [x1, y1, x2, y2, label] => {
            Coordinate::segment(int(*x1)?, int(*y1)?, int(*x2)?, int(*y2)?).with_label(*label)
        }
        _ => return Err(format!("unsupported number of columns: {}", parts.len())),
    };
    Ok(coord)
}

/// Render coordinates in the text layout.
pub fn format_coordinates(coordinates: &[Coordinate]) -> String {
    let mut lines = Vec::with_capacity(coordinates.len());
    for coord in coordinates {
        let mut fields = vec![coord.x.to_string(), coord.y.to_string()];
        if let Some((x2, y2)) = coord.end {
            fields.push(x2.to_string());
            fields.push(y2.to_string());
        }
        if let Some(label) = coord.label.as_deref().filter(|l| !l.is_empty()) {
            fields.push(label.to_string());
        }
        lines.push(fields.join(" "));
    }
    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Write coordinates to a text file.
pub fn write_coordinates(path: &Path, coordinates: &[Coordinate]) -> Result<(), FormatError> {
    std::fs::write(path, format_coordinates(coordinates))?;
    Ok(())
}
