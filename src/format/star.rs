//! Minimal STAR table reader and writer.
//!
//! Supports the subset used by picking runs:
//!
//! - `data_<name>` blocks
//! - `loop_` tables with `_label #n` headers
//! - key-value blocks (`_label value`), exposed as a single-row table
//! - `#` comments and single/double quoted values
//!
//! Rows keep their on-disk order. Fields are addressed by label name (without
//! the leading underscore) and returned as strings; numeric conversion is an
//! explicit call by the caller.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::format::error::FormatError;

/// One data block of a STAR file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StarTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl StarTable {
    /// Create an empty table with the given block name and column labels.
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row at `index`, in file order.
    pub fn row(&self, index: usize) -> Option<StarRow<'_>> {
        self.rows.get(index).map(|values| StarRow {
            table: self,
            values,
        })
    }

    /// Iterate rows in file order.
    pub fn rows(&self) -> impl Iterator<Item = StarRow<'_>> {
        self.rows.iter().map(move |values| StarRow {
            table: self,
            values,
        })
    }

    /// Append a row; the number of values must match the columns.
    pub fn push_row(&mut self, values: Vec<String>) -> Result<(), FormatError> {
        if values.len() != self.columns.len() {
            return Err(FormatError::invalid_value(
                "row",
                format!("{} values for {} columns", values.len(), self.columns.len()),
            ));
        }
        self.rows.push(values);
        Ok(())
    }

    /// Render this table as a `loop_` block.
    pub fn to_star_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\ndata_{}\n\nloop_", self.name);
        for (i, column) in self.columns.iter().enumerate() {
            let _ = writeln!(out, "_{} #{}", column, i + 1);
        }
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(|v| quote_value(v)).collect();
            let _ = writeln!(out, "{}", line.join(" "));
        }
        out.push('\n');
        out
    }
}

/// A borrowed row with label-based field access.
#[derive(Debug, Clone, Copy)]
pub struct StarRow<'a> {
    table: &'a StarTable,
    values: &'a [String],
}

impl<'a> StarRow<'a> {
    /// Raw value of a field, if the column exists.
    pub fn get(&self, field: &str) -> Option<&'a str> {
        self.table
            .column_index(field)
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
    }

    /// Raw value of a required field.
    pub fn str(&self, field: &str) -> Result<&'a str, FormatError> {
        self.get(field)
            .ok_or_else(|| FormatError::missing_field(field))
    }

    /// Required field converted to `f64`.
    pub fn f64(&self, field: &str) -> Result<f64, FormatError> {
        let raw = self.str(field)?;
        raw.parse()
            .map_err(|_| FormatError::invalid_value(field, raw))
    }

    /// Required field converted to `i64`.
    ///
    /// Integral floats such as `12.000` are accepted.
    pub fn i64(&self, field: &str) -> Result<i64, FormatError> {
        let raw = self.str(field)?;
        if let Ok(value) = raw.parse::<i64>() {
            return Ok(value);
        }
        match raw.parse::<f64>() {
            Ok(value) if value.fract() == 0.0 => Ok(value as i64),
            _ => Err(FormatError::invalid_value(field, raw)),
        }
    }
}

/// A parsed STAR file.
#[derive(Debug, Clone, Default)]
pub struct StarFile {
    path: PathBuf,
    blocks: Vec<StarTable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Outside,
    Block,
    LoopHeader,
    LoopRows,
}

impl StarFile {
    /// Read and parse a STAR file from disk.
    pub fn read(path: &Path) -> Result<Self, FormatError> {
        if !path.exists() {
            return Err(FormatError::missing_file(path));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parse STAR content; `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self, FormatError> {
        let mut blocks: Vec<StarTable> = Vec::new();
        let mut state = ParseState::Outside;
        // Key-value blocks collect into a single row
        let mut pairs_row: Vec<String> = Vec::new();

        let flush_pairs = |blocks: &mut Vec<StarTable>, pairs_row: &mut Vec<String>| {
            if let Some(block) = blocks.last_mut() {
                if !pairs_row.is_empty() {
                    block.rows.push(std::mem::take(pairs_row));
                }
            }
        };

        for (idx, raw_line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim();

            if line.is_empty() {
                if state == ParseState::LoopRows {
                    state = ParseState::Block;
                }
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix("data_") {
                flush_pairs(&mut blocks, &mut pairs_row);
                blocks.push(StarTable::new(name.trim(), &[]));
                state = ParseState::Block;
                continue;
            }

            if line == "loop_" {
                let Some(block) = blocks.last_mut() else {
                    return Err(FormatError::invalid_line(
                        path,
                        line_no,
                        "loop_ outside a data block",
                    ));
                };
                if !block.columns.is_empty() {
                    return Err(FormatError::invalid_line(
                        path,
                        line_no,
                        "only one table per data block is supported",
                    ));
                }
                state = ParseState::LoopHeader;
                continue;
            }

            let tokens = tokenize(line);
            let Some(block) = blocks.last_mut() else {
                return Err(FormatError::invalid_line(
                    path,
                    line_no,
                    "content outside a data block",
                ));
            };

            if let Some(label) = tokens[0].strip_prefix('_') {
                match state {
                    ParseState::LoopHeader => {
                        block.columns.push(label.to_string());
                    }
                    ParseState::Block if block.rows.is_empty() => {
                        let Some(value) = tokens.get(1) else {
                            return Err(FormatError::invalid_line(
                                path,
                                line_no,
                                format!("missing value for '{}'", label),
                            ));
                        };
                        block.columns.push(label.to_string());
                        pairs_row.push(value.clone());
                    }
                    _ => {
                        return Err(FormatError::invalid_line(
                            path,
                            line_no,
                            format!("unexpected label '{}'", label),
                        ));
                    }
                }
                continue;
            }

            match state {
                ParseState::LoopHeader | ParseState::LoopRows => {
                    if tokens.len() != block.columns.len() {
                        return Err(FormatError::invalid_line(
                            path,
                            line_no,
                            format!(
                                "expected {} values, found {}",
                                block.columns.len(),
                                tokens.len()
                            ),
                        ));
                    }
                    block.rows.push(tokens);
                    state = ParseState::LoopRows;
                }
                ParseState::Outside | ParseState::Block => {
                    return Err(FormatError::invalid_line(path, line_no, "value outside a table"));
                }
            }
        }
        flush_pairs(&mut blocks, &mut pairs_row);

        Ok(Self {
            path: path.to_path_buf(),
            blocks,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn blocks(&self) -> &[StarTable] {
        &self.blocks
    }

    /// Block with exactly this name.
    pub fn block(&self, name: &str) -> Option<&StarTable> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// First block in the file.
    pub fn first(&self) -> Result<&StarTable, FormatError> {
        self.blocks.first().ok_or_else(|| FormatError::MissingBlock {
            block: String::from("<any>"),
            path: self.path.clone(),
        })
    }

    /// Named block, or the first block when no block has this name.
    ///
    /// Older files store a single unnamed table where newer ones use a
    /// named block.
    pub fn block_or_first(&self, name: &str) -> Result<&StarTable, FormatError> {
        match self.block(name) {
            Some(block) => Ok(block),
            None => {
                log::debug!("No data_{} block in {:?}, using the first block", name, self.path);
                self.first()
            }
        }
    }

    /// Write blocks to a file.
    pub fn write(path: &Path, tables: &[&StarTable]) -> Result<(), FormatError> {
        let mut out = String::from("# version 30001\n");
        for table in tables {
            out.push_str(&table.to_star_string());
        }
        std::fs::write(path, out)?;
        Ok(())
    }
}

/// Split a line into whitespace separated tokens, honouring quotes.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if c == '"' || c == '\'' {
            chars.next();
            for ch in chars.by_ref() {
                if ch == c {
                    break;
                }
                token.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                token.push(ch);
                chars.next();
            }
        }
        tokens.push(token);
    }
    tokens
}

fn quote_value(value: &str) -> String {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = "
# version 30001

data_

loop_
_rlnMicrographName #1
_rlnAutopickFigureOfMerit #2
_rlnGroupNrParticles #3
MotionCorr/job002/Movies/001.mrc 0.9 12
MotionCorr/job002/Movies/002.mrc 0.2 0
";

    #[test]
    fn test_parse_loop() {
        let file = StarFile::parse(SUMMARY, Path::new("summary.star")).unwrap();
        let table = file.first().unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.has_column("rlnGroupNrParticles"));

        let row = table.row(1).unwrap();
        assert_eq!(row.str("rlnMicrographName").unwrap(), "MotionCorr/job002/Movies/002.mrc");
        assert!((row.f64("rlnAutopickFigureOfMerit").unwrap() - 0.2).abs() < 1e-9);
        assert_eq!(table.row(0).unwrap().i64("rlnGroupNrParticles").unwrap(), 12);
    }

    #[test]
    fn test_named_blocks_and_key_values() {
        let content = "
data_general
_rlnImageSizeX 4096
_rlnComment 'two words'

data_micrographs
loop_
_rlnMicrographName #1
a.mrc
b.mrc
";
        let file = StarFile::parse(content, Path::new("m.star")).unwrap();
        assert_eq!(file.blocks().len(), 2);

        let general = file.block("general").unwrap();
        assert_eq!(general.len(), 1);
        let row = general.row(0).unwrap();
        assert_eq!(row.i64("rlnImageSizeX").unwrap(), 4096);
        assert_eq!(row.str("rlnComment").unwrap(), "two words");

        let mics = file.block_or_first("micrographs").unwrap();
        let names: Vec<_> = mics
            .rows()
            .map(|r| r.get("rlnMicrographName").unwrap())
            .collect();
        assert_eq!(names, vec!["a.mrc", "b.mrc"]);
    }

    #[test]
    fn test_block_or_first_falls_back() {
        let file = StarFile::parse(SUMMARY, Path::new("s.star")).unwrap();
        assert!(file.block("micrographs").is_none());
        assert_eq!(file.block_or_first("micrographs").unwrap().len(), 2);
    }

    #[test]
    fn test_wrong_value_count_is_error() {
        let content = "data_\nloop_\n_rlnCoordinateX #1\n_rlnCoordinateY #2\n10 20\n30\n";
        let err = StarFile::parse(content, Path::new("c.star")).unwrap_err();
        match err {
            FormatError::InvalidLine { line, .. } => assert_eq!(line, 6),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_field_and_bad_value() {
        let file = StarFile::parse(SUMMARY, Path::new("s.star")).unwrap();
        let row = file.first().unwrap().row(0).unwrap();
        assert!(matches!(row.str("rlnCoordinateX"), Err(FormatError::MissingField { .. })));
        assert!(matches!(row.f64("rlnMicrographName"), Err(FormatError::InvalidValue { .. })));
    }

    #[test]
    fn test_written_table_parses_back() {
        let mut table = StarTable::new("", &["rlnCoordinateX", "rlnCoordinateY", "rlnComment"]);
        table.push_row(vec!["1".into(), "2".into(), "a b".into()]).unwrap();
        assert!(table.push_row(vec!["1".into()]).is_err());

        let text = format!("# header\n{}", table.to_star_string());
        let file = StarFile::parse(&text, Path::new("w.star")).unwrap();
        let row = file.first().unwrap().row(0).unwrap();
        assert_eq!(row.str("rlnComment").unwrap(), "a b");
    }

    #[test]
    fn test_read_missing_file() {
        let err = StarFile::read(Path::new("/nonexistent/summary.star")).unwrap_err();
        assert!(matches!(err, FormatError::MissingFile { .. }));
    }
}
