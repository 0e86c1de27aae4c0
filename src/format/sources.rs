//! Micrograph and coordinate file discovery.
//!
//! Expands simple wildcard patterns and pairs each micrograph with the
//! coordinate file sharing its file stem.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::format::error::FormatError;

/// A micrograph path with the coordinate file found for it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicrographSource {
    /// File stem shared by both files
    pub stem: String,
    /// Micrograph image path
    pub micrograph: PathBuf,
    /// Coordinate file path, when one matched
    pub coordinates: Option<PathBuf>,
}

/// Match a file name against a pattern with `*` and `?` wildcards.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ni < n.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ni));
            pi += 1;
        } else if let Some((sp, sn)) = star {
            pi = sp + 1;
            ni = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

/// Expand a path whose file-name component may contain wildcards.
///
/// A pattern without wildcards names a single file, returned when it exists.
/// Results are sorted by path.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, FormatError> {
    let path = Path::new(pattern);
    let Some(file_pattern) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(Vec::new());
    };

    if !file_pattern.contains(['*', '?']) {
        return Ok(if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.is_dir() {
        log::debug!("Pattern directory {:?} does not exist", dir);
        return Ok(Vec::new());
    }

    let mut matches: Vec<PathBuf> = std::fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| wildcard_match(file_pattern, n))
        })
        .collect();
    matches.sort();
    Ok(matches)
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Pair micrographs with coordinate files by file stem.
///
/// Exact stem matches win; otherwise a case-insensitive match is used.
/// Coordinate files without a micrograph are ignored. Output is sorted by stem.
pub fn pair_sources(micrographs: &[PathBuf], coordinates: &[PathBuf]) -> Vec<MicrographSource> {
    let mut exact: HashMap<String, &PathBuf> = HashMap::new();
    let mut folded: HashMap<String, &PathBuf> = HashMap::new();
    for coord in coordinates {
        let stem = stem_of(coord);
        folded.entry(stem.to_lowercase()).or_insert(coord);
        exact.insert(stem, coord);
    }

    let mut sources: BTreeMap<String, MicrographSource> = BTreeMap::new();
    for mic in micrographs {
        let stem = stem_of(mic);
        let coords = exact
            .get(&stem)
            .or_else(|| folded.get(&stem.to_lowercase()))
            .map(|p| (*p).clone());
        if sources.contains_key(&stem) {
            log::warn!("Duplicate micrograph stem '{}', keeping {:?}", stem, mic);
        }
        sources.insert(
            stem.clone(),
            MicrographSource {
                stem,
                micrograph: mic.clone(),
                coordinates: coords,
            },
        );
    }
    sources.into_values().collect()
}

/// Expand both patterns and pair the results.
pub fn discover_sources(
    micrographs_pattern: &str,
    coordinates_pattern: Option<&str>,
) -> Result<Vec<MicrographSource>, FormatError> {
    let mics = expand_pattern(micrographs_pattern)?;
    let coords = match coordinates_pattern {
        Some(pattern) => expand_pattern(pattern)?,
        None => Vec::new(),
    };
    log::info!(
        "Found {} micrographs and {} coordinate files",
        mics.len(),
        coords.len()
    );
    Ok(pair_sources(&mics, &coords))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("*.mrc", "001.mrc"));
        assert!(wildcard_match("0?1.mrc", "001.mrc"));
        assert!(wildcard_match("*", "anything"));
        assert!(wildcard_match("a*b*c", "aXXbYYc"));
        assert!(!wildcard_match("*.mrc", "001.txt"));
        assert!(!wildcard_match("a*b", "acd"));
    }

    #[test]
    fn test_pair_sources_by_stem() {
        let mics = vec![
            PathBuf::from("m/002.mrc"),
            PathBuf::from("m/001.mrc"),
            PathBuf::from("m/Abc.mrc"),
        ];
        let coords = vec![
            PathBuf::from("c/001.txt"),
            PathBuf::from("c/abc.txt"),
            PathBuf::from("c/999.txt"),
        ];
        let sources = pair_sources(&mics, &coords);

        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].stem, "001");
        assert_eq!(sources[0].coordinates, Some(PathBuf::from("c/001.txt")));
        assert_eq!(sources[1].coordinates, None);
        // Case-insensitive fallback
        assert_eq!(sources[2].coordinates, Some(PathBuf::from("c/abc.txt")));
    }

    #[test]
    fn test_expand_pattern() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mrc", "a.mrc", "a.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let pattern = dir.path().join("*.mrc");
        let found = expand_pattern(pattern.to_str().unwrap()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.mrc", "b.mrc"]);

        let single = dir.path().join("a.txt");
        assert_eq!(expand_pattern(single.to_str().unwrap()).unwrap().len(), 1);
        let missing = dir.path().join("zzz.txt");
        assert!(expand_pattern(missing.to_str().unwrap()).unwrap().is_empty());
    }
}
