//! Micrograph data model.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Identifier of a micrograph, unique within one picker model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MicrographId(pub u32);

impl fmt::Display for MicrographId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether the coordinates of a micrograph have been read from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Coordinates not read yet
    #[default]
    Unloaded,
    /// Coordinates cached in memory
    Loaded,
}

/// One acquired image and the picks made on it.
#[derive(Debug, Clone)]
pub struct Micrograph {
    id: MicrographId,
    path: PathBuf,
    coordinates: Vec<Coordinate>,
    state: LoadState,
}

impl Micrograph {
    /// Create a micrograph with no coordinates loaded.
    pub fn new(id: MicrographId, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
            coordinates: Vec::new(),
            state: LoadState::Unloaded,
        }
    }

    /// Create a micrograph whose coordinates are already known.
    pub fn with_coordinates(
        id: MicrographId,
        path: impl Into<PathBuf>,
        coordinates: Vec<Coordinate>,
    ) -> Self {
        Self {
            id,
            path: path.into(),
            coordinates,
            state: LoadState::Loaded,
        }
    }

    pub fn id(&self) -> MicrographId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used for display in summary tables.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    /// File name without extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    pub fn set_state(&mut self, state: LoadState) {
        self.state = state;
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn coordinates_mut(&mut self) -> &mut Vec<Coordinate> {
        &mut self.coordinates
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Coordinate> {
        self.coordinates.iter()
    }

    pub fn push(&mut self, coordinate: Coordinate) {
        self.coordinates.push(coordinate);
    }

    pub fn extend(&mut self, coordinates: impl IntoIterator<Item = Coordinate>) {
        self.coordinates.extend(coordinates);
    }

    /// Remove the coordinate at `index`, if present.
    pub fn remove(&mut self, index: usize) -> Option<Coordinate> {
        (index < self.coordinates.len()).then(|| self.coordinates.remove(index))
    }

    /// Drop all coordinates.
    pub fn clear(&mut self) {
        self.coordinates.clear();
    }
}

impl<'a> IntoIterator for &'a Micrograph {
    type Item = &'a Coordinate;
    type IntoIter = std::slice::Iter<'a, Coordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.coordinates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let mic = Micrograph::new(MicrographId(1), "/data/mics/001.mrc");
        assert_eq!(mic.name(), "001.mrc");
        assert_eq!(mic.stem(), "001");
        assert_eq!(mic.state(), LoadState::Unloaded);
    }

    #[test]
    fn test_mutation() {
        let mut mic = Micrograph::new(MicrographId(7), "a.mrc");
        mic.push(Coordinate::new(1, 2));
        mic.extend(vec![Coordinate::new(3, 4), Coordinate::new(5, 6)]);
        assert_eq!(mic.len(), 3);

        assert_eq!(mic.remove(1), Some(Coordinate::new(3, 4)));
        assert_eq!(mic.remove(10), None);
        assert_eq!(mic.iter().map(|c| c.x).collect::<Vec<_>>(), vec![1, 5]);

        mic.clear();
        assert!(mic.is_empty());
    }

    #[test]
    fn test_with_coordinates_is_loaded() {
        let mic =
            Micrograph::with_coordinates(MicrographId(2), "b.mrc", vec![Coordinate::new(0, 0)]);
        assert!(mic.is_loaded());
        assert_eq!(mic.len(), 1);
    }
}
