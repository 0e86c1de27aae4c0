//! Shared state of every picker model.

use std::collections::HashMap;

use crate::model::{Coordinate, LabelRegistry, LoadState, Micrograph, MicrographId};
use crate::picker::PickerError;

/// Default picking box size in pixels.
pub const DEFAULT_BOX_SIZE: u32 = 100;

/// Micrographs, labels and box size owned by one picker model.
///
/// Micrographs are kept in insertion order, which is the row order of the
/// summary table. The id index always mirrors the list.
#[derive(Debug, Clone)]
pub struct PickerCore {
    micrographs: Vec<Micrograph>,
    index: HashMap<MicrographId, usize>,
    labels: LabelRegistry,
    box_size: u32,
}

impl PickerCore {
    pub fn new() -> Self {
        Self {
            micrographs: Vec::new(),
            index: HashMap::new(),
            labels: LabelRegistry::new(),
            box_size: DEFAULT_BOX_SIZE,
        }
    }

    /// Append a micrograph. Ids are expected to be unique.
    pub fn add_micrograph(&mut self, micrograph: Micrograph) {
        let id = micrograph.id();
        if self.index.contains_key(&id) {
            log::warn!("Micrograph id {} added twice, lookups now resolve to the latest", id);
        }
        self.index.insert(id, self.micrographs.len());
        self.micrographs.push(micrograph);
    }

    /// Next sequential id (`len + 1`).
    pub fn next_id(&self) -> MicrographId {
        MicrographId(self.micrographs.len() as u32 + 1)
    }

    pub fn box_size(&self) -> u32 {
        self.box_size
    }

    pub fn set_box_size(&mut self, size: u32) {
        self.box_size = size;
    }

    pub fn labels(&self) -> &LabelRegistry {
        &self.labels
    }

    pub fn labels_mut(&mut self) -> &mut LabelRegistry {
        &mut self.labels
    }

    pub fn len(&self) -> usize {
        self.micrographs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.micrographs.is_empty()
    }

    pub fn micrographs(&self) -> &[Micrograph] {
        &self.micrographs
    }

    pub fn index_of(&self, id: MicrographId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn micrograph(&self, id: MicrographId) -> Option<&Micrograph> {
        self.index_of(id).map(|idx| &self.micrographs[idx])
    }

    pub fn micrograph_mut(&mut self, id: MicrographId) -> Option<&mut Micrograph> {
        let idx = self.index_of(id)?;
        self.micrographs.get_mut(idx)
    }

    /// Micrograph at a summary-table row.
    pub fn micrograph_by_index(&self, row: usize) -> Option<&Micrograph> {
        self.micrographs.get(row)
    }

    /// Micrograph for `id`, or a not-found error.
    pub fn require(&self, id: MicrographId) -> Result<&Micrograph, PickerError> {
        self.micrograph(id)
            .ok_or(PickerError::MicrographNotFound(id))
    }

    /// Mutable micrograph for `id`, or a not-found error.
    pub fn require_mut(&mut self, id: MicrographId) -> Result<&mut Micrograph, PickerError> {
        self.micrograph_mut(id)
            .ok_or(PickerError::MicrographNotFound(id))
    }

    /// Micrograph at `row`, or an invalid-row error.
    pub fn require_row(&self, row: usize) -> Result<&Micrograph, PickerError> {
        let rows = self.micrographs.len();
        self.micrographs
            .get(row)
            .ok_or(PickerError::InvalidRow { row, rows })
    }

    /// Register every label used by `coordinates` that is not known yet.
    pub fn register_labels(&mut self, coordinates: &[Coordinate]) {
        for label in coordinates.iter().filter_map(|c| c.label.as_deref()) {
            self.labels.ensure(label);
        }
    }

    /// Append coordinates to a micrograph, registering their labels.
    pub fn add_coordinates(
        &mut self,
        id: MicrographId,
        coordinates: Vec<Coordinate>,
    ) -> Result<(), PickerError> {
        self.require(id)?;
        self.register_labels(&coordinates);
        self.require_mut(id)?.extend(coordinates);
        Ok(())
    }

    /// Remove the coordinates at `indices` and return them in list order.
    ///
    /// Indices refer to the list before removal; duplicates are ignored.
    /// Nothing is removed if any index is out of range.
    pub fn remove_coordinates(
        &mut self,
        id: MicrographId,
        indices: &[usize],
    ) -> Result<Vec<Coordinate>, PickerError> {
        let mic = self.require_mut(id)?;
        let len = mic.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(PickerError::InvalidCoordinate {
                micrograph: id,
                index,
                len,
            });
        }

        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let mut removed: Vec<Coordinate> =
            sorted.iter().rev().filter_map(|&i| mic.remove(i)).collect();
        removed.reverse();
        Ok(removed)
    }

    /// Remove every coordinate of a micrograph.
    ///
    /// The micrograph is marked loaded so nothing is read back from disk.
    pub fn clear_micrograph(&mut self, id: MicrographId) -> Result<(), PickerError> {
        let mic = self.require_mut(id)?;
        mic.clear();
        mic.set_state(LoadState::Loaded);
        Ok(())
    }
}

impl Default for PickerCore {
    fn default() -> Self {
        Self::new()
    }
}
