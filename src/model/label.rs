//! Label data model used to classify coordinates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::color_utils;

/// A named display attribute for coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Unique name of the label
    pub name: String,
    /// Display color, e.g. `#1EFF00` or `#AA1EFF00`
    pub color: String,
}

impl Label {
    /// Create a new label with the given name and color.
    pub fn new(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

/// Registry of labels known to a picker model.
///
/// Keeps registration order and supports aliases that resolve to an
/// already registered label.
#[derive(Debug, Clone, Default)]
pub struct LabelRegistry {
    labels: Vec<Label>,
    by_name: HashMap<String, usize>,
}

impl LabelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a label, replacing any label (or alias) with the same name.
    pub fn register(&mut self, label: Label) {
        match self.by_name.get(&label.name) {
            Some(&idx) if self.labels[idx].name == label.name => {
                self.labels[idx] = label;
            }
            _ => {
                self.by_name.insert(label.name.clone(), self.labels.len());
                self.labels.push(label);
            }
        }
    }

    /// Make `alias` resolve to the label named `target`.
    ///
    /// Returns false when `target` is not registered.
    pub fn alias(&mut self, alias: &str, target: &str) -> bool {
        match self.by_name.get(target).copied() {
            Some(idx) => {
                self.by_name.insert(alias.to_string(), idx);
                true
            }
            None => false,
        }
    }

    /// Look up a label by name or alias.
    pub fn get(&self, name: &str) -> Option<&Label> {
        self.by_name.get(name).map(|&idx| &self.labels[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Register `name` with a generated color if it is not known yet.
    pub fn ensure(&mut self, name: &str) -> &Label {
        if !self.contains(name) {
            let color = color_utils::generated_color(self.labels.len());
            log::debug!("Registering label '{}' with color {}", name, color);
            self.register(Label::new(name, &color));
        }
        let idx = self.by_name[name];
        &self.labels[idx]
    }

    /// Labels in registration order (aliases are not repeated).
    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
