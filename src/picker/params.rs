//! User-adjustable parameters of picker models.
//!
//! Models describe their parameters as a [`Form`]; the view layer renders it
//! and routes every change back through `PickerModel::change_param`. Names
//! are resolved to the closed [`ParamId`] set before a model acts on them.

use std::collections::HashMap;

/// Every parameter understood by any picker model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    /// Minimum score for a coordinate to count as good
    ScoreThreshold,
    /// Show all coordinates, colored by pass/fail
    UseColor,
    /// Show coordinates below the score threshold
    ShowBelow,
    /// Which run(s) a comparison displays
    Sources,
    /// Minimum integer threshold attribute (synthetic models)
    Threshold,
    /// Remove all coordinates of the current micrograph
    Clear,
    /// Discard the current picks and read them again
    PickAgain,
}

impl ParamId {
    /// Wire name used by forms and the view layer.
    pub fn name(&self) -> &'static str {
        match self {
            ParamId::ScoreThreshold => "scoreThreshold",
            ParamId::UseColor => "useColor",
            ParamId::ShowBelow => "showBelow",
            ParamId::Sources => "sources",
            ParamId::Threshold => "threshold",
            ParamId::Clear => "clear",
            ParamId::PickAgain => "pick",
        }
    }

    /// All known parameter ids.
    pub fn all() -> &'static [ParamId] {
        &[
            ParamId::ScoreThreshold,
            ParamId::UseColor,
            ParamId::ShowBelow,
            ParamId::Sources,
            ParamId::Threshold,
            ParamId::Clear,
            ParamId::PickAgain,
        ]
    }

    /// Resolve a wire name. Matching is exact.
    pub fn from_name(name: &str) -> Option<ParamId> {
        Self::all().iter().copied().find(|id| id.name() == name)
    }
}

/// Kind of value a parameter holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Float,
    Bool,
    Text,
    /// One of a fixed list of choices
    Enum,
    /// Side-effect only, carries no value
    Button,
}

/// How the view layer should present a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamDisplay {
    #[default]
    Default,
    Slider,
    Combo,
}

/// A parameter value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParamValue {
    #[default]
    None,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ParamValue::None)
    }
}

/// Snapshot of all current parameter values, keyed by wire name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamValues {
    values: HashMap<String, ParamValue>,
}

impl ParamValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: ParamValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: ParamValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }
}

/// Value for `id`: the changed value itself, or the form snapshot when the
/// change carries no value.
pub fn resolve_value(
    id: ParamId,
    value: &ParamValue,
    values: &dyn Fn() -> ParamValues,
) -> ParamValue {
    if !value.is_none() {
        return value.clone();
    }
    values().get(id.name()).cloned().unwrap_or_default()
}

/// Resolve a float parameter, failing on missing or mistyped values.
pub fn resolve_f64(
    id: ParamId,
    value: &ParamValue,
    values: &dyn Fn() -> ParamValues,
) -> Result<f64, super::PickerError> {
    resolve_value(id, value, values)
        .as_f64()
        .ok_or_else(|| super::PickerError::invalid_param(id.name(), "expected a number"))
}

/// Resolve a boolean parameter, failing on missing or mistyped values.
pub fn resolve_bool(
    id: ParamId,
    value: &ParamValue,
    values: &dyn Fn() -> ParamValues,
) -> Result<bool, super::PickerError> {
    resolve_value(id, value, values)
        .as_bool()
        .ok_or_else(|| super::PickerError::invalid_param(id.name(), "expected a boolean"))
}

/// Description of one adjustable parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub id: ParamId,
    pub kind: ParamKind,
    /// Current/default value
    pub value: ParamValue,
    pub label: String,
    pub help: String,
    pub display: ParamDisplay,
    /// Inclusive range for numeric sliders
    pub range: Option<(f64, f64)>,
    /// Choices for enum parameters
    pub choices: Vec<String>,
}

impl Param {
    pub fn new(id: ParamId, kind: ParamKind, value: ParamValue) -> Self {
        Self {
            id,
            kind,
            value,
            label: id.name().to_string(),
            help: String::new(),
            display: ParamDisplay::Default,
            range: None,
            choices: Vec::new(),
        }
    }

    /// A button parameter.
    pub fn button(id: ParamId, label: &str) -> Self {
        Self::new(id, ParamKind::Button, ParamValue::None).with_label(label)
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = help.to_string();
        self
    }

    /// Display as a slider over `[min, max]`.
    pub fn slider(mut self, min: f64, max: f64) -> Self {
        self.display = ParamDisplay::Slider;
        self.range = Some((min, max));
        self
    }

    /// Display as a combo box over `choices`.
    pub fn choices(mut self, choices: &[&str]) -> Self {
        self.display = ParamDisplay::Combo;
        self.choices = choices.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// Parameters laid out in rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Form {
    pub rows: Vec<Vec<Param>>,
}

impl Form {
    pub fn new(rows: Vec<Vec<Param>>) -> Self {
        Self { rows }
    }

    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.rows.iter().flatten()
    }

    pub fn get(&self, id: ParamId) -> Option<&Param> {
        self.params().find(|p| p.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    /// Current values of all valued parameters.
    pub fn values(&self) -> ParamValues {
        let mut values = ParamValues::new();
        for param in self.params().filter(|p| p.kind != ParamKind::Button) {
            values.insert(param.name(), param.value.clone());
        }
        values
    }
}

/// Which dependent views must refresh after a parameter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeResult {
    pub current_coords_changed: bool,
    pub table_model_changed: bool,
}

impl ChangeResult {
    /// Nothing was modified.
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// Coordinates and the summary table both changed.
    pub fn changed() -> Self {
        Self {
            current_coords_changed: true,
            table_model_changed: true,
        }
    }

    /// Only the displayed coordinates changed.
    pub fn coords_only() -> Self {
        Self {
            current_coords_changed: true,
            table_model_changed: false,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        !self.current_coords_changed && !self.table_model_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_names_round_trip() {
        for id in ParamId::all() {
            assert_eq!(ParamId::from_name(id.name()), Some(*id));
        }
        assert_eq!(ParamId::from_name("ScoreThreshold"), None);
        assert_eq!(ParamId::from_name("bogus"), None);
    }

    #[test]
    fn test_resolve_prefers_changed_value() {
        let values = || ParamValues::new().with("scoreThreshold", ParamValue::Float(2.0));
        let direct =
            resolve_f64(ParamId::ScoreThreshold, &ParamValue::Float(3.5), &values).unwrap();
        assert_eq!(direct, 3.5);
        let from_form = resolve_f64(ParamId::ScoreThreshold, &ParamValue::None, &values).unwrap();
        assert_eq!(from_form, 2.0);
        assert!(resolve_bool(ParamId::UseColor, &ParamValue::None, &values).is_err());
    }

    #[test]
    fn test_form_values_skip_buttons() {
        let form = Form::new(vec![
            vec![Param::new(ParamId::UseColor, ParamKind::Bool, ParamValue::Bool(true))],
            vec![Param::button(ParamId::Clear, "Clear coordinates")],
        ]);
        let values = form.values();
        assert_eq!(values.get("useColor"), Some(&ParamValue::Bool(true)));
        assert_eq!(values.get("clear"), None);
        assert!(form.get(ParamId::Clear).is_some());
    }
}
