//! Parameter Grid Expansion
//!
//! Complex benchmarks declare dimensions; the grid expands to the
//! cartesian product of their options in declared order, with the last
//! dimension varying fastest. Options may carry a filter predicate
//! that sees the full label map of a candidate combination; one
//! rejecting predicate discards the combination.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Labels of a candidate combination, keyed by dimension.
pub type LabelMap = BTreeMap<String, String>;

/// Chosen option values keyed by dimension, handed to case callbacks.
pub type CaseData = BTreeMap<String, Value>;

/// Grid declaration errors, surfaced while a job expands.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// The benchmark declared no dimensions at all.
    #[error("no parameter dimensions declared")]
    EmptyGrid,
    /// A dimension exists but offers nothing to choose from.
    #[error("dimension '{0}' has no options")]
    EmptyDimension(String),
}

/// One admissible value along a dimension.
pub struct DimOption {
    /// Label shown in output rows and visible to filters.
    pub label: String,
    /// Value handed to the case callback.
    pub value: Value,
    /// Optional admission predicate over the full candidate label map.
    pub filter: Option<Box<dyn Fn(&LabelMap) -> bool>>,
}

/// One axis of a parameter grid.
pub struct Dimension {
    /// Key under which values appear in `CaseData` and `LabelMap`.
    pub key: String,
    /// Column name for the header row.
    pub display_name: String,
    /// Admissible options in declared order.
    pub options: Vec<DimOption>,
}

impl Dimension {
    /// Empty dimension; add options with [`option`](Self::option) or
    /// [`option_when`](Self::option_when).
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Dimension {
            key: key.into(),
            display_name: display_name.into(),
            options: Vec::new(),
        }
    }

    /// Dimension from a plain value list.
    ///
    /// Each value becomes an unfiltered option labeled with its display
    /// form, so `values("n", "N", [1, 2])` yields labels "1" and "2".
    pub fn values<V>(
        key: impl Into<String>,
        display_name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self
    where
        V: Into<Value>,
    {
        let mut dim = Dimension::new(key, display_name);
        for value in values {
            let value = value.into();
            dim.options.push(DimOption {
                label: value_label(&value),
                value,
                filter: None,
            });
        }
        dim
    }

    /// Add an unfiltered option.
    pub fn option(mut self, label: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.push(DimOption {
            label: label.into(),
            value: value.into(),
            filter: None,
        });
        self
    }

    /// Add an option admitted only where `filter` accepts the
    /// candidate combination's label map.
    pub fn option_when(
        mut self,
        label: impl Into<String>,
        value: impl Into<Value>,
        filter: impl Fn(&LabelMap) -> bool + 'static,
    ) -> Self {
        self.options.push(DimOption {
            label: label.into(),
            value: value.into(),
            filter: Some(Box::new(filter)),
        });
        self
    }
}

/// Display form of a plain grid value.
fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One admitted grid combination.
#[derive(Debug, Clone)]
pub struct Combination {
    /// `(dimension key, chosen label)` in declared dimension order.
    pub labels: Vec<(String, String)>,
    /// Chosen values keyed by dimension.
    pub data: CaseData,
}

/// Expanded grid: admitted combinations plus the sweep-end sentinel.
#[derive(Debug)]
pub struct GridPlan {
    /// Admitted combinations in sweep order.
    pub combinations: Vec<Combination>,
    /// Key of the last declared dimension.
    pub sweep_key: String,
    /// Last option's value of the last dimension. A combination whose
    /// value under `sweep_key` equals this closes one innermost sweep.
    /// The comparison is structural, so a duplicate value earlier in
    /// the dimension also matches.
    pub sweep_end: Value,
}

/// Expand dimensions into the ordered cartesian product.
pub fn expand_grid(dimensions: &[Dimension]) -> Result<GridPlan, GridError> {
    let last = dimensions.last().ok_or(GridError::EmptyGrid)?;
    for dim in dimensions {
        if dim.options.is_empty() {
            return Err(GridError::EmptyDimension(dim.key.clone()));
        }
    }
    let sweep_key = last.key.clone();
    let sweep_end = last.options[last.options.len() - 1].value.clone();

    let mut combinations = Vec::new();
    let mut indices = vec![0usize; dimensions.len()];
    loop {
        let mut labels = Vec::with_capacity(dimensions.len());
        let mut label_map = LabelMap::new();
        let mut data = CaseData::new();
        for (dim, &i) in dimensions.iter().zip(&indices) {
            let opt = &dim.options[i];
            labels.push((dim.key.clone(), opt.label.clone()));
            label_map.insert(dim.key.clone(), opt.label.clone());
            data.insert(dim.key.clone(), opt.value.clone());
        }

        let admitted = dimensions.iter().zip(&indices).all(|(dim, &i)| {
            match &dim.options[i].filter {
                Some(filter) => filter(&label_map),
                None => true,
            }
        });
        if admitted {
            combinations.push(Combination { labels, data });
        }

        if !advance(&mut indices, dimensions) {
            break;
        }
    }

    Ok(GridPlan {
        combinations,
        sweep_key,
        sweep_end,
    })
}

/// Step the option odometer; the last dimension varies fastest.
/// Returns false once every combination has been visited.
fn advance(indices: &mut [usize], dimensions: &[Dimension]) -> bool {
    let mut pos = indices.len();
    while pos > 0 {
        pos -= 1;
        indices[pos] += 1;
        if indices[pos] < dimensions[pos].options.len() {
            return true;
        }
        indices[pos] = 0;
    }
    false
}
