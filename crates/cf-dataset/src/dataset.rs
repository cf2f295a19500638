//! In-memory CF dataset model.
//!
//! A dataset holds coordinate variables, data variables and global
//! attributes. Dimensions are implicit: their lengths come from the
//! variables that use them and must agree across the dataset.

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array, ArrayD, Dimension};

use crate::error::{CfError, CfResult};

/// Number of values printed per variable by `Display`.
const DISPLAY_VALUES: usize = 12;

/// A netCDF attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Numbers(Vec<f64>),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(value) => Some(*value),
            AttrValue::Numbers(values) if values.len() == 1 => Some(values[0]),
            _ => None,
        }
    }

    pub fn as_numbers(&self) -> Option<Vec<f64>> {
        match self {
            AttrValue::Number(value) => Some(vec![*value]),
            AttrValue::Numbers(values) => Some(values.clone()),
            AttrValue::Text(_) => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(value: Vec<f64>) -> Self {
        AttrValue::Numbers(value)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(text) => f.write_str(text),
            AttrValue::Number(value) => write!(f, "{}", value),
            AttrValue::Numbers(values) => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

pub type Attributes = BTreeMap<String, AttrValue>;

/// Storage type a variable is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Float64,
    Int32,
    Int8,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Float64 => "float64",
            DataType::Int32 => "int32",
            DataType::Int8 => "int8",
        };
        f.write_str(name)
    }
}

/// A named-dimension array with attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub dims: Vec<String>,
    pub data: ArrayD<f64>,
    pub dtype: DataType,
    pub attrs: Attributes,
}

impl Variable {
    /// Create a float64 variable. Fails if the number of dimension names
    /// differs from the array rank.
    pub fn new<D: Dimension>(dims: &[&str], data: Array<f64, D>) -> CfResult<Self> {
        if dims.len() != data.ndim() {
            return Err(CfError::AxisShapeMismatch(format!(
                "{} dimension names for an array of rank {}",
                dims.len(),
                data.ndim()
            )));
        }
        Ok(Self {
            dims: dims.iter().map(|d| d.to_string()).collect(),
            data: data.into_dyn(),
            dtype: DataType::Float64,
            attrs: Attributes::new(),
        })
    }

    /// A zero-dimensional variable.
    pub fn scalar(value: f64, dtype: DataType) -> Self {
        Self {
            dims: Vec::new(),
            data: ndarray::arr0(value).into_dyn(),
            dtype,
            attrs: Attributes::new(),
        }
    }

    pub fn with_dtype(mut self, dtype: DataType) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<AttrValue>) {
        self.attrs.insert(key.to_string(), value.into());
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    pub fn text_attr(&self, key: &str) -> Option<&str> {
        self.attr(key).and_then(AttrValue::as_text)
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn has_dims(&self, dims: &[String]) -> bool {
        self.dims.iter().all(|d| dims.contains(d))
    }
}

/// A CF dataset: coordinates, data variables and global attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    coords: BTreeMap<String, Variable>,
    data_vars: BTreeMap<String, Variable>,
    pub attrs: Attributes,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimension lengths, in name order.
    pub fn dims(&self) -> BTreeMap<String, usize> {
        let mut dims = BTreeMap::new();
        for var in self.coords.values().chain(self.data_vars.values()) {
            for (dim, len) in var.dims.iter().zip(var.shape()) {
                dims.entry(dim.clone()).or_insert(*len);
            }
        }
        dims
    }

    fn check_dims(&self, name: &str, var: &Variable) -> CfResult<()> {
        let dims = self
            .coords
            .iter()
            .chain(self.data_vars.iter())
            .filter(|(key, _)| key.as_str() != name)
            .flat_map(|(_, v)| v.dims.iter().zip(v.shape()))
            .collect::<Vec<_>>();

        for (dim, found) in var.dims.iter().zip(var.shape()) {
            if let Some((_, expected)) = dims.iter().find(|(d, _)| *d == dim) {
                if **expected != *found {
                    return Err(CfError::DimensionMismatch {
                        dim: dim.clone(),
                        variable: name.to_string(),
                        expected: **expected,
                        found: *found,
                    });
                }
            }
        }
        Ok(())
    }

    /// Insert or replace a coordinate variable.
    pub fn insert_coord(&mut self, name: &str, var: Variable) -> CfResult<()> {
        self.check_dims(name, &var)?;
        self.data_vars.remove(name);
        self.coords.insert(name.to_string(), var);
        Ok(())
    }

    /// Insert or replace a data variable.
    pub fn insert_data_var(&mut self, name: &str, var: Variable) -> CfResult<()> {
        self.check_dims(name, &var)?;
        self.coords.remove(name);
        self.data_vars.insert(name.to_string(), var);
        Ok(())
    }

    pub fn with_coord(mut self, name: &str, var: Variable) -> CfResult<Self> {
        self.insert_coord(name, var)?;
        Ok(self)
    }

    pub fn with_data_var(mut self, name: &str, var: Variable) -> CfResult<Self> {
        self.insert_data_var(name, var)?;
        Ok(self)
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn coord(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name)
    }

    pub fn data_var(&self, name: &str) -> Option<&Variable> {
        self.data_vars.get(name)
    }

    pub fn data_var_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.data_vars.get_mut(name)
    }

    /// A coordinate or data variable.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name).or_else(|| self.data_vars.get(name))
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        match self.coords.get_mut(name) {
            Some(var) => Some(var),
            None => self.data_vars.get_mut(name),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.coords.contains_key(name) || self.data_vars.contains_key(name)
    }

    pub fn coords(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.coords.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn data_vars(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.data_vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All variables, coordinates first.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.coords().chain(self.data_vars())
    }

    pub fn data_var_names(&self) -> Vec<String> {
        self.data_vars.keys().cloned().collect()
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        self.coords.remove(name).or_else(|| self.data_vars.remove(name))
    }

    /// Names of the coordinates of a variable: every coordinate variable
    /// whose dimensions are all used by it.
    pub fn coords_of(&self, name: &str) -> Vec<&str> {
        let Some(var) = self.variable(name) else {
            return Vec::new();
        };
        self.coords
            .iter()
            .filter(|(_, coord)| coord.has_dims(&var.dims))
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Rename dimensions in every variable. Renames apply simultaneously,
    /// so two dimensions can swap names.
    pub fn rename_dims(&mut self, renames: &[(&str, &str)]) -> CfResult<()> {
        let rename = |dim: &mut String| {
            if let Some((_, to)) = renames.iter().find(|(from, _)| *from == dim.as_str()) {
                *dim = to.to_string();
            }
        };

        let mut renamed = self.clone();
        for var in renamed.coords.values_mut().chain(renamed.data_vars.values_mut()) {
            for dim in var.dims.iter_mut() {
                rename(dim);
            }
        }
        for (name, var) in renamed.variables() {
            renamed.check_dims(name, var)?;
        }

        *self = renamed;
        Ok(())
    }
}

fn write_values(f: &mut fmt::Formatter<'_>, data: &ArrayD<f64>) -> fmt::Result {
    for value in data.iter().take(DISPLAY_VALUES) {
        write!(f, " {}", value)?;
    }
    if data.len() > DISPLAY_VALUES {
        write!(f, " ...")?;
    }
    Ok(())
}

fn write_variable(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    var: &Variable,
    marker: char,
    width: usize,
) -> fmt::Result {
    write!(f, "  {} {:<width$} ", marker, name, width = width)?;
    if !var.dims.is_empty() {
        write!(f, "({}) ", var.dims.join(", "))?;
    }
    write!(f, "{}", var.dtype)?;
    write_values(f, &var.data)?;
    writeln!(f)?;
    for (key, value) in &var.attrs {
        writeln!(f, "        {}: {}", key, value)?;
    }
    Ok(())
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .coords
            .keys()
            .chain(self.data_vars.keys())
            .map(|k| k.len())
            .max()
            .unwrap_or(0);

        writeln!(f, "<cf_dataset.Dataset>")?;
        let dims: Vec<String> = self
            .dims()
            .iter()
            .map(|(dim, len)| format!("{}: {}", dim, len))
            .collect();
        writeln!(f, "Dimensions:  ({})", dims.join(", "))?;

        writeln!(f, "Coordinates:")?;
        for (name, var) in &self.coords {
            let is_index = var.dims.len() == 1 && var.dims[0] == *name;
            write_variable(f, name, var, if is_index { '*' } else { ' ' }, width)?;
        }

        writeln!(f, "Data variables:")?;
        for (name, var) in &self.data_vars {
            write_variable(f, name, var, ' ', width)?;
        }

        if !self.attrs.is_empty() {
            writeln!(f, "Attributes:")?;
            for (key, value) in &self.attrs {
                writeln!(f, "    {}: {}", key, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn sample() -> Dataset {
        Dataset::new()
            .with_coord("lat", Variable::new(&["lat"], arr1(&[59.0, 60.0])).unwrap())
            .unwrap()
            .with_coord("lon", Variable::new(&["lon"], arr1(&[4.0, 5.0, 6.0])).unwrap())
            .unwrap()
            .with_data_var("temp", Variable::new(&["lat", "lon"], arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]])).unwrap())
            .unwrap()
    }

    #[test]
    fn test_dims_from_variables() {
        let dims = sample().dims();
        assert_eq!(dims.get("lat"), Some(&2));
        assert_eq!(dims.get("lon"), Some(&3));
    }

    #[test]
    fn test_rank_mismatch() {
        let result = Variable::new(&["x", "y"], arr1(&[1.0, 2.0]));
        assert!(matches!(result, Err(CfError::AxisShapeMismatch(_))));
    }

    #[test]
    fn test_dimension_length_conflict() {
        let result = sample().with_data_var("bad", Variable::new(&["lat"], arr1(&[1.0, 2.0, 3.0])).unwrap());
        match result {
            Err(CfError::DimensionMismatch { dim, expected, found, .. }) => {
                assert_eq!(dim, "lat");
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("expected DimensionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_replacing_a_variable_may_resize_its_own_dimension() {
        let ds = Dataset::new()
            .with_coord("x", Variable::new(&["x"], arr1(&[1.0, 2.0])).unwrap())
            .unwrap()
            .with_coord("x", Variable::new(&["x"], arr1(&[1.0, 2.0, 3.0])).unwrap())
            .unwrap();
        assert_eq!(ds.dims().get("x"), Some(&3));
    }

    #[test]
    fn test_coords_of() {
        let ds = sample();
        assert_eq!(ds.coords_of("temp"), vec!["lat", "lon"]);
        assert_eq!(ds.coords_of("lat"), vec!["lat"]);
        assert!(ds.coords_of("missing").is_empty());
    }

    #[test]
    fn test_rename_dims() {
        let mut ds = sample();
        ds.rename_dims(&[("lat", "y"), ("lon", "x")]).unwrap();
        assert_eq!(ds.data_var("temp").unwrap().dims, vec!["y", "x"]);
        assert_eq!(ds.coord("lat").unwrap().dims, vec!["y"]);
    }

    #[test]
    fn test_rename_dims_conflict_leaves_dataset_untouched() {
        let mut ds = sample();
        let before = ds.clone();
        assert!(ds.rename_dims(&[("lat", "lon")]).is_err());
        assert_eq!(ds, before);
    }

    #[test]
    fn test_display() {
        let text = sample().with_attr("title", "test").to_string();
        assert!(text.contains("Dimensions:  (lat: 2, lon: 3)"));
        assert!(text.contains("* lat  (lat) float64 59 60"));
        assert!(text.contains("temp (lat, lon) float64 1 2 3 4 5 6"));
        assert!(text.contains("    title: test"));
    }

    #[test]
    fn test_attr_values() {
        assert_eq!(AttrValue::from("a").as_text(), Some("a"));
        assert_eq!(AttrValue::from(1.5).as_number(), Some(1.5));
        assert_eq!(AttrValue::from(vec![1.0, 2.0]).as_numbers(), Some(vec![1.0, 2.0]));
        assert_eq!(AttrValue::from(vec![1.0, 2.0]).to_string(), "[1, 2]");
    }
}
