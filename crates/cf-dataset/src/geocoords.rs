//! Coordinate attribution and grid-mapping discovery.

use crs::ReferenceFrame;
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{CfError, CfResult};
use crate::grid_mapping::{GridMapping, MappingKind, DEFAULT_MAPPING_NAME};

pub(crate) const CONVENTIONS: &str = "CF-1.8";

const LONGITUDE_ATTRS: &[(&str, &str)] =
    &[("standard_name", "longitude"), ("units", "degrees_east")];
const LATITUDE_ATTRS: &[(&str, &str)] =
    &[("standard_name", "latitude"), ("units", "degrees_north")];
const PROJECTION_X_ATTRS: &[(&str, &str)] = &[("standard_name", "projection_x_coordinate")];
const PROJECTION_Y_ATTRS: &[(&str, &str)] = &[("standard_name", "projection_y_coordinate")];

/// A parsed `grid_mapping` attribute: mapping names with their axes.
///
/// Handles both the short form (`"crs"`) and the extended form
/// (`"crs: x y other: lon lat"`).
pub(crate) fn parse_clauses(text: &str) -> Vec<(String, Vec<String>)> {
    let mut clauses: Vec<(String, Vec<String>)> = Vec::new();
    for token in text.split_whitespace() {
        match token.strip_suffix(':') {
            Some(name) => clauses.push((name.to_string(), Vec::new())),
            None => match clauses.last_mut() {
                Some((_, axes)) => axes.push(token.to_string()),
                None => clauses.push((token.to_string(), Vec::new())),
            },
        }
    }
    clauses
}

pub(crate) fn format_clauses(clauses: &[(String, Vec<String>)]) -> String {
    clauses
        .iter()
        .map(|(name, axes)| {
            if axes.is_empty() {
                name.clone()
            } else {
                format!("{}: {}", name, axes.join(" "))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn ensure_conventions(dataset: &mut Dataset) {
    dataset
        .attrs
        .entry("Conventions".to_string())
        .or_insert_with(|| CONVENTIONS.into());
}

/// Attribute `axes` in place. When `only` is given, the `grid_mapping`
/// clause is added to those data variables alone.
pub(crate) fn attribute_in_place(
    dataset: &mut Dataset,
    mapping: &GridMapping,
    axes: (&str, &str),
    only: Option<&[String]>,
) -> CfResult<()> {
    let (x_name, y_name) = axes;
    for name in [x_name, y_name] {
        if !dataset.contains(name) {
            return Err(CfError::VariableNotFound(name.to_string()));
        }
    }

    let (x_attrs, y_attrs) = match mapping.kind {
        MappingKind::LatitudeLongitude => (LONGITUDE_ATTRS, LATITUDE_ATTRS),
        MappingKind::TransverseMercator(_) => (PROJECTION_X_ATTRS, PROJECTION_Y_ATTRS),
    };

    for (name, axis, attrs) in [(x_name, "X", x_attrs), (y_name, "Y", y_attrs)] {
        if let Some(var) = dataset.variable_mut(name) {
            var.set_attr("axis", axis);
            for (key, value) in attrs {
                var.set_attr(key, *value);
            }
        }
    }

    let clause = format!("{}: {} {}", mapping.name, x_name, y_name);
    let targets: Vec<String> = dataset
        .data_var_names()
        .into_iter()
        .filter(|name| only.map_or(true, |only| only.contains(name)))
        .filter(|name| {
            let coords = dataset.coords_of(name);
            coords.contains(&x_name) && coords.contains(&y_name)
        })
        .collect();

    for name in &targets {
        if let Some(var) = dataset.data_var_mut(name) {
            let text = match var.text_attr("grid_mapping") {
                Some(old) if !old.is_empty() => format!("{} {}", old, clause),
                _ => clause.clone(),
            };
            var.set_attr("grid_mapping", text);
        }
    }
    debug!(
        mapping = %mapping.name,
        x = x_name,
        y = y_name,
        variables = targets.len(),
        "Attributed coordinates"
    );

    ensure_conventions(dataset);
    Ok(())
}

/// Mark `axes` (x, y) as the coordinates of `mapping`.
///
/// The axes get `axis`, `standard_name` and for geographic mappings `units`
/// attributes. Every data variable that has both axes among its coordinates
/// gets a `"<mapping>: <x> <y>"` clause appended to its `grid_mapping`
/// attribute.
pub fn attribute_coordinates(
    dataset: &Dataset,
    mapping: &GridMapping,
    axes: (&str, &str),
) -> CfResult<Dataset> {
    let mut result = dataset.clone();
    attribute_in_place(&mut result, mapping, axes, None)?;
    Ok(result)
}

/// Names of every variable carrying a `grid_mapping_name` attribute.
pub fn grid_mappings(dataset: &Dataset) -> Vec<String> {
    dataset
        .variables()
        .filter(|(_, var)| var.attr("grid_mapping_name").is_some())
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Reference frame of the first zero-dimensional variable with a
/// `spatial_ref` attribute.
pub fn frame_from_dataset(dataset: &Dataset) -> CfResult<ReferenceFrame> {
    let wkt = dataset
        .variables()
        .filter(|(_, var)| var.ndim() == 0)
        .find_map(|(_, var)| var.text_attr("spatial_ref"))
        .ok_or_else(|| CfError::MappingNotFound("no variable with spatial_ref".to_string()))?;
    Ok(ReferenceFrame::from_wkt(wkt)?)
}

/// Add a grid-mapping variable for `frame`, named `crs_def` by default.
pub fn create_grid_mapping(
    dataset: &Dataset,
    frame: &ReferenceFrame,
    name: Option<&str>,
) -> CfResult<Dataset> {
    let mapping = GridMapping::encode(frame, name.unwrap_or(DEFAULT_MAPPING_NAME))?;
    let mut result = dataset.clone();
    result.insert_data_var(&mapping.name, mapping.to_variable())?;
    Ok(result)
}

/// Attribute `axes` with a grid mapping already in the dataset. Without a
/// name, the first grid mapping found is used.
pub fn create_geocoords(
    dataset: &Dataset,
    axes: (&str, &str),
    mapping_name: Option<&str>,
) -> CfResult<Dataset> {
    let name = match mapping_name {
        Some(name) => name.to_string(),
        None => grid_mappings(dataset)
            .into_iter()
            .next()
            .ok_or_else(|| CfError::MappingNotFound("dataset has no grid mapping".to_string()))?,
    };
    let mapping = GridMapping::from_dataset(dataset, &name)?;
    attribute_coordinates(dataset, &mapping, axes)
}
