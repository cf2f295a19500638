//! Attaching and replacing the reference frame of a dataset.

use crs::ReferenceFrame;
use ndarray::{Array2, ArrayD, Axis, Ix1, Ix2};
use tracing::{debug, info};

use crate::dataset::{Dataset, Variable};
use crate::error::{CfError, CfResult};
use crate::geocoords::{attribute_in_place, ensure_conventions, format_clauses, parse_clauses};
use crate::grid_mapping::{GridMapping, DEFAULT_MAPPING_NAME};

/// Largest spread along a mesh axis for which projected coordinates are
/// stored as 1-D axes.
const SEPARABLE_TOLERANCE: f64 = 1e-8;

/// Coordinate attributes that depend on the reference frame and are not
/// carried over when coordinates are re-projected.
const FRAME_ATTRS: [&str; 3] = ["axis", "standard_name", "units"];

/// A way to name a reference frame in dataset operations.
#[derive(Debug, Clone)]
pub enum CrsRef {
    /// Grid-mapping variable already present in the dataset
    Name(String),
    /// Explicit grid mapping
    Mapping(GridMapping),
    /// Bare reference frame, stored under [`DEFAULT_MAPPING_NAME`]
    Frame(ReferenceFrame),
}

impl From<&str> for CrsRef {
    fn from(name: &str) -> Self {
        CrsRef::Name(name.to_string())
    }
}

impl From<String> for CrsRef {
    fn from(name: String) -> Self {
        CrsRef::Name(name)
    }
}

impl From<GridMapping> for CrsRef {
    fn from(mapping: GridMapping) -> Self {
        CrsRef::Mapping(mapping)
    }
}

impl From<ReferenceFrame> for CrsRef {
    fn from(frame: ReferenceFrame) -> Self {
        CrsRef::Frame(frame)
    }
}

impl CrsRef {
    /// Resolve to a grid mapping, encoding bare frames.
    fn mapping(&self, dataset: &Dataset) -> CfResult<GridMapping> {
        match self {
            CrsRef::Name(name) => GridMapping::from_dataset(dataset, name),
            CrsRef::Mapping(mapping) => Ok(mapping.clone()),
            CrsRef::Frame(frame) => GridMapping::encode(frame, DEFAULT_MAPPING_NAME),
        }
    }

    /// Resolve to a mapping name and frame. Bare frames are used as they
    /// are, so frames without a CF encoding (such as the ocean model grids)
    /// can still be the source of a re-projection.
    fn frame(&self, dataset: &Dataset) -> CfResult<(String, ReferenceFrame)> {
        match self {
            CrsRef::Frame(frame) => Ok((DEFAULT_MAPPING_NAME.to_string(), frame.clone())),
            other => {
                let mapping = other.mapping(dataset)?;
                let frame = mapping.decode()?;
                Ok((mapping.name, frame))
            }
        }
    }
}

/// Attach a reference frame to a dataset.
///
/// Explicit mappings and frames are inserted as grid-mapping variables; a
/// name must refer to one already in the dataset. With `axes` the axes are
/// attributed as by [`crate::attribute_coordinates`], limited to `data_vars`
/// when that is non-empty. Without `axes` each listed data variable gets the
/// short form `grid_mapping = "<name>"`; an empty list tags nothing.
pub fn set_crs(
    dataset: &Dataset,
    crs: CrsRef,
    axes: Option<(&str, &str)>,
    data_vars: &[&str],
) -> CfResult<Dataset> {
    let mapping = crs.mapping(dataset)?;
    let mut result = dataset.clone();
    if !matches!(crs, CrsRef::Name(_)) {
        result.insert_data_var(&mapping.name, mapping.to_variable())?;
    }

    let listed: Vec<String> = data_vars.iter().map(|name| name.to_string()).collect();
    for name in &listed {
        if result.data_var(name).is_none() {
            return Err(CfError::VariableNotFound(name.clone()));
        }
    }

    match axes {
        Some(axes) => {
            let only = if listed.is_empty() { None } else { Some(listed.as_slice()) };
            attribute_in_place(&mut result, &mapping, axes, only)?;
        }
        None => {
            for name in &listed {
                if let Some(var) = result.data_var_mut(name) {
                    var.set_attr("grid_mapping", mapping.name.as_str());
                }
            }
            ensure_conventions(&mut result);
        }
    }

    debug!(mapping = %mapping.name, "Set CRS");
    Ok(result)
}

/// How the old coordinate pair spans the dataset.
enum Layout {
    /// Both axes share one dimension: a list of points
    Points(String),
    /// A (row, column) mesh
    Grid(String, String),
}

fn shape_error(message: String) -> CfError {
    CfError::AxisShapeMismatch(message)
}

fn to_1d(var: &Variable, name: &str) -> CfResult<ndarray::Array1<f64>> {
    var.data
        .clone()
        .into_dimensionality::<Ix1>()
        .map_err(|e| shape_error(format!("{}: {}", name, e)))
}

fn to_2d(data: ArrayD<f64>, name: &str) -> CfResult<Array2<f64>> {
    data.into_dimensionality::<Ix2>()
        .map_err(|e| shape_error(format!("{}: {}", name, e)))
}

/// Broadcast a 1-D axis over a 2-D grid with dimensions `dims`.
fn broadcast(
    values: &ndarray::Array1<f64>,
    dim: &str,
    dims: &[String],
    shape: (usize, usize),
) -> CfResult<Array2<f64>> {
    let (rows, cols) = shape;
    if dim == dims[0] && values.len() == rows {
        Ok(Array2::from_shape_fn(shape, |(i, _)| values[i]))
    } else if dim == dims[1] && values.len() == cols {
        Ok(Array2::from_shape_fn(shape, |(_, j)| values[j]))
    } else {
        Err(shape_error(format!(
            "dimension {} does not span the grid ({})",
            dim,
            dims.join(", ")
        )))
    }
}

/// Bring the old axes to a common shape for transforming.
fn mesh(
    x: &Variable,
    y: &Variable,
    axes: (&str, &str),
) -> CfResult<(Layout, ArrayD<f64>, ArrayD<f64>)> {
    let (x_name, y_name) = axes;
    match (x.ndim(), y.ndim()) {
        (1, 1) if x.dims[0] == y.dims[0] => {
            if x.len() != y.len() {
                return Err(shape_error(format!("{} and {} differ in length", x_name, y_name)));
            }
            Ok((Layout::Points(x.dims[0].clone()), x.data.clone(), y.data.clone()))
        }
        (1, 1) => {
            let xv = to_1d(x, x_name)?;
            let yv = to_1d(y, y_name)?;
            let shape = (yv.len(), xv.len());
            let xx = Array2::from_shape_fn(shape, |(_, j)| xv[j]);
            let yy = Array2::from_shape_fn(shape, |(i, _)| yv[i]);
            Ok((
                Layout::Grid(y.dims[0].clone(), x.dims[0].clone()),
                xx.into_dyn(),
                yy.into_dyn(),
            ))
        }
        (2, 2) => {
            if x.dims != y.dims || x.shape() != y.shape() {
                return Err(shape_error(format!(
                    "{} ({}) and {} ({}) are on different grids",
                    x_name,
                    x.dims.join(", "),
                    y_name,
                    y.dims.join(", ")
                )));
            }
            Ok((
                Layout::Grid(x.dims[0].clone(), x.dims[1].clone()),
                x.data.clone(),
                y.data.clone(),
            ))
        }
        (2, 1) => {
            let xx = to_2d(x.data.clone(), x_name)?;
            let yy = broadcast(&to_1d(y, y_name)?, &y.dims[0], &x.dims, xx.dim())?;
            Ok((
                Layout::Grid(x.dims[0].clone(), x.dims[1].clone()),
                xx.into_dyn(),
                yy.into_dyn(),
            ))
        }
        (1, 2) => {
            let yy = to_2d(y.data.clone(), y_name)?;
            let xx = broadcast(&to_1d(x, x_name)?, &x.dims[0], &y.dims, yy.dim())?;
            Ok((
                Layout::Grid(y.dims[0].clone(), y.dims[1].clone()),
                xx.into_dyn(),
                yy.into_dyn(),
            ))
        }
        (nx, ny) => Err(shape_error(format!(
            "{} has rank {} and {} has rank {}",
            x_name, nx, y_name, ny
        ))),
    }
}

/// Largest absolute difference between neighbours along `axis`. NaN values
/// count as an infinite spread.
fn spread(values: &Array2<f64>, axis: Axis) -> f64 {
    let mut largest: f64 = 0.0;
    for i in 1..values.len_of(axis) {
        let prev = values.index_axis(axis, i - 1);
        let next = values.index_axis(axis, i);
        for (a, b) in prev.iter().zip(next.iter()) {
            let diff = (b - a).abs();
            if diff.is_nan() {
                return f64::INFINITY;
            }
            largest = largest.max(diff);
        }
    }
    largest
}

/// Whether x varies only along columns and y only along rows.
fn is_separable(x: &Array2<f64>, y: &Array2<f64>) -> bool {
    if x.is_empty() || x.iter().chain(y.iter()).any(|v| v.is_nan()) {
        return false;
    }
    spread(x, Axis(0)) < SEPARABLE_TOLERANCE && spread(y, Axis(1)) < SEPARABLE_TOLERANCE
}

/// A new coordinate variable, keeping the non-frame attributes of the old one.
fn coordinate(old: &Variable, dims: &[&str], data: ArrayD<f64>) -> CfResult<Variable> {
    let mut var = Variable::new(dims, data)?;
    var.attrs = old
        .attrs
        .iter()
        .filter(|(key, _)| !FRAME_ATTRS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Ok(var)
}

/// Remove every clause naming `mapping` from the `grid_mapping` attribute of
/// the data variables. Returns the variables that had one.
fn detach(dataset: &mut Dataset, mapping: &str) -> Vec<String> {
    let mut detached = Vec::new();
    for name in dataset.data_var_names() {
        let Some(var) = dataset.data_var_mut(&name) else {
            continue;
        };
        let Some(text) = var.text_attr("grid_mapping") else {
            continue;
        };
        let clauses = parse_clauses(text);
        if !clauses.iter().any(|(clause, _)| clause == mapping) {
            continue;
        }
        let kept: Vec<_> = clauses.into_iter().filter(|(clause, _)| clause != mapping).collect();
        if kept.is_empty() {
            var.attrs.remove("grid_mapping");
        } else {
            var.set_attr("grid_mapping", format_clauses(&kept));
        }
        detached.push(name);
    }
    detached
}

/// Re-project the coordinates of a dataset into a new reference frame.
///
/// The old axes are read (and meshed when both are 1-D on different
/// dimensions), transformed from the frame of `old` to the frame of `new`,
/// and stored under `new_axes`. The old grid-mapping variable and axes are
/// dropped. When the projected x only varies along columns and y only along
/// rows, the new axes are stored 1-D and the grid dimensions are renamed to
/// the new axis names; otherwise they are 2-D auxiliary coordinates on the
/// old dimensions. Data variables that referred to the old mapping are
/// attributed to the new one.
pub fn change_crs(
    dataset: &Dataset,
    old_axes: (&str, &str),
    old: CrsRef,
    new_axes: (&str, &str),
    new: CrsRef,
) -> CfResult<Dataset> {
    let (old_name, old_frame) = old.frame(dataset)?;
    let new_mapping = new.mapping(dataset)?;
    let new_frame = new_mapping.decode()?;

    let (old_x_name, old_y_name) = old_axes;
    let (new_x_name, new_y_name) = new_axes;
    let old_x = dataset
        .variable(old_x_name)
        .ok_or_else(|| CfError::VariableNotFound(old_x_name.to_string()))?;
    let old_y = dataset
        .variable(old_y_name)
        .ok_or_else(|| CfError::VariableNotFound(old_y_name.to_string()))?;

    let (layout, x, y) = mesh(old_x, old_y, old_axes)?;
    let (new_x, new_y) = crs::transform(&x, &y, &old_frame, &new_frame)?;

    let mut result = dataset.clone();
    result.remove(&old_name);
    result.remove(old_x_name);
    result.remove(old_y_name);

    match layout {
        Layout::Points(dim) => {
            result.insert_coord(new_x_name, coordinate(old_x, &[dim.as_str()], new_x)?)?;
            result.insert_coord(new_y_name, coordinate(old_y, &[dim.as_str()], new_y)?)?;
        }
        Layout::Grid(row, col) => {
            let new_x = to_2d(new_x, new_x_name)?;
            let new_y = to_2d(new_y, new_y_name)?;
            if is_separable(&new_x, &new_y) {
                debug!(x = new_x_name, y = new_y_name, "Projected coordinates are separable");
                result.rename_dims(&[(row.as_str(), new_y_name), (col.as_str(), new_x_name)])?;
                let xs = new_x.row(0).to_owned().into_dyn();
                let ys = new_y.column(0).to_owned().into_dyn();
                result.insert_coord(new_x_name, coordinate(old_x, &[new_x_name], xs)?)?;
                result.insert_coord(new_y_name, coordinate(old_y, &[new_y_name], ys)?)?;
            } else {
                let dims = [row.as_str(), col.as_str()];
                result.insert_coord(new_x_name, coordinate(old_x, &dims, new_x.into_dyn())?)?;
                result.insert_coord(new_y_name, coordinate(old_y, &dims, new_y.into_dyn())?)?;
            }
        }
    }

    let affected = detach(&mut result, &old_name);
    result.insert_data_var(&new_mapping.name, new_mapping.to_variable())?;
    attribute_in_place(&mut result, &new_mapping, new_axes, Some(&affected))?;

    info!(
        from = %old_name,
        to = %new_mapping.name,
        variables = affected.len(),
        "Changed CRS"
    );
    Ok(result)
}
