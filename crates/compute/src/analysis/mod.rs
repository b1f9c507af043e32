pub mod spatial;
pub mod statistics;

use std::panic::{AssertUnwindSafe, catch_unwind};

use geo::{CoordsIter, MultiPolygon, Polygon};

use crate::analysis::spatial::ClassifyError;

/// Runs a geometry operation, turning a panic inside the geometry library into an error.
pub(crate) fn guarded<T>(op: impl FnOnce() -> T) -> Result<T, ClassifyError> {
    catch_unwind(AssertUnwindSafe(op)).map_err(|_| ClassifyError::OperationFailed)
}

/// Rejects geometry the boolean operations cannot handle: non-finite coordinates and rings
/// with fewer than four positions.
pub(crate) fn validate_polygon(poly: &Polygon<f64>) -> Result<(), ClassifyError> {
    if poly.exterior().0.len() < 4 {
        return Err(ClassifyError::Degenerate("outer ring has fewer than four positions"));
    }
    if poly.interiors().iter().any(|ring| ring.0.len() < 4) {
        return Err(ClassifyError::Degenerate("hole has fewer than four positions"));
    }
    if poly
        .coords_iter()
        .any(|c| !(c.x.is_finite() && c.y.is_finite()))
    {
        return Err(ClassifyError::Degenerate("non-finite coordinate"));
    }
    Ok(())
}

pub(crate) fn validate_multi_polygon(mp: &MultiPolygon<f64>) -> Result<(), ClassifyError> {
    if mp.0.is_empty() {
        return Err(ClassifyError::Degenerate("empty multi-polygon"));
    }
    mp.0.iter().try_for_each(validate_polygon)
}
