//! Element-wise agreement between two chunkwise attention outputs.

use std::fmt;

use candle_core::{DType, Tensor};

use crate::core::{MochaError, Result};

/// `numpy.allclose` default absolute tolerance.
pub const DEFAULT_ATOL: f64 = 1e-8;
/// `numpy.allclose` default relative tolerance.
pub const DEFAULT_RTOL: f64 = 1e-5;

/// Summary of how far `actual` strays from `expected`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    /// Largest `|actual - expected|`.
    pub max_abs: f64,
    /// Largest `|actual - expected| / |expected|` over non-zero expected values.
    pub max_rel: f64,
    /// Elements violating `|actual - expected| <= atol + rtol * |expected|`.
    pub mismatched: usize,
    /// Number of elements compared.
    pub total: usize,
}

impl Comparison {
    /// Whether every element satisfied the tolerance.
    pub fn all_close(&self) -> bool {
        self.mismatched == 0
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max_abs={:.3e} max_rel={:.3e} mismatched={}/{}",
            self.max_abs, self.max_rel, self.mismatched, self.total
        )
    }
}

/// Compare two tensors of identical shape in `f64`.
///
/// Non-finite pairs count as close only when both sides are equal, so a NaN
/// anywhere is always reported as a mismatch.
pub fn compare(actual: &Tensor, expected: &Tensor, atol: f64, rtol: f64) -> Result<Comparison> {
    if actual.dims() != expected.dims() {
        return Err(MochaError::shape(format!(
            "cannot compare {:?} with {:?}",
            actual.dims(),
            expected.dims()
        )));
    }

    let actual = actual.to_dtype(DType::F64)?.flatten_all()?.to_vec1::<f64>()?;
    let expected = expected.to_dtype(DType::F64)?.flatten_all()?.to_vec1::<f64>()?;

    let mut summary = Comparison {
        max_abs: 0.0,
        max_rel: 0.0,
        mismatched: 0,
        total: actual.len(),
    };
    for (a, e) in actual.iter().zip(expected.iter()) {
        if !a.is_finite() || !e.is_finite() {
            if a != e {
                summary.mismatched += 1;
                summary.max_abs = f64::INFINITY;
            }
            continue;
        }
        let abs = (a - e).abs();
        summary.max_abs = summary.max_abs.max(abs);
        if *e != 0.0 {
            summary.max_rel = summary.max_rel.max(abs / e.abs());
        }
        if abs > atol + rtol * e.abs() {
            summary.mismatched += 1;
        }
    }
    Ok(summary)
}
