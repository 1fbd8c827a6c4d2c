//! Sliding-window primitives over the sequence axis of `[batch, seq_len]` tensors.
//!
//! Every window here runs along dimension 1. Out-of-range positions are filled
//! with a pad value chosen per operation: zeros for sums, `-inf` for maxima,
//! and caller-chosen values for frames.

pub mod frame;
pub mod moving_max;
pub mod moving_sum;

use candle_core::{DType, Tensor};

use crate::core::Result;

pub use frame::{frame_backward, frame_forward};
pub use moving_max::moving_max;
pub use moving_sum::moving_sum;

/// Pad the sequence axis with `left` and `right` copies of `value`.
///
/// The pad tensors are built in `f64` and cast, so infinities survive the
/// conversion to any float dtype.
pub(crate) fn pad_constant(x: &Tensor, left: usize, right: usize, value: f64) -> Result<Tensor> {
    if value == 0.0 {
        return Ok(x.pad_with_zeros(1, left, right)?);
    }
    let (batch, _) = x.dims2()?;
    let fill = |len: usize| -> Result<Tensor> {
        Ok(Tensor::full(value, (batch, len), x.device())?.to_dtype(x.dtype())?)
    };

    let mut parts = Vec::with_capacity(3);
    if left > 0 {
        parts.push(fill(left)?);
    }
    parts.push(x.clone());
    if right > 0 {
        parts.push(fill(right)?);
    }
    if parts.len() == 1 {
        return Ok(x.clone());
    }
    Ok(Tensor::cat(&parts, 1)?)
}

/// Scalar tensor of `value` broadcast to the shape and dtype of `like`.
pub(crate) fn full_like(like: &Tensor, value: f64) -> Result<Tensor> {
    let scalar = Tensor::new(value, like.device())?.to_dtype(like.dtype())?;
    Ok(scalar.broadcast_as(like.shape())?)
}

/// Promote `x` to `dtype` without copying when it already matches.
pub(crate) fn cast(x: &Tensor, dtype: DType) -> Result<Tensor> {
    if x.dtype() == dtype {
        Ok(x.clone())
    } else {
        Ok(x.to_dtype(dtype)?)
    }
}

#[cfg(test)]
mod tests;
