//! Causal moving maximum.

use candle_core::Tensor;

use crate::core::checks::{expect_batch_seq, expect_float, expect_positive};
use crate::core::Result;

use super::pad_constant;

/// Maximum of `x[i, j - window + 1 ..= j]` for every position `j`.
///
/// The leading positions, which have fewer than `window` predecessors, take
/// the maximum over the values that exist: the sequence is left-padded with
/// `-inf` and max-pooled with a `(1, window)` kernel at stride 1.
pub fn moving_max(x: &Tensor, window: usize) -> Result<Tensor> {
    expect_positive("window", window)?;
    let shape = expect_batch_seq(x, "x")?;
    expect_float(x, "x")?;

    let padded = pad_constant(x, window - 1, 0, f64::NEG_INFINITY)?;
    let pooled = padded
        .reshape((shape.batch, 1, 1, shape.seq_len + window - 1))?
        .max_pool2d_with_stride((1, window), (1, 1))?;
    Ok(pooled.reshape((shape.batch, shape.seq_len))?)
}
