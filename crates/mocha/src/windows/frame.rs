//! Builders for sliding frames of a `[batch, seq_len]` tensor.
//!
//! A frame tensor has shape `[batch, seq_len, window]`. Entry `[i, j, o]` is the
//! `o`-th element of the window anchored at `j`; positions that fall outside
//! the sequence hold `pad`.

use candle_core::Tensor;

use crate::core::checks::{expect_batch_seq, expect_positive};
use crate::core::Result;

use super::pad_constant;

/// Frames of length `window` ending at each position: `[i, j, o] = x[i, j - window + 1 + o]`.
pub fn frame_backward(x: &Tensor, window: usize, pad: f64) -> Result<Tensor> {
    expect_positive("window", window)?;
    let shape = expect_batch_seq(x, "x")?;
    let padded = pad_constant(x, window - 1, 0, pad)?;
    stack_offsets(&padded, window, shape.seq_len)
}

/// Frames of length `window` starting at each position: `[i, j, o] = x[i, j + o]`.
pub fn frame_forward(x: &Tensor, window: usize, pad: f64) -> Result<Tensor> {
    expect_positive("window", window)?;
    let shape = expect_batch_seq(x, "x")?;
    let padded = pad_constant(x, 0, window - 1, pad)?;
    stack_offsets(&padded, window, shape.seq_len)
}

fn stack_offsets(padded: &Tensor, window: usize, seq_len: usize) -> Result<Tensor> {
    let columns = (0..window)
        .map(|offset| padded.narrow(1, offset, seq_len))
        .collect::<candle_core::Result<Vec<_>>>()?;
    Ok(Tensor::stack(&columns, 2)?)
}
