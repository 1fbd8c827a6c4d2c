//! Zero-padded moving sum.

use candle_core::{DType, Tensor};

use crate::core::checks::{expect_batch_seq, expect_float};
use crate::core::Result;

use super::cast;

/// Sum `x[i, j - back ..= j + forward]` for every position `j`.
///
/// Indices outside `[0, seq_len)` contribute zero. The window is realised as a
/// 1-D convolution with an all-ones kernel of length `back + forward + 1` over
/// the zero-padded sequence, so the cost does not grow with a per-position
/// loop over the window.
///
/// The CPU convolution has no `bf16` kernel, so `bf16` inputs are summed in
/// `f32` and cast back.
pub fn moving_sum(x: &Tensor, back: usize, forward: usize) -> Result<Tensor> {
    let shape = expect_batch_seq(x, "x")?;
    expect_float(x, "x")?;

    let conv_dtype = match x.dtype() {
        DType::BF16 => DType::F32,
        dtype => dtype,
    };
    let width = back + forward + 1;
    let padded = cast(x, conv_dtype)?.pad_with_zeros(1, back, forward)?;
    let kernel = Tensor::ones((1, 1, width), conv_dtype, x.device())?;
    let summed = padded
        .unsqueeze(1)?
        .conv1d(&kernel, 0, 1, 1, 1)?
        .reshape((shape.batch, shape.seq_len))?;
    cast(&summed, x.dtype())
}
