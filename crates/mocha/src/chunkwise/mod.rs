//! Chunkwise attention implementations.
//!
//! [`EfficientChunkwiseAttention`] trades exactness for `O(seq_len)` memory;
//! [`StableChunkwiseAttention`] is exact for any logit range at
//! `O(seq_len * chunk_size)` memory. Both agree to within rounding when the
//! logits of a row span a modest range.

pub mod efficient;
pub mod stable;

use candle_core::{DType, Tensor};

use crate::core::checks::expect_chunkwise_inputs;
use crate::core::{ChunkwiseAttention, ChunkwiseShape, Config, Result};
use crate::windows::cast;

pub use efficient::EfficientChunkwiseAttention;
pub use stable::StableChunkwiseAttention;

/// Efficient, clipped chunkwise attention with the environment-derived [`Config`].
pub fn efficient_chunkwise_attention(
    chunk_size: usize,
    emit_probs: &Tensor,
    softmax_logits: &Tensor,
) -> Result<Tensor> {
    EfficientChunkwiseAttention::new().attend(
        chunk_size,
        emit_probs,
        softmax_logits,
        &Config::from_env(),
    )
}

/// Exact, overflow-safe chunkwise attention with the environment-derived [`Config`].
pub fn stable_chunkwise_attention(
    chunk_size: usize,
    emit_probs: &Tensor,
    softmax_logits: &Tensor,
) -> Result<Tensor> {
    StableChunkwiseAttention::new().attend(
        chunk_size,
        emit_probs,
        softmax_logits,
        &Config::from_env(),
    )
}

/// Inputs after validation and dtype promotion.
struct Prepared {
    shape: ChunkwiseShape,
    output_dtype: DType,
    emit_probs: Tensor,
    softmax_logits: Tensor,
}

fn prepare(
    chunk_size: usize,
    emit_probs: &Tensor,
    softmax_logits: &Tensor,
    config: &Config,
) -> Result<Prepared> {
    config.validate()?;
    let shape = expect_chunkwise_inputs(chunk_size, emit_probs, softmax_logits)?;
    let output_dtype = emit_probs.dtype();
    let compute = config.precision.compute_dtype(output_dtype);
    Ok(Prepared {
        shape,
        output_dtype,
        emit_probs: cast(emit_probs, compute)?,
        softmax_logits: cast(softmax_logits, compute)?,
    })
}
