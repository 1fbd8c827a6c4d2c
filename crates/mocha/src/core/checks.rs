//! Boundary validation shared by the window primitives and both attention paths.
//!
//! These routines return [`MochaError`] so call sites can propagate problems
//! with `?` instead of panicking deep inside a tensor op.

use candle_core::{DType, Tensor};

use super::errors::{MochaError, Result};
use super::ChunkwiseShape;

/// Dtypes the chunkwise computations accept.
pub const FLOAT_DTYPES: [DType; 4] = [DType::F32, DType::F64, DType::F16, DType::BF16];

/// Ensures `tensor` is a non-empty `[batch, seq_len]` array.
pub fn expect_batch_seq(tensor: &Tensor, name: &str) -> Result<ChunkwiseShape> {
    let (batch, seq_len) = tensor.dims2().map_err(|_| {
        MochaError::shape(format!(
            "{name} must have shape [batch, seq_len], got {:?}",
            tensor.dims()
        ))
    })?;
    if batch == 0 || seq_len == 0 {
        return Err(MochaError::shape(format!(
            "{name} must have non-empty batch and sequence axes, got [{batch}, {seq_len}]"
        )));
    }
    Ok(ChunkwiseShape { batch, seq_len })
}

/// Checks the tensor dtype is one of [`FLOAT_DTYPES`].
pub fn expect_float(tensor: &Tensor, name: &str) -> Result<()> {
    let dtype = tensor.dtype();
    if FLOAT_DTYPES.contains(&dtype) {
        Ok(())
    } else {
        Err(MochaError::UnsupportedDType {
            requested: format!("{dtype:?} for {name}"),
        })
    }
}

/// Rejects a zero length, count or window for `arg`.
pub fn expect_positive(arg: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(MochaError::argument(arg, "must be at least 1"));
    }
    Ok(())
}

/// Validates the `(chunk_size, emit_probs, softmax_logits)` triple.
pub fn expect_chunkwise_inputs(
    chunk_size: usize,
    emit_probs: &Tensor,
    softmax_logits: &Tensor,
) -> Result<ChunkwiseShape> {
    expect_positive("chunk_size", chunk_size)?;

    if !emit_probs.device().same_device(softmax_logits.device()) {
        return Err(MochaError::shape(
            "emit_probs and softmax_logits must reside on the same device",
        ));
    }

    expect_float(emit_probs, "emit_probs")?;
    expect_float(softmax_logits, "softmax_logits")?;
    if emit_probs.dtype() != softmax_logits.dtype() {
        return Err(MochaError::UnsupportedDType {
            requested: format!(
                "emit_probs and softmax_logits must share a dtype, got {:?} and {:?}",
                emit_probs.dtype(),
                softmax_logits.dtype()
            ),
        });
    }

    let shape = expect_batch_seq(emit_probs, "emit_probs")?;
    let logits_shape = expect_batch_seq(softmax_logits, "softmax_logits")?;
    if shape != logits_shape {
        return Err(MochaError::shape(format!(
            "softmax_logits shape mismatch: expected [{}, {}] got [{}, {}]",
            shape.batch, shape.seq_len, logits_shape.batch, logits_shape.seq_len
        )));
    }
    Ok(shape)
}
