//! Exact chunkwise attention with a per-chunk softmax shift.
//!
//! Every chunk ending at step `k` is normalised against its own maximum
//! `m[k]`, computed with a causal moving max. The output at step `j` gathers
//! the `chunk_size` chunks that contain `j`:
//!
//! ```text
//! beta[j] = sum_o alpha[j+o] * exp(u[j] - m[j+o]) / D[j+o]
//! D[k]    = sum_o exp(u[k-w+1+o] - m[k])
//! ```
//!
//! The frames make this `O(seq_len * chunk_size)` in memory. Pad values are
//! chosen so out-of-range terms vanish: `-inf` logits contribute `exp(-inf) = 0`
//! to a denominator, and `+inf` maxima and denominators turn trailing terms
//! into `0 / inf = 0`.

use std::sync::OnceLock;

use candle_core::Tensor;

use crate::core::{ChunkwiseAttention, Config, Result};
use crate::windows::{cast, frame_backward, frame_forward, moving_max};

use super::prepare;

/// Overflow-safe chunkwise attention, exact for any logit range.
#[derive(Debug, Default)]
pub struct StableChunkwiseAttention {
    first_call: OnceLock<()>,
}

impl StableChunkwiseAttention {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkwiseAttention for StableChunkwiseAttention {
    fn attend(
        &self,
        chunk_size: usize,
        emit_probs: &Tensor,
        softmax_logits: &Tensor,
        config: &Config,
    ) -> Result<Tensor> {
        let prepared = prepare(chunk_size, emit_probs, softmax_logits, config)?;

        if self.first_call.set(()).is_ok() {
            log::info!("mocha::stable init precision={:?}", config.precision);
        }
        log::debug!(
            "stable chunkwise attention batch={} seq_len={} chunk_size={} frame_elems={}",
            prepared.shape.batch,
            prepared.shape.seq_len,
            chunk_size,
            prepared.shape.batch * prepared.shape.seq_len * chunk_size
        );

        let probs = stable_probs(chunk_size, &prepared.emit_probs, &prepared.softmax_logits)?;
        cast(&probs, prepared.output_dtype)
    }
}

fn stable_probs(chunk_size: usize, emit_probs: &Tensor, softmax_logits: &Tensor) -> Result<Tensor> {
    let logits_max = moving_max(softmax_logits, chunk_size)?;

    let framed_logits = frame_backward(softmax_logits, chunk_size, f64::NEG_INFINITY)?;
    let softmax_denominators = framed_logits
        .broadcast_sub(&logits_max.unsqueeze(2)?)?
        .exp()?
        .sum(2)?;

    let framed_denominators = frame_forward(&softmax_denominators, chunk_size, f64::INFINITY)?;
    let framed_logits_max = frame_forward(&logits_max, chunk_size, f64::INFINITY)?;
    let softmax_numerators = softmax_logits
        .unsqueeze(2)?
        .broadcast_sub(&framed_logits_max)?
        .exp()?;

    let framed_probs = frame_forward(emit_probs, chunk_size, 0.0)?;
    Ok(framed_probs
        .mul(&softmax_numerators)?
        .div(&framed_denominators)?
        .sum(2)?)
}
