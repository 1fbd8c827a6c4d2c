//! Core traits and types shared by the chunkwise attention paths.
//!
//! Implementations operate on two tensors laid out as `[batch, seq_len]`: the
//! monotonic emit probabilities and the chunk softmax logits. The output
//! mirrors that layout and the input dtype.

pub mod checks;
pub mod config;
pub mod errors;

use candle_core::Tensor;

pub use config::{Config, PrecisionPolicy};
pub use errors::{MochaError, Result};

/// Logical description of the `[batch, seq_len]` layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkwiseShape {
    /// Number of independent sequences.
    pub batch: usize,
    /// Number of timesteps per sequence.
    pub seq_len: usize,
}

/// Unified interface for chunkwise attention kernels.
///
/// * `emit_probs` and `softmax_logits` share the layout `[batch, seq_len]`,
///   dtype, and device.
/// * `chunk_size` must be at least 1; it may exceed `seq_len`.
/// * The returned tensor mirrors the layout and dtype of `emit_probs`.
pub trait ChunkwiseAttention {
    /// Compute the chunkwise attention distribution.
    fn attend(
        &self,
        chunk_size: usize,
        emit_probs: &Tensor,
        softmax_logits: &Tensor,
        config: &Config,
    ) -> Result<Tensor>;
}
