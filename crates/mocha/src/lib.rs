//! Monotonic chunkwise attention (MoChA) probabilities over Candle tensors.
//!
//! Given per-step emit probabilities `alpha` and softmax logits `u`, both laid
//! out as `[batch, seq_len]`, the chunkwise attention distribution `beta` at
//! step `j` is a softmax-weighted mixture of the emit probabilities of the
//! `chunk_size` steps starting at `j`:
//!
//! ```text
//! beta[j] = sum_{k=j}^{j+w-1} alpha[k] * exp(u[j]) / sum_{l=k-w+1}^{k} exp(u[l])
//! ```
//!
//! Two formulations are provided. The efficient path shifts all logits of a row
//! by their global maximum and uses two moving sums; it is cheap but silently
//! loses precision when a row's logits span an extreme range. The stable path
//! normalises every chunk against its own maximum and is exact to rounding at
//! the price of `O(seq_len * chunk_size)` memory.
//!
//! Both paths validate their inputs up front and report problems through
//! [`MochaError`]; the computation itself is deterministic and side-effect
//! free.

pub mod chunkwise;
pub mod compare;
pub mod core;
pub mod inputs;
pub mod reference;
pub mod windows;

pub use chunkwise::{
    efficient_chunkwise_attention, stable_chunkwise_attention, EfficientChunkwiseAttention,
    StableChunkwiseAttention,
};
pub use crate::core::{
    ChunkwiseAttention, ChunkwiseShape, Config, MochaError, PrecisionPolicy, Result,
};
