//! Scalar `f64` oracles for the window primitives and chunkwise attention.
//!
//! These loops favour clarity over performance. They evaluate each chunk's
//! softmax against that chunk's own maximum in double precision, so they stay
//! exact where the efficient tensor path does not, and serve as the baseline
//! for validating both tensor paths.

use candle_core::{DType, Tensor};

use crate::core::checks::expect_batch_seq;
use crate::core::Result;

/// Copy a `[batch, seq_len]` tensor into row vectors of `f64`.
pub fn tensor_rows(tensor: &Tensor) -> Result<Vec<Vec<f64>>> {
    expect_batch_seq(tensor, "tensor")?;
    Ok(tensor.to_dtype(DType::F64)?.to_vec2::<f64>()?)
}

/// Zero-padded window sum over `row[j - back ..= j + forward]`.
pub fn naive_moving_sum(rows: &[Vec<f64>], back: usize, forward: usize) -> Vec<Vec<f64>> {
    rows.iter()
        .map(|row| {
            (0..row.len())
                .map(|j| {
                    let start = j.saturating_sub(back);
                    let end = (j + forward).min(row.len() - 1);
                    row[start..=end].iter().sum::<f64>()
                })
                .collect()
        })
        .collect()
}

/// Causal window max over the in-range part of `row[j - window + 1 ..= j]`.
pub fn naive_moving_max(rows: &[Vec<f64>], window: usize) -> Vec<Vec<f64>> {
    let window = window.max(1);
    rows.iter()
        .map(|row| {
            (0..row.len())
                .map(|j| {
                    let start = (j + 1).saturating_sub(window);
                    row[start..=j]
                        .iter()
                        .copied()
                        .fold(f64::NEG_INFINITY, f64::max)
                })
                .collect()
        })
        .collect()
}

/// Chunkwise attention with a per-chunk softmax shift.
///
/// `beta[j] = sum_{k=j}^{j+w-1} alpha[k] * exp(u[j] - m_k) / sum_{l=k-w+1}^{k} exp(u[l] - m_k)`
/// where `m_k` is the largest logit in the chunk ending at `k`.
pub fn naive_chunkwise_attention(
    chunk_size: usize,
    emit_probs: &[Vec<f64>],
    softmax_logits: &[Vec<f64>],
) -> Vec<Vec<f64>> {
    let window = chunk_size.max(1);
    emit_probs
        .iter()
        .zip(softmax_logits.iter())
        .map(|(alpha, logits)| {
            let seq_len = logits.len();
            let chunks: Vec<(f64, f64)> = (0..seq_len)
                .map(|k| {
                    let chunk = &logits[(k + 1).saturating_sub(window)..=k];
                    let max = chunk.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    let denom = chunk.iter().map(|u| (u - max).exp()).sum::<f64>();
                    (max, denom)
                })
                .collect();

            (0..seq_len)
                .map(|j| {
                    (j..(j + window).min(seq_len))
                        .map(|k| {
                            let (max, denom) = chunks[k];
                            alpha[k] * (logits[j] - max).exp() / denom
                        })
                        .sum::<f64>()
                })
                .collect()
        })
        .collect()
}
