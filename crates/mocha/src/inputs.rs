//! Synthetic inputs for exercising the chunkwise attention paths.
//!
//! Emit probabilities are uniform draws normalised so each row sums to one;
//! logits are standard-normal draws. Both come from a seeded [`StdRng`] so a
//! comparison run can be repeated exactly.

use candle_core::{DType, Device, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::checks::{expect_batch_seq, expect_positive};
use crate::core::{MochaError, Result};

/// Generate `(emit_probs, softmax_logits)` of shape `[batch, seq_len]` in `f32`.
pub fn random_inputs(
    batch: usize,
    seq_len: usize,
    seed: u64,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    expect_positive("batch", batch)?;
    expect_positive("seq_len", seq_len)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut emit_probs = Vec::with_capacity(batch * seq_len);
    for _ in 0..batch {
        let row: Vec<f32> = (0..seq_len).map(|_| rng.gen_range(1e-6f32..1.0)).collect();
        let total: f32 = row.iter().sum();
        emit_probs.extend(row.into_iter().map(|v| v / total));
    }

    // Box-Muller transform for standard normal draws.
    let logits: Vec<f32> = (0..batch * seq_len)
        .map(|_| {
            let u1: f32 = rng.gen_range(1e-7f32..1.0f32);
            let u2: f32 = rng.gen_range(0.0f32..std::f32::consts::TAU);
            (-2.0 * u1.ln()).sqrt() * u2.cos()
        })
        .collect();

    Ok((
        Tensor::from_vec(emit_probs, (batch, seq_len), device)?,
        Tensor::from_vec(logits, (batch, seq_len), device)?,
    ))
}

/// Subtract `amount` from the logits at `positions` of `row`.
///
/// Pushing a few logits far below the rest of their row widens the row's
/// dynamic range beyond what a single global shift can represent, which is
/// where the efficient path stops matching the stable one.
pub fn suppress_logits(
    softmax_logits: &Tensor,
    row: usize,
    positions: &[usize],
    amount: f64,
) -> Result<Tensor> {
    let shape = expect_batch_seq(softmax_logits, "softmax_logits")?;
    if row >= shape.batch {
        return Err(MochaError::argument(
            "row",
            format!("{row} is out of range for batch {}", shape.batch),
        ));
    }

    let mut delta = vec![0f64; shape.batch * shape.seq_len];
    for &position in positions {
        if position >= shape.seq_len {
            return Err(MochaError::argument(
                "positions",
                format!("{position} is out of range for seq_len {}", shape.seq_len),
            ));
        }
        delta[row * shape.seq_len + position] = amount;
    }

    let delta = Tensor::from_vec(delta, (shape.batch, shape.seq_len), softmax_logits.device())?
        .to_dtype(softmax_logits.dtype())?;
    Ok(softmax_logits.sub(&delta)?)
}

/// Convenience for callers that want `f64` inputs.
pub fn random_inputs_f64(
    batch: usize,
    seq_len: usize,
    seed: u64,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let (emit_probs, softmax_logits) = random_inputs(batch, seq_len, seed, device)?;
    Ok((
        emit_probs.to_dtype(DType::F64)?,
        softmax_logits.to_dtype(DType::F64)?,
    ))
}
