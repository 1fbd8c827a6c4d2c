//! Efficient chunkwise attention built from two moving sums.
//!
//! The logits of each row are shifted by the row maximum once, exponentiated,
//! and clipped from below to [`Config::clamp_floor`]. Chunk denominators are a
//! trailing moving sum of those exponentials; the emit probabilities divided
//! by the denominators are then gathered with a leading moving sum.
//!
//! A single global shift cannot normalise every chunk. When a row's logits
//! span more than the float format can represent after one shift, chunks far
//! below the row maximum underflow to the clamp floor and the result drifts
//! from the exact value without any error being raised. Callers that need
//! exactness for such inputs should use
//! [`StableChunkwiseAttention`](super::StableChunkwiseAttention).

use std::sync::OnceLock;

use candle_core::Tensor;

use crate::core::{ChunkwiseAttention, Config, Result};
use crate::windows::{cast, full_like, moving_sum};

use super::prepare;

/// Chunkwise attention with a global logit shift and clipped exponentials.
#[derive(Debug, Default)]
pub struct EfficientChunkwiseAttention {
    first_call: OnceLock<()>,
}

impl EfficientChunkwiseAttention {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkwiseAttention for EfficientChunkwiseAttention {
    fn attend(
        &self,
        chunk_size: usize,
        emit_probs: &Tensor,
        softmax_logits: &Tensor,
        config: &Config,
    ) -> Result<Tensor> {
        let prepared = prepare(chunk_size, emit_probs, softmax_logits, config)?;

        if self.first_call.set(()).is_ok() {
            log::info!(
                "mocha::efficient init clamp_floor={:e} precision={:?}",
                config.clamp_floor,
                config.precision
            );
        }
        log::debug!(
            "efficient chunkwise attention batch={} seq_len={} chunk_size={}",
            prepared.shape.batch,
            prepared.shape.seq_len,
            chunk_size
        );

        let probs = efficient_probs(
            chunk_size,
            &prepared.emit_probs,
            &prepared.softmax_logits,
            config.clamp_floor,
        )?;
        cast(&probs, prepared.output_dtype)
    }
}

fn efficient_probs(
    chunk_size: usize,
    emit_probs: &Tensor,
    softmax_logits: &Tensor,
    clamp_floor: f32,
) -> Result<Tensor> {
    // A one-step chunk puts all softmax mass on its own logit.
    if chunk_size == 1 {
        return Ok(emit_probs.clone());
    }

    let row_max = softmax_logits.max_keepdim(1)?;
    let exp_logits = softmax_logits.broadcast_sub(&row_max)?.exp()?;
    let exp_logits = exp_logits.maximum(&full_like(&exp_logits, f64::from(clamp_floor))?)?;

    let softmax_denominators = moving_sum(&exp_logits, chunk_size - 1, 0)?;
    let emit_over_denominators = emit_probs.div(&softmax_denominators)?;
    let gathered = moving_sum(&emit_over_denominators, 0, chunk_size - 1)?;
    Ok(exp_logits.mul(&gathered)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MochaError, PrecisionPolicy};
    use crate::reference::{naive_chunkwise_attention, tensor_rows};
    use candle_core::{DType, Device};

    fn build_inputs(device: &Device) -> candle_core::Result<(Tensor, Tensor)> {
        let alpha = Tensor::from_vec(
            vec![0.1f32, 0.2, 0.3, 0.15, 0.25, 0.4, 0.1, 0.1, 0.2, 0.2],
            (2, 5),
            device,
        )?;
        let logits = Tensor::from_vec(
            vec![0.3f32, -1.2, 0.8, 2.0, -0.4, 1.1, 0.0, -0.7, 0.5, 1.6],
            (2, 5),
            device,
        )?;
        Ok((alpha, logits))
    }

    #[test]
    fn matches_reference_on_small_range_logits() -> Result<()> {
        let (alpha, logits) = build_inputs(&Device::Cpu)?;
        let out = EfficientChunkwiseAttention::new().attend(3, &alpha, &logits, &Config::default())?;
        let expected = naive_chunkwise_attention(3, &tensor_rows(&alpha)?, &tensor_rows(&logits)?);
        for (row, expected_row) in tensor_rows(&out)?.iter().zip(expected.iter()) {
            for (value, want) in row.iter().zip(expected_row.iter()) {
                assert!((value - want).abs() < 1e-6, "expected {want}, got {value}");
            }
        }
        Ok(())
    }

    #[test]
    fn unit_chunk_returns_emit_probs() -> Result<()> {
        let (alpha, logits) = build_inputs(&Device::Cpu)?;
        let out = EfficientChunkwiseAttention::new().attend(1, &alpha, &logits, &Config::default())?;
        assert_eq!(out.to_vec2::<f32>()?, alpha.to_vec2::<f32>()?);
        Ok(())
    }

    #[test]
    fn clamp_floor_bounds_underflowing_exponentials() -> Result<()> {
        let device = Device::Cpu;
        let alpha = Tensor::from_vec(vec![0.5f32, 0.5], (1, 2), &device)?;
        let logits = Tensor::from_vec(vec![0.0f32, -1e4], (1, 2), &device)?;
        let config = Config {
            clamp_floor: 1e-3,
            ..Config::default()
        };
        let out = EfficientChunkwiseAttention::new()
            .attend(2, &alpha, &logits, &config)?
            .to_vec2::<f32>()?;
        // exp(-1e4) underflows and is replaced by the floor instead of zero.
        assert!(out[0][1] > 0.0);
        assert!(out[0].iter().all(|v| v.is_finite()));
        Ok(())
    }

    #[test]
    fn force_f32_round_trips_reduced_precision() -> Result<()> {
        let (alpha, logits) = build_inputs(&Device::Cpu)?;
        let config = Config {
            precision: PrecisionPolicy::ForceF32,
            ..Config::default()
        };
        let reference = EfficientChunkwiseAttention::new().attend(2, &alpha, &logits, &config)?;
        let out = EfficientChunkwiseAttention::new().attend(
            2,
            &alpha.to_dtype(DType::BF16)?,
            &logits.to_dtype(DType::BF16)?,
            &config,
        )?;
        assert_eq!(out.dtype(), DType::BF16);
        let diff = out
            .to_dtype(DType::F32)?
            .sub(&reference)?
            .abs()?
            .max_all()?
            .to_vec0::<f32>()?;
        assert!(diff < 5e-2, "bf16 diverged by {diff}");
        Ok(())
    }

    #[test]
    fn rejects_invalid_floor() {
        let (alpha, logits) = build_inputs(&Device::Cpu).unwrap();
        let config = Config {
            clamp_floor: 0.0,
            ..Config::default()
        };
        let err = EfficientChunkwiseAttention::new()
            .attend(2, &alpha, &logits, &config)
            .unwrap_err();
        assert!(matches!(err, MochaError::InvalidArgument { .. }));
    }
}
