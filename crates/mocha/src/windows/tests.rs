use super::*;
use crate::core::MochaError;
use crate::reference::{naive_moving_max, naive_moving_sum, tensor_rows};
use candle_core::{DType, Device, Result as CandleResult, Tensor};

fn sample(device: &Device) -> CandleResult<Tensor> {
    let data: Vec<f32> = (0..21)
        .map(|i| ((i * 7 % 11) as f32) * 0.5 - 2.0)
        .collect();
    Tensor::from_vec(data, (3, 7), device)
}

fn assert_rows_close(actual: &[Vec<f64>], expected: &[Vec<f64>], tol: f64) {
    assert_eq!(actual.len(), expected.len());
    for (a_row, e_row) in actual.iter().zip(expected.iter()) {
        assert_eq!(a_row.len(), e_row.len());
        for (a, e) in a_row.iter().zip(e_row.iter()) {
            assert!((a - e).abs() <= tol, "expected {e}, got {a}");
        }
    }
}

#[test]
fn moving_sum_degenerate_window_is_identity() -> Result<()> {
    let x = sample(&Device::Cpu)?;
    let out = moving_sum(&x, 0, 0)?;
    assert_eq!(out.dims(), x.dims());
    assert_eq!(out.to_vec2::<f32>()?, x.to_vec2::<f32>()?);
    Ok(())
}

#[test]
fn moving_sum_accepts_bf16() -> Result<()> {
    let x = sample(&Device::Cpu)?;
    let rows = tensor_rows(&x)?;
    let out = moving_sum(&x.to_dtype(DType::BF16)?, 2, 0)?;
    assert_eq!(out.dtype(), DType::BF16);
    assert_rows_close(&tensor_rows(&out)?, &naive_moving_sum(&rows, 2, 0), 5e-2);
    Ok(())
}

#[test]
fn moving_sum_matches_naive_windows() -> Result<()> {
    let x = sample(&Device::Cpu)?;
    let rows = tensor_rows(&x)?;
    for (back, forward) in [(1, 0), (0, 1), (2, 3), (6, 0), (0, 6), (9, 9)] {
        let out = tensor_rows(&moving_sum(&x, back, forward)?)?;
        assert_rows_close(&out, &naive_moving_sum(&rows, back, forward), 1e-5);
    }
    Ok(())
}

#[test]
fn moving_sum_in_double_precision() -> Result<()> {
    let x = sample(&Device::Cpu)?.to_dtype(DType::F64)?;
    let out = moving_sum(&x, 3, 1)?;
    assert_eq!(out.dtype(), DType::F64);
    let expected = naive_moving_sum(&tensor_rows(&x)?, 3, 1);
    assert_rows_close(&tensor_rows(&out)?, &expected, 1e-12);
    Ok(())
}

#[test]
fn moving_max_unit_window_is_identity() -> Result<()> {
    let x = sample(&Device::Cpu)?;
    let out = moving_max(&x, 1)?;
    assert_eq!(out.to_vec2::<f32>()?, x.to_vec2::<f32>()?);
    Ok(())
}

#[test]
fn moving_max_excludes_padding_from_result() -> Result<()> {
    let device = Device::Cpu;
    // All-negative rows expose any leak of zero padding into the result.
    let x = Tensor::from_vec(vec![-4.0f32, -9.0, -1.0, -6.0, -8.0], (1, 5), &device)?;
    let out = moving_max(&x, 3)?.to_vec2::<f32>()?;
    assert_eq!(out, vec![vec![-4.0, -4.0, -1.0, -1.0, -1.0]]);
    Ok(())
}

#[test]
fn moving_max_matches_naive_windows() -> Result<()> {
    let x = sample(&Device::Cpu)?;
    let rows = tensor_rows(&x)?;
    for window in [2, 3, 7, 12] {
        let out = tensor_rows(&moving_max(&x, window)?)?;
        assert_rows_close(&out, &naive_moving_max(&rows, window), 0.0);
    }
    Ok(())
}

#[test]
fn moving_max_rejects_zero_window() {
    let x = sample(&Device::Cpu).unwrap();
    let err = moving_max(&x, 0).unwrap_err();
    assert!(matches!(err, MochaError::InvalidArgument { arg: "window", .. }));
}

#[test]
fn window_primitives_reject_non_matrix_inputs() {
    let x = Tensor::zeros((2, 3, 4), DType::F32, &Device::Cpu).unwrap();
    assert!(matches!(
        moving_sum(&x, 1, 1).unwrap_err(),
        MochaError::InvalidShape { .. }
    ));
    assert!(matches!(
        moving_max(&x, 2).unwrap_err(),
        MochaError::InvalidShape { .. }
    ));
}

#[test]
fn frame_backward_left_pads() -> Result<()> {
    let device = Device::Cpu;
    let x = Tensor::from_vec(vec![1.0f32, 2.0, 3.0], (1, 3), &device)?;
    let frames = frame_backward(&x, 2, f64::NEG_INFINITY)?;
    assert_eq!(frames.dims(), &[1, 3, 2]);
    let values = frames.flatten_all()?.to_vec1::<f32>()?;
    assert_eq!(values, vec![f32::NEG_INFINITY, 1.0, 1.0, 2.0, 2.0, 3.0]);
    Ok(())
}

#[test]
fn frame_forward_right_pads() -> Result<()> {
    let device = Device::Cpu;
    let x = Tensor::from_vec(vec![1.0f32, 2.0, 3.0], (1, 3), &device)?;
    let frames = frame_forward(&x, 3, f64::INFINITY)?;
    assert_eq!(frames.dims(), &[1, 3, 3]);
    let values = frames.flatten_all()?.to_vec1::<f32>()?;
    let inf = f32::INFINITY;
    assert_eq!(values, vec![1.0, 2.0, 3.0, 2.0, 3.0, inf, 3.0, inf, inf]);

    let zero_padded = frame_forward(&x, 2, 0.0)?.flatten_all()?.to_vec1::<f32>()?;
    assert_eq!(zero_padded, vec![1.0, 2.0, 2.0, 3.0, 3.0, 0.0]);
    Ok(())
}

#[test]
fn frames_wider_than_sequence() -> Result<()> {
    let device = Device::Cpu;
    let x = Tensor::from_vec(vec![5.0f32, 6.0], (1, 2), &device)?;
    let frames = frame_backward(&x, 4, 0.0)?;
    assert_eq!(frames.dims(), &[1, 2, 4]);
    let values = frames.flatten_all()?.to_vec1::<f32>()?;
    assert_eq!(values, vec![0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 5.0, 6.0]);
    Ok(())
}
