//! Per-token masking probabilities.
//!
//! Without importance weights every position starts at the base rate. With
//! weights, each row is standardized and mapped to
//! `base * (1 + w_std / z)`, where `z` is the two-sided standard normal
//! critical value for the configured reliability, then clipped into `[0, 1]`.

use candle_core::{DType, Tensor};

use crate::config::MaskingConfig;
use crate::errors::{MaskingError, Result};
use crate::grid::{Grid, ProbabilityGrid, TokenGrid};

/// External informativeness of tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportanceWeights {
    /// One weight per vocabulary id, looked up by the token at each position.
    PerToken(Vec<f32>),
    /// One weight per position, shaped like the batch.
    PerPosition(Grid<f32>),
}

impl ImportanceWeights {
    /// Rank-1 tensors are per-token tables, rank-2 tensors are per-position.
    pub fn from_tensor(tensor: &Tensor) -> Result<Self> {
        match tensor.rank() {
            1 => Ok(Self::PerToken(tensor.to_dtype(DType::F32)?.to_vec1::<f32>()?)),
            2 => Ok(Self::PerPosition(Grid::<f32>::from_tensor(tensor)?)),
            _ => Err(MaskingError::InvalidRank {
                context: "importance weights",
                expected: "1 or 2",
                actual: tensor.dims().to_vec(),
            }),
        }
    }

    /// Aligns the weights with `tokens`, position by position.
    fn gather(&self, tokens: &TokenGrid) -> Result<Grid<f64>> {
        match self {
            Self::PerToken(table) => {
                let mut data = Vec::with_capacity(tokens.len());
                for &token_id in tokens.iter() {
                    let weight = usize::try_from(token_id)
                        .ok()
                        .and_then(|index| table.get(index))
                        .ok_or(MaskingError::UnalignedWeights {
                            token_id,
                            table_len: table.len(),
                        })?;
                    data.push(f64::from(*weight));
                }
                Grid::new(data, tokens.shape())
            }
            Self::PerPosition(grid) => {
                grid.ensure_shape(tokens.shape(), "importance weights")?;
                Ok(grid.map(|&weight| f64::from(weight)))
            }
        }
    }
}

/// Builds the unfiltered probability matrix for `tokens`.
pub fn build_probability_matrix(
    tokens: &TokenGrid,
    weights: Option<&ImportanceWeights>,
    config: &MaskingConfig,
) -> Result<ProbabilityGrid> {
    let Some(weights) = weights else {
        return Ok(Grid::filled(config.mlm_probability, tokens.shape()));
    };

    let mut standardized = weights.gather(tokens)?;
    let mut flat_rows = 0usize;
    for row in standardized.rows_mut() {
        if !standardize(row) && row.len() > 1 {
            flat_rows += 1;
        }
    }
    if flat_rows > 0 {
        log::warn!(
            "{} of {} weight rows have no spread; those rows use the base masking rate",
            flat_rows,
            tokens.batch()
        );
    }

    let base = f64::from(config.mlm_probability);
    let z = z_score(config.reliability);
    Ok(standardized.map(|&weight| {
        let probability = base * (1.0 + weight / z);
        if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0) as f32
        }
    }))
}

/// Standardizes `values` in place to zero mean and unit (unbiased) variance.
///
/// Returns `false` and zeroes the slice when the spread is undefined: fewer
/// than two values, a zero deviation, or non-finite inputs.
pub fn standardize(values: &mut [f64]) -> bool {
    let n = values.len();
    if n < 2 {
        values.fill(0.0);
        return false;
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = variance.sqrt();
    if !std.is_finite() || std == 0.0 {
        values.fill(0.0);
        return false;
    }

    for value in values.iter_mut() {
        *value = (*value - mean) / std;
    }
    true
}

/// Two-sided critical value of the standard normal at `reliability`
/// (`0.05` gives roughly `1.96`).
pub fn z_score(reliability: f64) -> f64 {
    normal_quantile(1.0 - reliability / 2.0)
}

// Acklam's rational approximation of the probit function.
const A: [f64; 6] = [
    -3.969_683_028_665_376e1,
    2.209_460_984_245_205e2,
    -2.759_285_104_469_687e2,
    1.383_577_518_672_690e2,
    -3.066_479_806_614_716e1,
    2.506_628_277_459_239,
];
const B: [f64; 5] = [
    -5.447_609_879_822_406e1,
    1.615_858_368_580_409e2,
    -1.556_989_798_598_866e2,
    6.680_131_188_771_972e1,
    -1.328_068_155_288_572e1,
];
const C: [f64; 6] = [
    -7.784_894_002_430_293e-3,
    -3.223_964_580_411_365e-1,
    -2.400_758_277_161_838,
    -2.549_732_539_343_734,
    4.374_664_141_464_968,
    2.938_163_982_698_783,
];
const D: [f64; 4] = [
    7.784_695_709_041_462e-3,
    3.224_671_290_700_398e-1,
    2.445_134_137_142_996,
    3.754_408_661_907_416,
];
const P_LOW: f64 = 0.024_25;

/// Inverse CDF of the standard normal distribution.
pub fn normal_quantile(p: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        tail_quantile(p)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail_quantile(1.0 - p)
    }
}

fn tail_quantile(p: f64) -> f64 {
    let q = (-2.0 * p.ln()).sqrt();
    (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
        / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
}
