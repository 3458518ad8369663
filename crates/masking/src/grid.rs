//! Dense `[batch, seq_len]` buffers shared by every stage of the engine.
//!
//! Token ids, continuation masks, probabilities, targets and labels all use
//! the same row-major layout. Conversion to and from Candle tensors happens
//! only at the public boundary; sampling runs on these plain buffers.

use candle_core::{DType, Device, Tensor};

use crate::errors::{MaskingError, Result};

/// Row-major matrix with one row per sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    data: Vec<T>,
    batch: usize,
    seq_len: usize,
}

/// Token ids, labels, and corrupted inputs.
pub type TokenGrid = Grid<i64>;
/// Continuation masks and target masks.
pub type BoolGrid = Grid<bool>;
/// Per-token masking probabilities.
pub type ProbabilityGrid = Grid<f32>;

impl<T> Grid<T> {
    pub fn new(data: Vec<T>, (batch, seq_len): (usize, usize)) -> Result<Self> {
        if data.len() != batch * seq_len {
            return Err(MaskingError::ShapeMismatch {
                context: "grid buffer",
                expected: vec![batch * seq_len],
                actual: vec![data.len()],
            });
        }
        Ok(Self {
            data,
            batch,
            seq_len,
        })
    }

    /// Builds a grid from equally long rows.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let batch = rows.len();
        let seq_len = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(batch * seq_len);
        for row in rows {
            if row.len() != seq_len {
                return Err(MaskingError::ShapeMismatch {
                    context: "grid rows",
                    expected: vec![seq_len],
                    actual: vec![row.len()],
                });
            }
            data.extend(row);
        }
        Self::new(data, (batch, seq_len))
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.batch, self.seq_len)
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn row(&self, index: usize) -> &[T] {
        &self.data[index * self.seq_len..(index + 1) * self.seq_len]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.batch).map(move |index| self.row(index))
    }

    pub fn rows_mut(&mut self) -> std::slice::ChunksMut<'_, T> {
        let width = self.seq_len.max(1);
        self.data.chunks_mut(width)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.batch && col < self.seq_len {
            self.data.get(row * self.seq_len + col)
        } else {
            None
        }
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            data: self.data.iter().map(f).collect(),
            batch: self.batch,
            seq_len: self.seq_len,
        }
    }

    /// Fails with a shape mismatch unless the grid is `expected`.
    pub fn ensure_shape(&self, expected: (usize, usize), context: &'static str) -> Result<()> {
        if self.shape() == expected {
            Ok(())
        } else {
            Err(MaskingError::ShapeMismatch {
                context,
                expected: vec![expected.0, expected.1],
                actual: vec![self.batch, self.seq_len],
            })
        }
    }
}

impl<T: Clone> Grid<T> {
    pub fn filled(value: T, (batch, seq_len): (usize, usize)) -> Self {
        Self {
            data: vec![value; batch * seq_len],
            batch,
            seq_len,
        }
    }
}

impl TokenGrid {
    /// Reads a `[batch, seq_len]` integer tensor.
    pub fn from_tensor(tensor: &Tensor) -> Result<Self> {
        let shape = dims2(tensor, "token ids")?;
        if !tensor.dtype().is_int() {
            return Err(MaskingError::UnsupportedDType {
                context: "token ids",
                dtype: tensor.dtype(),
            });
        }
        let data = tensor.to_dtype(DType::I64)?.flatten_all()?.to_vec1::<i64>()?;
        Self::new(data, shape)
    }

    pub fn to_tensor(&self, device: &Device) -> Result<Tensor> {
        Ok(Tensor::from_vec(self.data.clone(), self.shape(), device)?)
    }

    /// Every id must be addressable as a `u32` vocabulary index.
    pub fn ensure_token_ids(&self) -> Result<()> {
        match self.data.iter().find(|&&id| u32::try_from(id).is_err()) {
            Some(&token_id) => Err(MaskingError::InvalidTokenId { token_id }),
            None => Ok(()),
        }
    }
}

impl BoolGrid {
    /// Reads a `[batch, seq_len]` tensor of any dtype; non-zero means `true`.
    pub fn from_tensor(tensor: &Tensor) -> Result<Self> {
        let shape = dims2(tensor, "boolean mask")?;
        let data = tensor
            .to_dtype(DType::F32)?
            .flatten_all()?
            .to_vec1::<f32>()?
            .into_iter()
            .map(|value| value != 0.0)
            .collect();
        Self::new(data, shape)
    }

    pub fn to_tensor(&self, device: &Device) -> Result<Tensor> {
        let data: Vec<u8> = self.data.iter().map(|&flag| u8::from(flag)).collect();
        Ok(Tensor::from_vec(data, self.shape(), device)?)
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&flag| flag).count()
    }
}

impl ProbabilityGrid {
    pub fn from_tensor(tensor: &Tensor) -> Result<Self> {
        let shape = dims2(tensor, "probabilities")?;
        let data = tensor.to_dtype(DType::F32)?.flatten_all()?.to_vec1::<f32>()?;
        Self::new(data, shape)
    }

    pub fn to_tensor(&self, device: &Device) -> Result<Tensor> {
        Ok(Tensor::from_vec(self.data.clone(), self.shape(), device)?)
    }
}

fn dims2(tensor: &Tensor, context: &'static str) -> Result<(usize, usize)> {
    match tensor.dims() {
        [batch, seq_len] => Ok((*batch, *seq_len)),
        other => Err(MaskingError::InvalidRank {
            context,
            expected: "2",
            actual: other.to_vec(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_rejects_ragged_batches() {
        let err = TokenGrid::from_rows(vec![vec![1, 2, 3], vec![4, 5]]).unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn rows_follow_row_major_layout() {
        let grid = TokenGrid::from_rows(vec![vec![1, 2], vec![3, 4], vec![5, 6]]).unwrap();
        assert_eq!(grid.shape(), (3, 2));
        let rows: Vec<&[i64]> = grid.rows().collect();
        assert_eq!(rows, vec![&[1i64, 2][..], &[3, 4][..], &[5, 6][..]]);
        assert_eq!(grid.get(2, 1), Some(&6));
        assert_eq!(grid.get(3, 0), None);
    }

    #[test]
    fn zero_length_rows_are_allowed() {
        let grid = TokenGrid::new(Vec::new(), (2, 0)).unwrap();
        assert_eq!(grid.rows().count(), 2);
        assert!(grid.rows().all(|row| row.is_empty()));
        assert!(grid.is_empty());
    }

    #[test]
    fn ensure_shape_reports_both_shapes() {
        let grid = BoolGrid::filled(false, (2, 3));
        match grid.ensure_shape((3, 2), "word tails") {
            Err(MaskingError::ShapeMismatch {
                context,
                expected,
                actual,
            }) => {
                assert_eq!(context, "word tails");
                assert_eq!(expected, vec![3, 2]);
                assert_eq!(actual, vec![2, 3]);
            }
            other => panic!("expected shape mismatch, got {other:?}"),
        }
    }

    #[test]
    fn negative_ids_are_invalid() {
        let grid = TokenGrid::from_rows(vec![vec![101, -100]]).unwrap();
        assert!(matches!(
            grid.ensure_token_ids(),
            Err(MaskingError::InvalidTokenId { token_id: -100 })
        ));
    }

    #[test]
    fn tensors_round_trip_through_grids() -> Result<()> {
        let device = Device::Cpu;
        let ids = Tensor::from_vec(vec![101u32, 7, 102, 0], (2, 2), &device)?;
        let grid = TokenGrid::from_tensor(&ids)?;
        assert_eq!(grid.as_slice(), &[101, 7, 102, 0]);
        let back = grid.to_tensor(&device)?;
        assert_eq!(back.dtype(), DType::I64);
        assert_eq!(back.to_vec2::<i64>()?, vec![vec![101, 7], vec![102, 0]]);

        let mask = Tensor::from_vec(vec![0u8, 1, 1, 0], (2, 2), &device)?;
        let flags = BoolGrid::from_tensor(&mask)?;
        assert_eq!(flags.as_slice(), &[false, true, true, false]);
        assert_eq!(flags.count(), 2);
        assert_eq!(flags.to_tensor(&device)?.to_vec2::<u8>()?, vec![vec![0, 1], vec![1, 0]]);
        Ok(())
    }

    #[test]
    fn float_token_tensors_are_rejected() -> Result<()> {
        let ids = Tensor::zeros((1, 3), DType::F32, &Device::Cpu)?;
        assert!(matches!(
            TokenGrid::from_tensor(&ids),
            Err(MaskingError::UnsupportedDType { .. })
        ));
        Ok(())
    }

    #[test]
    fn rank_one_tensors_are_rejected() -> Result<()> {
        let ids = Tensor::from_vec(vec![1i64, 2, 3], 3, &Device::Cpu)?;
        match TokenGrid::from_tensor(&ids) {
            Err(MaskingError::InvalidRank { actual, .. }) => assert_eq!(actual, vec![3]),
            other => panic!("expected rank error, got {other:?}"),
        }
        Ok(())
    }
}
