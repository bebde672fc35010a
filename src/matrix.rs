use crate::utils::ZeroOut;

use rand::distributions::Distribution;
use rand::Rng;
use std::ops::{Index, IndexMut};

/// A dense matrix of `f64`.
#[derive(Clone, Debug, PartialEq)]
pub struct Mat {
    rows: usize,
    cols: usize,
    data: Vec<f64>, // row-major array
}

impl Mat {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Mat {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Fills a `rows x cols` matrix with independent samples drawn from
    /// `distribution`, in row order.
    pub fn random<D, R>(distribution: D, rows: usize, cols: usize, rng: &mut R) -> Self
    where
        D: Distribution<f64>,
        R: Rng + ?Sized,
    {
        let data = (0..rows * cols).map(|_| distribution.sample(rng)).collect();
        Mat { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The weights into unit `r`, one per column.
    pub fn row(&self, r: usize) -> &[f64] {
        let start = r * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [f64] {
        let start = r * self.cols;
        &mut self.data[start..start + self.cols]
    }

    /// Iterates over the rows in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // `chunks` panics on a zero chunk size, so handle empty rows apart.
        let cols = self.cols.max(1);
        let take = if self.cols == 0 { 0 } else { self.rows };
        self.data.chunks(cols).take(take)
    }
}

impl Index<(usize, usize)> for Mat {
    type Output = f64;

    fn index(&self, (r, c): (usize, usize)) -> &f64 {
        debug_assert!(r < self.rows && c < self.cols);
        &self.data[r * self.cols + c]
    }
}

impl IndexMut<(usize, usize)> for Mat {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut f64 {
        debug_assert!(r < self.rows && c < self.cols);
        &mut self.data[r * self.cols + c]
    }
}

impl ZeroOut for Mat {
    fn zero_out(&mut self) {
        self.data.zero_out();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::distributions::Uniform;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn row_major_indexing() {
        let mut m = Mat::zeros(2, 3);
        m[(1, 2)] = 5.0;
        m.row_mut(0)[1] = 2.0;
        assert_eq!(m.row(0), &[0.0, 2.0, 0.0]);
        assert_eq!(m.row(1), &[0.0, 0.0, 5.0]);
        assert_eq!(m.iter_rows().count(), 2);
    }

    #[test]
    fn random_is_seeded_and_in_range() {
        let dist = Uniform::new(-1.0, 1.0);
        let a = Mat::random(&dist, 4, 5, &mut StdRng::seed_from_u64(7));
        let b = Mat::random(&dist, 4, 5, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(a.iter_rows().flatten().all(|&w| (-1.0..1.0).contains(&w)));
    }

    #[test]
    fn empty_columns_have_no_rows_to_iterate() {
        let m = Mat::zeros(3, 0);
        assert_eq!(m.rows(), 3);
        assert_eq!(m.iter_rows().count(), 0);
    }

    #[test]
    fn zero_out_clears_every_entry() {
        let dist = Uniform::new(-1.0, 1.0);
        let mut m = Mat::random(dist, 2, 2, &mut StdRng::seed_from_u64(1));
        m.zero_out();
        assert_eq!(m, Mat::zeros(2, 2));
    }
}
