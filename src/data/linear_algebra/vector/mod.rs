//! # Indexed vectors
//!
//! Hybrid sparse / dense vectors. The dense array holds every value, the index list holds the
//! positions that may be nonzero. Both are kept so that a vector produced by a triangular solve can
//! be consumed sparsely when it has few nonzeros and densely otherwise.
use std::fmt;

use num_traits::Float;

use crate::data::linear_algebra::SparseTuple;

/// Values with magnitude below this are treated as zero when a vector is compressed.
pub const TINY: f64 = 1e-14;
/// Fraction of the dimension above which a solve switches from hyper-sparse to dense sweeps.
pub const DEFAULT_DENSITY_THRESHOLD: f64 = 0.10;

/// Dense array of length `dim` together with a packed list of the nonzero positions.
///
/// Between calls of the public methods, `index` contains every position holding a nonzero in
/// `array` exactly once. A position that `add` cancels to exactly zero keeps a marker below `TINY`
/// and stays listed until the next `tight`.
#[derive(Clone, PartialEq)]
pub struct IndexedVector<F> {
    array: Vec<F>,
    index: Vec<usize>,
    /// Compressed copy written by `pack`.
    pack_index: Vec<usize>,
    pack_value: Vec<F>,
    /// Fraction of `dim` above which callers should prefer dense sweeps.
    density_threshold: f64,
    /// Work done on this vector, in units of entries touched.
    synthetic_tick: f64,
}

impl<F: Float> IndexedVector<F> {
    /// Create a zero vector of dimension `dim`.
    ///
    /// All buffers are allocated at their worst case size, so later operations don't allocate.
    pub fn new(dim: usize) -> Self {
        Self::with_density_threshold(dim, DEFAULT_DENSITY_THRESHOLD)
    }

    /// Create a zero vector using a non default hyper-sparsity switch.
    pub fn with_density_threshold(dim: usize, density_threshold: f64) -> Self {
        debug_assert!(density_threshold > 0_f64 && density_threshold <= 1_f64);

        Self {
            array: vec![F::zero(); dim],
            index: Vec::with_capacity(dim),
            pack_index: Vec::with_capacity(dim),
            pack_value: Vec::with_capacity(dim),
            density_threshold,
            synthetic_tick: 0_f64,
        }
    }

    /// Create a vector from (index, value) tuples.
    ///
    /// Duplicate indices are summed.
    pub fn from_tuples(dim: usize, tuples: impl IntoIterator<Item = SparseTuple<F>>) -> Self {
        let mut vector = Self::new(dim);
        for (i, value) in tuples {
            vector.add(i, value);
        }
        vector
    }

    /// Dimension of the vector.
    pub fn dim(&self) -> usize {
        self.array.len()
    }

    /// Number of positions in the index list.
    pub fn count(&self) -> usize {
        self.index.len()
    }

    /// The dense values.
    pub fn array(&self) -> &[F] {
        &self.array
    }

    /// The (possibly) nonzero positions.
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// Value at position `i`.
    pub fn get(&self, i: usize) -> F {
        self.array[i]
    }

    /// Iterate over the listed positions and their values.
    pub fn iter(&self) -> impl Iterator<Item = SparseTuple<F>> + '_ {
        self.index.iter().map(move |&i| (i, self.array[i]))
    }

    /// Zero all listed positions. Costs `O(count)`.
    pub fn clear(&mut self) {
        if self.is_hyper_sparse(self.index.len()) {
            for &i in &self.index {
                self.array[i] = F::zero();
            }
        } else {
            self.array.iter_mut().for_each(|value| *value = F::zero());
        }
        self.index.clear();
        self.pack_index.clear();
        self.pack_value.clear();
        self.synthetic_tick = 0_f64;
    }

    /// Set a single position, the vector should be cleared before.
    pub fn set_unit(&mut self, i: usize, value: F) {
        debug_assert!(self.index.is_empty());

        self.array[i] = value;
        self.index.push(i);
    }

    /// Add `value` to position `i`, registering it in the index when it was zero.
    pub fn add(&mut self, i: usize, value: F) {
        if value.is_zero() {
            return;
        }
        let before = self.array[i];
        let after = before + value;
        if before.is_zero() {
            self.index.push(i);
        }
        self.array[i] = if after.is_zero() { zero_mark() } else { after };
    }

    /// Compute `self += alpha * other`.
    ///
    /// New nonzero positions are appended to the index, positions that cancel below `TINY` are
    /// dropped from it.
    ///
    /// # Return value
    ///
    /// The new count.
    pub fn saxpy(&mut self, alpha: F, other: &Self) -> usize {
        debug_assert_eq!(self.dim(), other.dim());

        let tiny = tiny::<F>();
        let mut cancelled = false;
        for &i in &other.index {
            let before = self.array[i];
            let after = before + alpha * other.array[i];
            if before.is_zero() {
                if after.abs() >= tiny {
                    self.index.push(i);
                    self.array[i] = after;
                }
            } else if after.abs() < tiny {
                // Still listed, removed below
                self.array[i] = F::zero();
                cancelled = true;
            } else {
                self.array[i] = after;
            }
        }
        if cancelled {
            let array = &self.array;
            self.index.retain(|&i| !array[i].is_zero());
        }
        self.synthetic_tick += other.index.len() as f64;

        self.index.len()
    }

    /// Zero entries with magnitude below `TINY` and remove them from the index.
    pub fn tight(&mut self) {
        let tiny = tiny::<F>();
        let array = &mut self.array;
        self.index.retain(|&i| {
            if array[i].abs() < tiny {
                array[i] = F::zero();
                false
            } else {
                true
            }
        });
    }

    /// Compress into the packed representation, after calling `tight`.
    ///
    /// The packed copy is sorted by index so that it can be consumed deterministically.
    pub fn pack(&mut self) -> (&[usize], &[F]) {
        self.tight();
        self.pack_index.clear();
        self.pack_value.clear();
        self.pack_index.extend_from_slice(&self.index);
        self.pack_index.sort_unstable();
        for &i in &self.pack_index {
            self.pack_value.push(self.array[i]);
        }

        (&self.pack_index, &self.pack_value)
    }

    /// Rebuild the index from a scan over the dense array.
    ///
    /// Used after dense operations that touched many entries.
    pub fn re_index(&mut self) {
        let tiny = tiny::<F>();
        self.index.clear();
        for (i, value) in self.array.iter_mut().enumerate() {
            if value.abs() < tiny {
                *value = F::zero();
            } else {
                self.index.push(i);
            }
        }
        self.synthetic_tick += self.array.len() as f64;
    }

    /// Sum of squared values.
    pub fn norm2(&self) -> F {
        self.index.iter()
            .map(|&i| self.array[i] * self.array[i])
            .fold(F::zero(), |total, value| total + value)
    }

    /// Largest absolute value.
    pub fn max_abs(&self) -> F {
        self.index.iter()
            .map(|&i| self.array[i].abs())
            .fold(F::zero(), F::max)
    }

    /// Multiply all values with `factor`.
    pub fn scale(&mut self, factor: F) {
        for &i in &self.index {
            self.array[i] = self.array[i] * factor;
        }
    }

    /// Copy the contents of another vector of the same dimension.
    pub fn copy_from(&mut self, other: &Self) {
        debug_assert_eq!(self.dim(), other.dim());

        self.clear();
        for &i in &other.index {
            self.array[i] = other.array[i];
        }
        self.index.extend_from_slice(&other.index);
        self.synthetic_tick = other.synthetic_tick;
    }

    /// Whether a sweep touching `count` entries should use the hyper-sparse code path.
    ///
    /// This is the only place where the density threshold is consulted.
    pub fn is_hyper_sparse(&self, count: usize) -> bool {
        (count as f64) <= self.density_threshold * self.array.len() as f64
    }

    /// Work counter.
    pub fn synthetic_tick(&self) -> f64 {
        self.synthetic_tick
    }

    /// Register work done on the vector by a solve.
    pub fn add_ticks(&mut self, ticks: f64) {
        self.synthetic_tick += ticks;
    }

    /// Raw access for the triangular solves.
    ///
    /// Callers are responsible for restoring the index invariant, typically through `re_index` or
    /// by pushing every position they make nonzero.
    pub(crate) fn parts_mut(&mut self) -> (&mut Vec<F>, &mut Vec<usize>) {
        (&mut self.array, &mut self.index)
    }
}

fn tiny<F: Float>() -> F {
    F::from(TINY).unwrap_or_else(F::min_positive_value)
}

/// Nonzero stand-in for an exact cancellation, removed by `tight`.
fn zero_mark<F: Float>() -> F {
    F::min_positive_value()
}

impl<F: Float + fmt::Display> fmt::Debug for IndexedVector<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexedVector({}; ", self.dim())?;
        let mut index = self.index.clone();
        index.sort_unstable();
        for (k, i) in index.into_iter().enumerate() {
            if k > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", i, self.array[i])?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;

    use crate::data::linear_algebra::vector::IndexedVector;

    #[test]
    fn clear_only_touches_listed() {
        let mut v = IndexedVector::<f64>::from_tuples(1000, vec![(3, 1.5), (999, -2_f64)]);
        assert_eq!(v.count(), 2);
        v.clear();
        assert_eq!(v.count(), 0);
        assert!(v.array().iter().all(|&x| x == 0_f64));
    }

    #[test]
    fn saxpy_grows_and_cancels() {
        let mut x = IndexedVector::<f64>::from_tuples(5, vec![(0, 1_f64), (2, 2_f64)]);
        let y = IndexedVector::from_tuples(5, vec![(2, 1_f64), (4, 3_f64)]);

        // 2 - 2 * 1 cancels
        let count = x.saxpy(-2_f64, &y);
        assert_eq!(count, 2);
        assert_eq!(x.get(2), 0_f64);
        assert_abs_diff_eq!(x.get(4), -6_f64);
        let mut index = x.index().to_vec();
        index.sort_unstable();
        assert_eq!(index, vec![0, 4]);
        assert_abs_diff_eq!(x.synthetic_tick(), 2_f64);
    }

    #[test]
    fn saxpy_near_cancellation() {
        let mut x = IndexedVector::<f64>::from_tuples(3, vec![(1, 1_f64 + 1e-16)]);
        let y = IndexedVector::from_tuples(3, vec![(1, 1_f64)]);
        assert_eq!(x.saxpy(-1_f64, &y), 0);
        assert_eq!(x.get(1), 0_f64);
    }

    #[test]
    fn add_cancellation_stays_listed_once() {
        let mut x = IndexedVector::<f64>::new(4);
        x.add(2, 1.5);
        x.add(2, -1.5);
        assert_eq!(x.count(), 1);
        assert!(x.get(2).abs() < 1e-300);
        x.add(2, 3_f64);
        x.add(2, -3_f64);
        x.add(2, 0.5);
        assert_eq!(x.index(), &[2]);
        assert_abs_diff_eq!(x.get(2), 0.5);

        x.add(1, 2_f64);
        x.add(1, -2_f64);
        x.tight();
        assert_eq!(x.index(), &[2]);
        assert_eq!(x.get(1), 0_f64);
    }

    #[test]
    fn tight_and_pack() {
        let mut x = IndexedVector::<f64>::from_tuples(6, vec![(5, 1_f64), (1, 1e-20), (3, -4_f64)]);
        let (index, value) = x.pack();
        assert_eq!(index, &[3, 5]);
        assert_eq!(value, &[-4_f64, 1_f64]);
        assert_eq!(x.get(1), 0_f64);
        assert_eq!(x.count(), 2);
    }

    #[test]
    fn re_index_after_dense_write() {
        let mut x = IndexedVector::<f64>::new(4);
        {
            let (array, _) = x.parts_mut();
            array[0] = 1_f64;
            array[3] = 1e-30;
            array[2] = -1_f64;
        }
        x.re_index();
        assert_eq!(x.index(), &[0, 2]);
        assert_eq!(x.get(3), 0_f64);
    }

    #[test]
    fn norm2() {
        let x = IndexedVector::<f64>::from_tuples(10, vec![(1, 3_f64), (7, 4_f64)]);
        assert_abs_diff_eq!(x.norm2(), 25_f64);
        assert_abs_diff_eq!(x.max_abs(), 4_f64);
    }

    #[test]
    fn single_precision() {
        let mut x = IndexedVector::<f32>::from_tuples(3, vec![(0, 1_f32)]);
        let y = IndexedVector::from_tuples(3, vec![(0, 1_f32), (1, 2_f32)]);
        assert_eq!(x.saxpy(0.5, &y), 2);
        assert_abs_diff_eq!(x.norm2(), 1.5_f32 * 1.5 + 1_f32);
    }

    #[test]
    fn hyper_sparse_switch() {
        let x = IndexedVector::<f64>::with_density_threshold(100, 0.1);
        assert!(x.is_hyper_sparse(10));
        assert!(!x.is_hyper_sparse(11));
    }
}
