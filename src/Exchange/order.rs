// Consumer visit order over the fragment index space.

use crate::error::{FragmentError, Result};

/// A permutation of `0..len`, fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitOrder(Vec<usize>);

impl VisitOrder {
    /// `0, 1, .., len - 1`.
    pub fn sequential(len: usize) -> Self {
        Self((0..len).collect())
    }

    /// Random permutation. A fixed `seed` gives the same order on every run.
    pub fn shuffled(len: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let mut order: Vec<usize> = (0..len).collect();
        rng.shuffle(&mut order);
        Self(order)
    }

    /// Use a caller-supplied order. It must contain every index of `0..len` exactly once.
    pub fn from_indices(indices: Vec<usize>) -> Result<Self> {
        let mut seen = vec![false; indices.len()];
        for &index in &indices {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => {
                    return Err(FragmentError::InvalidConfig(format!(
                        "visit order repeats index {index}"
                    )))
                }
                None => {
                    return Err(FragmentError::InvalidConfig(format!(
                        "visit order index {index} outside 0..{}",
                        indices.len()
                    )))
                }
            }
        }
        Ok(Self(indices))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}
