use std::error::Error;
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// Result with boxed error as trait object.
pub type GenericResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[cfg(test)]
pub(crate) type TestResult = GenericResult<()>;

/// A non-negative edge/path weight that may be infinite ("no connection").
///
/// Addition never wraps: any sum involving infinity is infinity and a finite
/// overflow saturates into infinity as well. Comparing sums of these values
/// is therefore always safe, even when both summands are sentinels.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NaturalOrInfinite(u64);

impl NaturalOrInfinite {
    pub fn infinity() -> Self {
        NaturalOrInfinite(u64::MAX)
    }

    pub fn is_finite(self) -> bool {
        self.0 != u64::MAX
    }

    /// The finite value.
    ///
    /// # Panics
    /// If the value is infinite.
    pub fn finite_value(self) -> u64 {
        assert!(self.is_finite(), "infinite weight has no finite value");
        self.0
    }
}

impl From<u32> for NaturalOrInfinite {
    fn from(value: u32) -> Self {
        NaturalOrInfinite(u64::from(value))
    }
}

impl Add for NaturalOrInfinite {
    type Output = NaturalOrInfinite;

    fn add(self, rhs: Self) -> Self::Output {
        if !self.is_finite() || !rhs.is_finite() {
            NaturalOrInfinite::infinity()
        } else {
            NaturalOrInfinite(self.0.saturating_add(rhs.0))
        }
    }
}

impl Sum for NaturalOrInfinite {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(NaturalOrInfinite::from(0), Add::add)
    }
}

impl fmt::Debug for NaturalOrInfinite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_finite() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "infinity")
        }
    }
}

/// Check whether a slice is sorted in ascending order.
pub fn sorted<T: Ord>(slice: &[T]) -> bool {
    slice.windows(2).all(|w| w[0] <= w[1])
}

/// Insert `element` into the sorted slice `subset`, returning a new sorted
/// vector. Equivalent to push-then-sort but only needs a single merge pass.
pub fn sorted_insert<T: Ord + Clone>(subset: &[T], element: T) -> Vec<T> {
    debug_assert!(sorted(subset));
    let mut result = Vec::with_capacity(subset.len() + 1);
    let pos = subset
        .iter()
        .position(|e| *e > element)
        .unwrap_or(subset.len());
    result.extend_from_slice(&subset[..pos]);
    result.push(element);
    result.extend_from_slice(&subset[pos..]);
    result
}

/// Iterator over all `k`-element combinations of `items`, each yielded as a
/// vector in the original slice order.
pub fn combinations<T: Clone>(items: &[T], k: usize) -> Combinations<'_, T> {
    Combinations {
        items,
        indices: (0..k).collect(),
        started: false,
        done: k > items.len(),
    }
}

pub struct Combinations<'a, T> {
    items: &'a [T],
    indices: Vec<usize>,
    started: bool,
    done: bool,
}

impl<T: Clone> Iterator for Combinations<'_, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.started {
            let k = self.indices.len();
            // find the rightmost index that can still be advanced
            let mut i = k;
            loop {
                if i == 0 {
                    self.done = true;
                    return None;
                }
                i -= 1;
                if self.indices[i] < self.items.len() - k + i {
                    break;
                }
            }
            self.indices[i] += 1;
            for j in i + 1..k {
                self.indices[j] = self.indices[j - 1] + 1;
            }
        } else {
            self.started = true;
        }
        Some(
            self.indices
                .iter()
                .map(|&i| self.items[i].clone())
                .collect(),
        )
    }
}

/// Disjoint-set forest with path halving and union by size.
#[derive(Clone, Debug)]
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub fn new(num_elements: usize) -> Self {
        UnionFind {
            parent: (0..num_elements).collect(),
            size: vec![1; num_elements],
        }
    }

    pub fn find(&mut self, mut element: usize) -> usize {
        while self.parent[element] != element {
            self.parent[element] = self.parent[self.parent[element]];
            element = self.parent[element];
        }
        element
    }

    /// Merge the sets of `a` and `b`; returns `false` if they already shared
    /// a set.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut a, mut b) = (self.find(a), self.find(b));
        if a == b {
            return false;
        }
        if self.size[a] < self.size[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        self.size[a] += self.size[b];
        true
    }
}

/// Iterator over all non-empty proper subsets of `items` (at most 63 items).
pub fn non_trivial_subsets<T: Clone>(items: &[T]) -> impl Iterator<Item = Vec<T>> + '_ {
    assert!(items.len() < 64);
    let full = (1u64 << items.len()) - 1;
    (1..full).map(move |mask| {
        items
            .iter()
            .enumerate()
            .filter(|&(i, _)| mask & (1 << i) != 0)
            .map(|(_, e)| e.clone())
            .collect()
    })
}
