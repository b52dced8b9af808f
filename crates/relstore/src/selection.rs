use std::ops::Range;

/// Ordered list of row positions.
///
/// Produced by predicate filters (ascending, no duplicates) and consumed by
/// gathers, which may also be handed arbitrary permutations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionVector {
    indices: Vec<usize>,
}

impl SelectionVector {
    pub const fn empty() -> Self {
        SelectionVector {
            indices: Vec::new(),
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        SelectionVector {
            indices: Vec::with_capacity(cap),
        }
    }

    /// Create a selection vector with a linear mapping to a range of rows.
    pub fn with_range(range: Range<usize>) -> Self {
        SelectionVector {
            indices: range.collect(),
        }
    }

    pub fn get(&self, idx: usize) -> Option<usize> {
        self.indices.get(idx).copied()
    }

    pub fn push_location(&mut self, location: usize) {
        self.indices.push(location)
    }

    /// Returns an iterator of locations in logical order.
    pub fn iter_locations(&self) -> impl ExactSizeIterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn num_rows(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    /// Intersect two ascending selections, keeping ascending order.
    pub fn intersect(&self, other: &SelectionVector) -> SelectionVector {
        let mut out = SelectionVector::with_capacity(self.num_rows().min(other.num_rows()));
        let (mut a, mut b) = (0, 0);
        while a < self.indices.len() && b < other.indices.len() {
            let (x, y) = (self.indices[a], other.indices[b]);
            if x == y {
                out.indices.push(x);
                a += 1;
                b += 1;
            } else if x < y {
                a += 1;
            } else {
                b += 1;
            }
        }
        out
    }
}

impl FromIterator<usize> for SelectionVector {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        SelectionVector {
            indices: iter.into_iter().collect(),
        }
    }
}

impl Extend<usize> for SelectionVector {
    fn extend<T: IntoIterator<Item = usize>>(&mut self, iter: T) {
        self.indices.extend(iter)
    }
}
