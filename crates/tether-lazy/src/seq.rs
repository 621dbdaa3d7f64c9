//! The lazy sequence and its iterator.

use crate::accessor::{IndexAccessor, Vacant};
use std::fmt;
use std::iter::FusedIterator;
use std::ops::{Bound, RangeBounds};

/// Fixed-length, index-addressable, non-caching view.
pub struct LazySeq<A> {
    len: usize,
    accessor: A,
}

impl<A: IndexAccessor> LazySeq<A> {
    pub fn new(len: usize, accessor: A) -> Self {
        Self { len, accessor }
    }

    /// Number of elements. Never touches the accessor.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    /// Element at `index`, counting from the end when negative.
    ///
    /// Out-of-range indices return `None` without calling the accessor.
    pub fn get(&self, index: isize) -> Option<A::Item> {
        let index = self.normalize(index).filter(|&i| i < self.len)?;
        Some(self.accessor.at(index))
    }

    pub fn first(&self) -> Option<A::Item> {
        self.get(0)
    }

    pub fn last(&self) -> Option<A::Item> {
        self.get(-1)
    }

    /// Up to `len` elements beginning at `start`.
    ///
    /// Starting exactly at the end yields an empty vector, starting beyond
    /// either end yields `None`. A non-positive `len` yields an empty vector.
    pub fn slice(&self, start: isize, len: isize) -> Option<Vec<A::Item>> {
        let start = self.normalize(start)?;
        if start > self.len {
            return None;
        }
        if len <= 0 {
            return Some(Vec::new());
        }

        let end = start.saturating_add(len.unsigned_abs()).min(self.len);
        Some((start..end).map(|i| self.accessor.at(i)).collect())
    }

    /// Elements covered by `range`, with the same boundary rules as
    /// [`slice`](Self::slice).
    ///
    /// `a..=b` means `slice(a, b - a + 1)`. Negative ends count from the
    /// back, and an end before the start gives an empty vector.
    pub fn range<R: RangeBounds<isize>>(&self, range: R) -> Option<Vec<A::Item>> {
        let n = self.signed_len();

        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let last = match range.end_bound() {
            Bound::Included(&e) => self.from_back(e),
            Bound::Excluded(&e) => self.from_back(e).saturating_sub(1),
            Bound::Unbounded => n - 1,
        };

        let first = self.from_back(start);
        if first < 0 {
            return None;
        }
        let len = last.saturating_sub(first).saturating_add(1).max(0);
        self.slice(first, len)
    }

    /// Fetch every element, in order.
    pub fn to_vec(&self) -> Vec<A::Item> {
        self.iter().collect()
    }

    /// Iterate every element in order. Each call starts over and fetches
    /// everything again.
    pub fn iter(&self) -> Iter<'_, A> {
        Iter {
            seq: self,
            front: 0,
            back: self.len,
        }
    }

    fn signed_len(&self) -> isize {
        isize::try_from(self.len).unwrap_or(isize::MAX)
    }

    fn from_back(&self, index: isize) -> isize {
        if index < 0 {
            index.saturating_add(self.signed_len())
        } else {
            index
        }
    }

    fn normalize(&self, index: isize) -> Option<usize> {
        usize::try_from(self.from_back(index)).ok()
    }
}

impl<T> LazySeq<Vacant<T>> {
    /// A sequence that only knows its size; every element is `None`.
    pub fn sized(len: usize) -> Self {
        Self::new(len, Vacant::new())
    }
}

impl<A> fmt::Debug for LazySeq<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySeq")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl<'a, A: IndexAccessor> IntoIterator for &'a LazySeq<A> {
    type Item = A::Item;
    type IntoIter = Iter<'a, A>;

    fn into_iter(self) -> Iter<'a, A> {
        self.iter()
    }
}

/// Iterator over a [`LazySeq`].
pub struct Iter<'a, A> {
    seq: &'a LazySeq<A>,
    front: usize,
    back: usize,
}

impl<A: IndexAccessor> Iterator for Iter<'_, A> {
    type Item = A::Item;

    fn next(&mut self) -> Option<A::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.seq.accessor.at(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<A: IndexAccessor> DoubleEndedIterator for Iter<'_, A> {
    fn next_back(&mut self) -> Option<A::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.seq.accessor.at(self.back))
    }
}

impl<A: IndexAccessor> ExactSizeIterator for Iter<'_, A> {}

impl<A: IndexAccessor> FusedIterator for Iter<'_, A> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    const LETTERS: [char; 5] = ['a', 'b', 'c', 'd', 'e'];

    fn letters(calls: &Cell<usize>) -> LazySeq<impl Fn(usize) -> char + '_> {
        LazySeq::new(LETTERS.len(), move |i: usize| {
            calls.set(calls.get() + 1);
            LETTERS[i]
        })
    }

    #[test]
    fn test_letters_scenario() {
        let calls = Cell::new(0);
        let seq = letters(&calls);

        assert_eq!(seq.slice(1, 2), Some(vec!['b', 'c']));
        assert_eq!(seq.get(-1), Some('e'));
        assert_eq!(seq.get(6), None);
        assert_eq!(seq.slice(5, 1), Some(vec![]));
        assert_eq!(seq.range(6..=10), None);
        assert_eq!(seq.range(5..=10), Some(vec![]));
    }

    #[test]
    fn test_single_index_calls_accessor_every_time() {
        let calls = Cell::new(0);
        let seq = letters(&calls);

        for i in 0..5 {
            assert_eq!(seq.get(i), Some(LETTERS[i as usize]));
        }
        assert_eq!(seq.get(2), Some('c'));
        assert_eq!(seq.get(2), Some('c'));
        assert_eq!(calls.get(), 7);
    }

    #[test]
    fn test_negative_index_matches_from_end() {
        let calls = Cell::new(0);
        let seq = letters(&calls);

        assert_eq!(seq.get(-1), seq.get(4));
        assert_eq!(seq.get(-5), Some('a'));
        assert_eq!(seq.first(), Some('a'));
        assert_eq!(seq.last(), Some('e'));
    }

    #[test]
    fn test_out_of_range_skips_accessor() {
        let calls = Cell::new(0);
        let seq = letters(&calls);

        assert_eq!(seq.get(5), None);
        assert_eq!(seq.get(-6), None);
        assert_eq!(seq.get(isize::MIN), None);
        assert_eq!(seq.slice(6, 1), None);
        assert_eq!(seq.slice(-6, 2), None);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_slice_boundaries() {
        let calls = Cell::new(0);
        let seq = letters(&calls);

        assert_eq!(seq.slice(5, 3), Some(vec![]));
        assert_eq!(seq.slice(3, 10), Some(vec!['d', 'e']));
        assert_eq!(seq.slice(-2, 2), Some(vec!['d', 'e']));
        assert_eq!(seq.slice(1, 0), Some(vec![]));
        assert_eq!(seq.slice(1, -3), Some(vec![]));
        assert_eq!(seq.slice(0, isize::MAX).map(|v| v.len()), Some(5));
        assert_eq!(calls.get(), 2 + 2 + 5);
    }

    #[test]
    fn test_slice_calls_accessor_in_order() {
        let order = RefCell::new(Vec::new());
        let seq = LazySeq::new(10, |i: usize| {
            order.borrow_mut().push(i);
            i * 10
        });

        assert_eq!(seq.slice(4, 3), Some(vec![40, 50, 60]));
        assert_eq!(*order.borrow(), vec![4, 5, 6]);
    }

    #[test]
    fn test_range_reduces_to_slice() {
        let calls = Cell::new(0);
        let seq = letters(&calls);

        assert_eq!(seq.range(1..=3), seq.slice(1, 3));
        assert_eq!(seq.range(1..3), Some(vec!['b', 'c']));
        assert_eq!(seq.range(3..=100), Some(vec!['d', 'e']));
        assert_eq!(seq.range(1..=-1), Some(vec!['b', 'c', 'd', 'e']));
        assert_eq!(seq.range(-2..), Some(vec!['d', 'e']));
        assert_eq!(seq.range(..2), Some(vec!['a', 'b']));
        assert_eq!(seq.range(..), Some(LETTERS.to_vec()));
        assert_eq!(seq.range(3..=1), Some(vec![]));
        assert_eq!(seq.range(-6..=2), None);
    }

    #[test]
    fn test_size_never_calls_accessor() {
        let calls = Cell::new(0);
        let seq = letters(&calls);

        assert_eq!(seq.len(), 5);
        assert!(!seq.is_empty());
        assert_eq!(seq.iter().len(), 5);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let calls = Cell::new(0);
        let seq = letters(&calls);

        let first: String = seq.iter().collect();
        let second: String = (&seq).into_iter().collect();
        assert_eq!(first, "abcde");
        assert_eq!(second, "abcde");
        assert_eq!(calls.get(), 10);

        let reversed: String = seq.iter().rev().collect();
        assert_eq!(reversed, "edcba");
    }

    #[test]
    fn test_sized_sequence() {
        let seq = LazySeq::<Vacant<String>>::sized(3);

        assert_eq!(seq.len(), 3);
        assert_eq!(seq.get(0), Some(None));
        assert_eq!(seq.get(3), None);
        assert_eq!(seq.slice(3, 1), Some(vec![]));
        assert_eq!(seq.to_vec(), vec![None, None, None]);
    }

    #[test]
    fn test_empty_sequence() {
        let seq = LazySeq::new(0, |i: usize| i);

        assert!(seq.is_empty());
        assert_eq!(seq.get(0), None);
        assert_eq!(seq.get(-1), None);
        assert_eq!(seq.slice(0, 5), Some(vec![]));
        assert_eq!(seq.slice(1, 5), None);
        assert_eq!(seq.range(..), Some(vec![]));
        assert_eq!(seq.iter().next(), None);
    }
}
