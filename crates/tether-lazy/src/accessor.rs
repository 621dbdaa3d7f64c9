//! Element access for lazy sequences.

use std::marker::PhantomData;

/// Fetches one element of an external collection.
///
/// Implemented per use site (track list, search results, ...), or by any
/// `Fn(usize) -> T` closure. Only called with `index < len`. Collections
/// whose elements can be missing use an `Option` item.
pub trait IndexAccessor {
    type Item;

    fn at(&self, index: usize) -> Self::Item;
}

impl<T, F> IndexAccessor for F
where
    F: Fn(usize) -> T,
{
    type Item = T;

    fn at(&self, index: usize) -> T {
        self(index)
    }
}

/// Accessor for sequences that only carry a size. Every element is `None`.
pub struct Vacant<T>(PhantomData<fn() -> T>);

impl<T> Vacant<T> {
    pub fn new() -> Self {
        Vacant(PhantomData)
    }
}

impl<T> Default for Vacant<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IndexAccessor for Vacant<T> {
    type Item = Option<T>;

    fn at(&self, _index: usize) -> Option<T> {
        None
    }
}
