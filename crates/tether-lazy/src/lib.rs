//! tether-lazy: Fixed-length lazy sequences over externally fetched collections.
//!
//! A [`LazySeq`] knows its length up front and fetches each element through an
//! [`IndexAccessor`] only when asked. Nothing is cached: every index, slice or
//! iteration goes back to the accessor, so callers always see current
//! foreign-side state.
//!
//! Indexing follows array-slicing rules:
//!
//! - negative indices count from the end,
//! - a single index outside the sequence is `None`,
//! - a slice starting exactly at the end is empty, one starting past it is `None`.

mod accessor;
mod seq;

pub use accessor::{IndexAccessor, Vacant};
pub use seq::{Iter, LazySeq};
