//! Core stream contracts and the shared traversal machinery
//!
//! `Stream` is the capability every node type exposes. `LinearStream` adds
//! ordered traversal on top of it: concrete node types implement the three
//! traversal primitives (`starter`, `stepper`, `stopper`) and get iteration,
//! indexing and slicing for free.

use crate::error::{StreamError, StreamResult};
use crate::stream_configuration::StreamConfig;
use std::iter::FusedIterator;
use std::ops::{Bound, RangeBounds};

/// Capability contract shared by every stream node type
pub trait Stream: Clone + Sized {
    type Value: Clone + 'static;

    /// Node type produced by mapping this stream to values of type `U`
    type Mapped<U: Clone + 'static>: Stream<Value = U>;

    /// Payload of the current node
    fn value(&self) -> Self::Value;

    /// Replace the payload in place. Every handle to this node observes it.
    fn set_value(&self, value: Self::Value);

    /// Walk the stream looking for `value`.
    ///
    /// Does not terminate on an infinite stream that never yields `value`.
    fn contains(&self, value: &Self::Value) -> StreamResult<bool>
    where
        Self::Value: PartialEq;

    /// Lazily apply `f` to every value of the stream.
    ///
    /// The result memoizes exactly when this stream does. Use the node
    /// types' `zip_map` to pick the policy explicitly.
    fn map<U, F>(&self, f: F) -> Self::Mapped<U>
    where
        U: Clone + 'static,
        F: Fn(&Self::Value) -> U + 'static;
}

/// Ordered, multi-pass traversal over a chain of nodes
pub trait LinearStream: Stream {
    fn does_memoize(&self) -> bool;

    /// Force the successor link
    fn next(&self) -> StreamResult<Option<Self>>;

    /// First node (from here on) whose value satisfies `predicate`, wrapped so
    /// that its successors are filtered too. `None` if the chain ends first.
    ///
    /// Does not terminate on an infinite stream with no satisfying value.
    fn filter<P>(&self, predicate: P) -> StreamResult<Option<Self>>
    where
        P: Fn(&Self::Value) -> bool + 'static;

    /// Build a stream that pulls from `iter` one element per forced link.
    /// `None` for an empty iterator.
    fn from_iterator<I>(iter: I, does_memoize: bool) -> Option<Self>
    where
        I: Iterator<Item = Self::Value> + 'static;

    /// The node `n` links ahead of this one
    fn starter(&self, n: usize) -> StreamResult<Self>;

    /// A stream over every `n`-th node starting at this one
    fn stepper(&self, n: usize) -> Self;

    /// A stream truncated to at most `n` nodes; `None` when `n` is zero
    fn stopper(&self, n: usize) -> Option<Self>;

    fn from_iterable<I>(iterable: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self::Value>,
        I::IntoIter: 'static,
    {
        Self::from_iterator(iterable.into_iter(), true)
    }

    fn from_iterable_with_config<I>(iterable: I, config: StreamConfig) -> Option<Self>
    where
        I: IntoIterator<Item = Self::Value>,
        I::IntoIter: 'static,
    {
        Self::from_iterator(iterable.into_iter(), config.does_memoize)
    }

    /// Restartable iterator over the values from this node on
    fn iter(&self) -> Values<Self> {
        Values::new(self.clone())
    }

    /// Value `index` links ahead
    fn get(&self, index: usize) -> StreamResult<Self::Value> {
        Ok(self.starter(index)?.value())
    }

    /// Lazy slice `range` with stride `step`.
    ///
    /// Slices past the end of a finite stream are truncated; an empty range
    /// yields `None`.
    fn slice<R>(&self, range: R, step: usize) -> StreamResult<Option<Self>>
    where
        R: RangeBounds<usize>,
    {
        if step == 0 {
            return Err(StreamError::InvalidStep { step });
        }

        let (start, stop) = resolve_bounds(&range);
        if matches!(stop, Some(stop) if stop <= start) {
            return Ok(None);
        }

        let node = match self.starter(start) {
            Ok(node) => node,
            Err(StreamError::IndexOutOfRange { .. }) => {
                log::debug!("Slice start {} is past the end of the stream", start);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let node = match stop {
            Some(stop) => match node.stopper(stop - start) {
                Some(node) => node,
                None => return Ok(None),
            },
            None => node,
        };

        if step > 1 {
            Ok(Some(node.stepper(step)))
        } else {
            Ok(Some(node))
        }
    }
}

/// `(start, stop)` of a range in element positions
fn resolve_bounds<R: RangeBounds<usize>>(range: &R) -> (usize, Option<usize>) {
    let start = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let stop = match range.end_bound() {
        Bound::Included(&stop) => Some(stop.saturating_add(1)),
        Bound::Excluded(&stop) => Some(stop),
        Bound::Unbounded => None,
    };
    (start, stop)
}

/// Link-following function used by [`Values`]
pub type Step<S> = fn(&S) -> StreamResult<Option<S>>;

/// Iterator over the values of a stream.
///
/// A link is only forced when the value after it is requested, so taking a
/// prefix of a stream never evaluates past that prefix. The iterator ends
/// after yielding the first error.
pub struct Values<S> {
    node: Option<S>,
    started: bool,
    step: Step<S>,
}

impl<S: LinearStream> Values<S> {
    /// Values from `node` on, following `next`
    pub fn new(node: S) -> Self {
        Self::with_step(node, <S as LinearStream>::next)
    }
}

impl<S: Stream> Values<S> {
    /// Values from `node` on, following whichever link `step` forces
    pub fn with_step(node: S, step: Step<S>) -> Self {
        Self {
            node: Some(node),
            started: false,
            step,
        }
    }
}

impl<S: Stream> Iterator for Values<S> {
    type Item = StreamResult<S::Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.started {
            let current = self.node.take()?;
            match (self.step)(&current) {
                Ok(next) => self.node = next,
                Err(e) => return Some(Err(e)),
            }
        }
        self.started = true;
        self.node.as_ref().map(|node| Ok(node.value()))
    }
}

impl<S: Stream> FusedIterator for Values<S> {}
