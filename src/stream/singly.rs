//! Singly linked stream nodes
//!
//! A node is a shared handle: cloning it yields another reference to the same
//! node, never a copy. Each node holds its payload and a lazily forced,
//! optionally memoized link to its successor.
//!
//! Nodes that present an existing position under a different link (filter
//! results, slices) share that position's payload cell, so `set_value`
//! through them reaches the source. `map` and `zip_map` compute new values
//! and own their cells.

use super::core::{LinearStream, Stream};
use crate::error::{StreamError, StreamResult};
use crate::lazy::{thunk, Downgrade, LazyLink, Thunk};
use crate::source::Tape;
use crate::stream_configuration::StreamConfig;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Function combining the current values of several streams
type ZipFn<V, U> = Rc<dyn Fn(&[V]) -> StreamResult<U>>;

pub(crate) struct Node<V> {
    value: Rc<RefCell<V>>,
    next: LazyLink<SinglyLinkedStream<V>>,
    does_memoize: bool,
}

// Long memoized chains would otherwise be dropped recursively, one stack
// frame per node.
impl<V> Drop for Node<V> {
    fn drop(&mut self) {
        let mut cached = self.next.take_cached();
        while let Some(stream) = cached {
            match Rc::try_unwrap(stream.node) {
                Ok(mut node) => cached = node.next.take_cached(),
                Err(_) => break,
            }
        }
    }
}

/// Lazy singly linked stream node.
///
/// ```
/// use lazy_stream::{LinearStream, SinglyLinkedStream, StreamResult};
///
/// fn naturals(n: u64) -> SinglyLinkedStream<u64> {
///     SinglyLinkedStream::new(n, move || Ok(Some(naturals(n + 1))))
/// }
///
/// let evens = naturals(0).filter(|n| n % 2 == 0).unwrap().unwrap();
/// let prefix: StreamResult<Vec<u64>> = evens.iter().take(4).collect();
/// assert_eq!(prefix.unwrap(), vec![0, 2, 4, 6]);
/// ```
pub struct SinglyLinkedStream<V> {
    node: Rc<Node<V>>,
}

impl<V> Clone for SinglyLinkedStream<V> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<V> Downgrade for SinglyLinkedStream<V> {
    type Weak = Weak<Node<V>>;

    fn downgrade(&self) -> Self::Weak {
        Rc::downgrade(&self.node)
    }

    fn upgrade(weak: &Self::Weak) -> Option<Self> {
        weak.upgrade().map(|node| Self { node })
    }
}

impl<V: Clone + 'static> SinglyLinkedStream<V> {
    /// Create a memoizing node
    pub fn new<F>(value: V, next_thunk: F) -> Self
    where
        F: Fn() -> StreamResult<Option<Self>> + 'static,
    {
        Self::with_memoization(value, next_thunk, true)
    }

    pub fn with_config<F>(value: V, next_thunk: F, config: StreamConfig) -> Self
    where
        F: Fn() -> StreamResult<Option<Self>> + 'static,
    {
        Self::with_memoization(value, next_thunk, config.does_memoize)
    }

    pub fn with_memoization<F>(value: V, next_thunk: F, does_memoize: bool) -> Self
    where
        F: Fn() -> StreamResult<Option<Self>> + 'static,
    {
        Self::from_parts(Rc::new(RefCell::new(value)), Rc::new(next_thunk), does_memoize)
    }

    fn from_parts(
        value: Rc<RefCell<V>>,
        next_thunk: Thunk<Option<Self>>,
        does_memoize: bool,
    ) -> Self {
        Self {
            node: Rc::new(Node {
                value,
                next: LazyLink::new("next", next_thunk),
                does_memoize,
            }),
        }
    }

    /// Whether both handles point at the same node
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Whether the successor has been forced and cached
    pub fn is_next_resolved(&self) -> bool {
        self.node.next.is_resolved()
    }

    /// Element-wise combination of `streams`, like zipping them and applying
    /// `f` to each tuple. The result ends where the shortest input ends.
    pub fn zip_map<U, F>(
        f: F,
        streams: &[Self],
        does_memoize: bool,
    ) -> StreamResult<SinglyLinkedStream<U>>
    where
        U: Clone + 'static,
        F: Fn(&[V]) -> U + 'static,
    {
        Self::try_zip_map(move |values| Ok(f(values)), streams, does_memoize)
    }

    /// [`zip_map`](Self::zip_map) with a fallible combining function. An error
    /// surfaces at the point where the failing position is forced.
    pub fn try_zip_map<U, F>(
        f: F,
        streams: &[Self],
        does_memoize: bool,
    ) -> StreamResult<SinglyLinkedStream<U>>
    where
        U: Clone + 'static,
        F: Fn(&[V]) -> StreamResult<U> + 'static,
    {
        if streams.is_empty() {
            return Err(StreamError::NoInputs);
        }

        let value = f(&values_of(streams))?;
        Ok(Self::zip_node(Rc::new(f), streams.to_vec(), value, does_memoize))
    }

    fn zip_node<U>(
        f: ZipFn<V, U>,
        streams: Vec<Self>,
        value: U,
        does_memoize: bool,
    ) -> SinglyLinkedStream<U>
    where
        U: Clone + 'static,
    {
        SinglyLinkedStream::with_memoization(
            value,
            move || {
                let mut nexts = Vec::with_capacity(streams.len());
                for stream in &streams {
                    match stream.next()? {
                        Some(next) => nexts.push(next),
                        None => return Ok(None),
                    }
                }
                let value = f(&values_of(&nexts))?;
                Ok(Some(Self::zip_node(Rc::clone(&f), nexts, value, does_memoize)))
            },
            does_memoize,
        )
    }

    fn filter_with(&self, predicate: Rc<dyn Fn(&V) -> bool>) -> StreamResult<Option<Self>> {
        let mut node = self.clone();
        while !predicate(&node.value()) {
            match node.next()? {
                Some(next) => node = next,
                None => return Ok(None),
            }
        }

        let value = Rc::clone(&node.node.value);
        let does_memoize = node.does_memoize();
        Ok(Some(Self::from_parts(
            value,
            thunk(move || match node.next()? {
                Some(next) => next.filter_with(Rc::clone(&predicate)),
                None => Ok(None),
            }),
            does_memoize,
        )))
    }

    fn from_tape(tape: &Tape<V>, does_memoize: bool) -> Option<Self> {
        let (value, rest) = tape.advance()?;
        Some(Self::with_memoization(
            value,
            move || Ok(Self::from_tape(&rest, does_memoize)),
            does_memoize,
        ))
    }
}

fn values_of<V: Clone + 'static>(streams: &[SinglyLinkedStream<V>]) -> Vec<V> {
    streams.iter().map(Stream::value).collect()
}

impl<V: Clone + 'static> Stream for SinglyLinkedStream<V> {
    type Value = V;
    type Mapped<U: Clone + 'static> = SinglyLinkedStream<U>;

    fn value(&self) -> V {
        self.node.value.borrow().clone()
    }

    fn set_value(&self, value: V) {
        *self.node.value.borrow_mut() = value;
    }

    fn contains(&self, value: &V) -> StreamResult<bool>
    where
        Self::Value: PartialEq,
    {
        for candidate in self.iter() {
            if candidate? == *value {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn map<U, F>(&self, f: F) -> SinglyLinkedStream<U>
    where
        U: Clone + 'static,
        F: Fn(&V) -> U + 'static,
    {
        let value = f(&self.value());
        let f: ZipFn<V, U> = Rc::new(move |values: &[V]| -> StreamResult<U> { Ok(f(&values[0])) });
        Self::zip_node(f, vec![self.clone()], value, self.does_memoize())
    }
}

impl<V: Clone + 'static> LinearStream for SinglyLinkedStream<V> {
    fn does_memoize(&self) -> bool {
        self.node.does_memoize
    }

    fn next(&self) -> StreamResult<Option<Self>> {
        self.node.next.force(self.node.does_memoize)
    }

    fn filter<P>(&self, predicate: P) -> StreamResult<Option<Self>>
    where
        P: Fn(&V) -> bool + 'static,
    {
        self.filter_with(Rc::new(predicate))
    }

    fn from_iterator<I>(iter: I, does_memoize: bool) -> Option<Self>
    where
        I: Iterator<Item = V> + 'static,
    {
        Self::from_tape(&Tape::new(iter), does_memoize)
    }

    fn starter(&self, n: usize) -> StreamResult<Self> {
        let mut node = self.clone();
        for _ in 0..n {
            node = node.next()?.ok_or(StreamError::IndexOutOfRange { index: n })?;
        }
        Ok(node)
    }

    fn stepper(&self, n: usize) -> Self {
        let source = self.clone();
        Self::from_parts(
            Rc::clone(&self.node.value),
            thunk(move || match source.starter(n) {
                Ok(node) => Ok(Some(node.stepper(n))),
                Err(StreamError::IndexOutOfRange { .. }) => Ok(None),
                Err(e) => Err(e),
            }),
            self.does_memoize(),
        )
    }

    fn stopper(&self, n: usize) -> Option<Self> {
        if n == 0 {
            return None;
        }

        let source = self.clone();
        Some(Self::from_parts(
            Rc::clone(&self.node.value),
            thunk(move || {
                if n == 1 {
                    return Ok(None);
                }
                Ok(source.next()?.and_then(|next| next.stopper(n - 1)))
            }),
            self.does_memoize(),
        ))
    }
}

impl<V: fmt::Debug> fmt::Debug for SinglyLinkedStream<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinglyLinkedStream")
            .field("value", &*self.node.value.borrow())
            .field("next_thunk", &self.node.next.thunk_ptr())
            .field("does_memoize", &self.node.does_memoize)
            .finish()
    }
}
