//! Doubly linked stream nodes
//!
//! Same model as the singly linked node, plus a symmetric lazy link to the
//! predecessor. Nodes synthesized by the combinators here are wired so that,
//! when memoizing, stepping forward then back lands on the identical node.
//!
//! Only forced links hold their neighbor strongly. The link pointing back is
//! primed with a weak reference, so a chain never keeps itself alive; once
//! the node it pointed at is gone the link recomputes it.
//!
//! As with singly linked nodes, filter results, slices and reversed views
//! share the payload cell of the position they present.

use super::core::{LinearStream, Stream, Values};
use crate::error::{StreamError, StreamResult};
use crate::lazy::{thunk, thunk_init, Downgrade, LazyLink, Thunk};
use crate::source::Tape;
use crate::stream_configuration::StreamConfig;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type ZipFn<V, U> = Rc<dyn Fn(&[V]) -> StreamResult<U>>;
type Predicate<V> = Rc<dyn Fn(&V) -> bool>;

/// Which link to follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalDirection {
    Next,
    Previous,
}

impl TraversalDirection {
    pub fn reversed(self) -> Self {
        match self {
            TraversalDirection::Next => TraversalDirection::Previous,
            TraversalDirection::Previous => TraversalDirection::Next,
        }
    }
}

pub(crate) struct Node<V> {
    // Shared with reversed and windowed views of the same position
    value: Rc<RefCell<V>>,
    next: LazyLink<DoublyLinkedStream<V>>,
    previous: LazyLink<DoublyLinkedStream<V>>,
    does_memoize: bool,
}

impl<V> Drop for Node<V> {
    fn drop(&mut self) {
        let mut pending: Vec<DoublyLinkedStream<V>> = Vec::new();
        pending.extend(self.next.take_cached());
        pending.extend(self.previous.take_cached());
        while let Some(stream) = pending.pop() {
            if let Ok(mut node) = Rc::try_unwrap(stream.node) {
                pending.extend(node.next.take_cached());
                pending.extend(node.previous.take_cached());
            }
        }
    }
}

/// Lazy doubly linked stream node
pub struct DoublyLinkedStream<V> {
    node: Rc<Node<V>>,
}

impl<V> Downgrade for DoublyLinkedStream<V> {
    type Weak = Weak<Node<V>>;

    fn downgrade(&self) -> Self::Weak {
        Rc::downgrade(&self.node)
    }

    fn upgrade(weak: &Self::Weak) -> Option<Self> {
        weak.upgrade().map(|node| Self { node })
    }
}

/// Way back from a node built by `from_iterator` to its predecessor: the
/// predecessor itself while it is alive, otherwise enough to rebuild it.
struct Backlink<V> {
    node: Weak<Node<V>>,
    tape: Rc<Tape<V>>,
    previous: Option<Rc<Backlink<V>>>,
}

impl<V: Clone + 'static> Backlink<V> {
    fn resolve(&self, does_memoize: bool) -> Option<DoublyLinkedStream<V>> {
        match DoublyLinkedStream::upgrade(&self.node) {
            Some(node) => Some(node),
            None => {
                log::trace!("Rebuilding dropped predecessor from its source position");
                DoublyLinkedStream::from_tape(&self.tape, self.previous.clone(), does_memoize)
            }
        }
    }
}

impl<V> Drop for Backlink<V> {
    fn drop(&mut self) {
        let mut previous = self.previous.take();
        while let Some(link) = previous {
            match Rc::try_unwrap(link) {
                Ok(mut link) => previous = link.previous.take(),
                Err(_) => break,
            }
        }
    }
}

impl<V> Clone for DoublyLinkedStream<V> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

fn no_neighbor<N>() -> StreamResult<Option<N>> {
    Ok(None)
}

impl<V: Clone + 'static> DoublyLinkedStream<V> {
    /// Create a memoizing node with no predecessor
    pub fn new<F>(value: V, next_thunk: F) -> Self
    where
        F: Fn() -> StreamResult<Option<Self>> + 'static,
    {
        Self::with_memoization(value, next_thunk, no_neighbor::<Self>, true)
    }

    /// Create a memoizing node with both links
    pub fn with_previous<F, P>(value: V, next_thunk: F, previous_thunk: P) -> Self
    where
        F: Fn() -> StreamResult<Option<Self>> + 'static,
        P: Fn() -> StreamResult<Option<Self>> + 'static,
    {
        Self::with_memoization(value, next_thunk, previous_thunk, true)
    }

    pub fn with_config<F, P>(value: V, next_thunk: F, previous_thunk: P, config: StreamConfig) -> Self
    where
        F: Fn() -> StreamResult<Option<Self>> + 'static,
        P: Fn() -> StreamResult<Option<Self>> + 'static,
    {
        Self::with_memoization(value, next_thunk, previous_thunk, config.does_memoize)
    }

    pub fn with_memoization<F, P>(
        value: V,
        next_thunk: F,
        previous_thunk: P,
        does_memoize: bool,
    ) -> Self
    where
        F: Fn() -> StreamResult<Option<Self>> + 'static,
        P: Fn() -> StreamResult<Option<Self>> + 'static,
    {
        Self::from_parts(
            Rc::new(RefCell::new(value)),
            Rc::new(next_thunk),
            Rc::new(previous_thunk),
            does_memoize,
        )
    }

    fn from_parts(
        value: Rc<RefCell<V>>,
        next_thunk: Thunk<Option<Self>>,
        previous_thunk: Thunk<Option<Self>>,
        does_memoize: bool,
    ) -> Self {
        Self {
            node: Rc::new(Node {
                value,
                next: LazyLink::new("next", next_thunk),
                previous: LazyLink::new("previous", previous_thunk),
                does_memoize,
            }),
        }
    }

    /// Build a node whose neighbors, once forced, point straight back at it.
    ///
    /// Without memoization there is no cache to wire, so the thunks are used
    /// as given.
    fn linked(
        value: Rc<RefCell<V>>,
        next_thunk: Thunk<Option<Self>>,
        previous_thunk: Thunk<Option<Self>>,
        does_memoize: bool,
    ) -> Self {
        if !does_memoize {
            return Self::from_parts(value, next_thunk, previous_thunk, false);
        }

        let node = Rc::new_cyclic(|this: &Weak<Node<V>>| Node {
            value,
            next: LazyLink::new(
                "next",
                back_wired(next_thunk, this, TraversalDirection::Next),
            ),
            previous: LazyLink::new(
                "previous",
                back_wired(previous_thunk, this, TraversalDirection::Previous),
            ),
            does_memoize: true,
        });
        Self { node }
    }

    fn link(&self, direction: TraversalDirection) -> &LazyLink<Self> {
        match direction {
            TraversalDirection::Next => &self.node.next,
            TraversalDirection::Previous => &self.node.previous,
        }
    }

    /// Whether both handles point at the same node
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    pub fn is_next_resolved(&self) -> bool {
        self.node.next.is_resolved()
    }

    pub fn is_previous_resolved(&self) -> bool {
        self.node.previous.is_resolved()
    }

    /// Force the predecessor link
    pub fn previous(&self) -> StreamResult<Option<Self>> {
        self.node.previous.force(self.node.does_memoize)
    }

    /// Force the link in `direction`
    pub fn neighbor(&self, direction: TraversalDirection) -> StreamResult<Option<Self>> {
        self.link(direction).force(self.node.does_memoize)
    }

    /// The node `n` links away in `direction`
    pub fn walk(&self, n: usize, direction: TraversalDirection) -> StreamResult<Self> {
        let mut node = self.clone();
        for _ in 0..n {
            node = node
                .neighbor(direction)?
                .ok_or(StreamError::IndexOutOfRange { index: n })?;
        }
        Ok(node)
    }

    /// Signed random access: negative offsets walk backwards
    pub fn offset(&self, offset: isize) -> StreamResult<Self> {
        if offset < 0 {
            self.walk(offset.unsigned_abs(), TraversalDirection::Previous)
        } else {
            self.walk(offset.unsigned_abs(), TraversalDirection::Next)
        }
    }

    /// Iterator over the values from this node back to the head
    pub fn iter_back(&self) -> Values<Self> {
        Values::with_step(self.clone(), Self::previous)
    }

    /// Nearest node in `direction` (this one included) whose value satisfies
    /// `predicate`. The result is filtered in both directions.
    pub fn filter_toward<P>(
        &self,
        predicate: P,
        direction: TraversalDirection,
    ) -> StreamResult<Option<Self>>
    where
        P: Fn(&V) -> bool + 'static,
    {
        self.filter_with(Rc::new(predicate), direction)
    }

    fn filter_with(
        &self,
        predicate: Predicate<V>,
        direction: TraversalDirection,
    ) -> StreamResult<Option<Self>> {
        let mut node = self.clone();
        while !predicate(&node.value()) {
            match node.neighbor(direction)? {
                Some(neighbor) => node = neighbor,
                None => return Ok(None),
            }
        }

        let does_memoize = node.does_memoize();
        let value = Rc::clone(&node.node.value);
        let next = Self::filter_step(node.clone(), Rc::clone(&predicate), TraversalDirection::Next);
        let previous = Self::filter_step(node, predicate, TraversalDirection::Previous);
        Ok(Some(Self::linked(value, next, previous, does_memoize)))
    }

    /// Filtered search resuming at `node`'s neighbor in `direction`
    fn filter_step(
        node: Self,
        predicate: Predicate<V>,
        direction: TraversalDirection,
    ) -> Thunk<Option<Self>> {
        thunk(move || match node.neighbor(direction)? {
            Some(neighbor) => neighbor.filter_with(Rc::clone(&predicate), direction),
            None => Ok(None),
        })
    }

    /// View of the same position with `next` and `previous` swapped.
    ///
    /// The payload cell is shared, so `set_value` through the view is visible
    /// on this node.
    pub fn reversed(&self) -> Self {
        let backward = self.clone();
        let forward = self.clone();
        Self::linked(
            Rc::clone(&self.node.value),
            thunk(move || Ok(backward.previous()?.map(|node| node.reversed()))),
            thunk(move || Ok(forward.next()?.map(|node| node.reversed()))),
            self.does_memoize(),
        )
    }

    /// Element-wise combination of `streams` in both directions. The result
    /// ends, either way, where the shortest input ends.
    pub fn zip_map<U, F>(
        f: F,
        streams: &[Self],
        does_memoize: bool,
    ) -> StreamResult<DoublyLinkedStream<U>>
    where
        U: Clone + 'static,
        F: Fn(&[V]) -> U + 'static,
    {
        Self::try_zip_map(move |values| Ok(f(values)), streams, does_memoize)
    }

    pub fn try_zip_map<U, F>(
        f: F,
        streams: &[Self],
        does_memoize: bool,
    ) -> StreamResult<DoublyLinkedStream<U>>
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
    ) -> DoublyLinkedStream<U>
    where
        U: Clone + 'static,
    {
        let next = Self::zip_step(Rc::clone(&f), streams.clone(), TraversalDirection::Next, does_memoize);
        let previous = Self::zip_step(f, streams, TraversalDirection::Previous, does_memoize);
        DoublyLinkedStream::linked(Rc::new(RefCell::new(value)), next, previous, does_memoize)
    }

    fn zip_step<U>(
        f: ZipFn<V, U>,
        streams: Vec<Self>,
        direction: TraversalDirection,
        does_memoize: bool,
    ) -> Thunk<Option<DoublyLinkedStream<U>>>
    where
        U: Clone + 'static,
    {
        thunk(move || {
            let mut neighbors = Vec::with_capacity(streams.len());
            for stream in &streams {
                match stream.neighbor(direction)? {
                    Some(neighbor) => neighbors.push(neighbor),
                    None => return Ok(None),
                }
            }
            let value = f(&values_of(&neighbors))?;
            Ok(Some(Self::zip_node(Rc::clone(&f), neighbors, value, does_memoize)))
        })
    }

    fn from_tape(
        tape: &Rc<Tape<V>>,
        back: Option<Rc<Backlink<V>>>,
        does_memoize: bool,
    ) -> Option<Self> {
        let (value, rest) = tape.advance()?;
        let tape = Rc::clone(tape);
        let node = Rc::new_cyclic(|this: &Weak<Node<V>>| {
            let link = Rc::new(Backlink {
                node: this.clone(),
                tape,
                previous: back.clone(),
            });
            let mut next = thunk(move || {
                Ok(Self::from_tape(&rest, Some(Rc::clone(&link)), does_memoize))
            });
            let mut previous = thunk(move || {
                Ok(back.as_ref().and_then(|back| back.resolve(does_memoize)))
            });
            if does_memoize {
                next = back_wired(next, this, TraversalDirection::Next);
                previous = back_wired(previous, this, TraversalDirection::Previous);
            }
            Node {
                value: Rc::new(RefCell::new(value)),
                next: LazyLink::new("next", next),
                previous: LazyLink::new("previous", previous),
                does_memoize,
            }
        });
        Some(Self { node })
    }
}

/// Wrap the `direction` thunk of the node behind `origin` so that the first
/// neighbor it produces gets a weak link back to that node.
fn back_wired<V: Clone + 'static>(
    inner: Thunk<Option<DoublyLinkedStream<V>>>,
    origin: &Weak<Node<V>>,
    direction: TraversalDirection,
) -> Thunk<Option<DoublyLinkedStream<V>>> {
    let origin = origin.clone();
    thunk_init(
        move || inner(),
        move |neighbor: &Option<DoublyLinkedStream<V>>| {
            if let Some(neighbor) = neighbor {
                neighbor.link(direction.reversed()).prime(origin);
            }
        },
    )
}

fn values_of<V: Clone + 'static>(streams: &[DoublyLinkedStream<V>]) -> Vec<V> {
    streams.iter().map(Stream::value).collect()
}

impl<V: Clone + 'static> Stream for DoublyLinkedStream<V> {
    type Value = V;
    type Mapped<U: Clone + 'static> = DoublyLinkedStream<U>;

    fn value(&self) -> V {
        self.node.value.borrow().clone()
    }

    fn set_value(&self, value: V) {
        *self.node.value.borrow_mut() = value;
    }

    /// Searches forward from this node, then backward from its predecessor.
    fn contains(&self, value: &V) -> StreamResult<bool>
    where
        Self::Value: PartialEq,
    {
        for candidate in self.iter() {
            if candidate? == *value {
                return Ok(true);
            }
        }

        if let Some(previous) = self.previous()? {
            for candidate in previous.iter_back() {
                if candidate? == *value {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    fn map<U, F>(&self, f: F) -> DoublyLinkedStream<U>
    where
        U: Clone + 'static,
        F: Fn(&V) -> U + 'static,
    {
        let value = f(&self.value());
        let f: ZipFn<V, U> =
            Rc::new(move |values: &[V]| -> StreamResult<U> { Ok(f(&values[0])) });
        Self::zip_node(f, vec![self.clone()], value, self.does_memoize())
    }
}

impl<V: Clone + 'static> LinearStream for DoublyLinkedStream<V> {
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
        self.filter_toward(predicate, TraversalDirection::Next)
    }

    fn from_iterator<I>(iter: I, does_memoize: bool) -> Option<Self>
    where
        I: Iterator<Item = V> + 'static,
    {
        Self::from_tape(&Tape::new(iter), None, does_memoize)
    }

    fn starter(&self, n: usize) -> StreamResult<Self> {
        self.walk(n, TraversalDirection::Next)
    }

    fn stepper(&self, n: usize) -> Self {
        let forward = self.clone();
        let backward = self.clone();
        Self::linked(
            Rc::clone(&self.node.value),
            thunk(move || stride(&forward, n, TraversalDirection::Next)),
            thunk(move || stride(&backward, n, TraversalDirection::Previous)),
            self.does_memoize(),
        )
    }

    /// The window keeps at most `n` nodes ahead; stepping back widens it by
    /// one per step so the far end stays put.
    fn stopper(&self, n: usize) -> Option<Self> {
        if n == 0 {
            return None;
        }

        let forward = self.clone();
        let backward = self.clone();
        Some(Self::linked(
            Rc::clone(&self.node.value),
            thunk(move || {
                if n == 1 {
                    return Ok(None);
                }
                Ok(forward.next()?.and_then(|next| next.stopper(n - 1)))
            }),
            thunk(move || {
                Ok(backward
                    .previous()?
                    .and_then(|previous| previous.stopper(n.saturating_add(1))))
            }),
            self.does_memoize(),
        ))
    }
}

/// Stepper link: the node `n` away in `direction`, itself stepping by `n`
fn stride<V: Clone + 'static>(
    origin: &DoublyLinkedStream<V>,
    n: usize,
    direction: TraversalDirection,
) -> StreamResult<Option<DoublyLinkedStream<V>>> {
    match origin.walk(n, direction) {
        Ok(node) => Ok(Some(node.stepper(n))),
        Err(StreamError::IndexOutOfRange { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

impl<V: fmt::Debug> fmt::Debug for DoublyLinkedStream<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoublyLinkedStream")
            .field("value", &*self.node.value.borrow())
            .field("next_thunk", &self.node.next.thunk_ptr())
            .field("previous_thunk", &self.node.previous.thunk_ptr())
            .field("does_memoize", &self.node.does_memoize)
            .finish()
    }
}
