//! Deferred computation primitives
//!
//! This module provides the building blocks the stream nodes are made of:
//! fallible zero-argument thunks, the `thunk_init` wrapper that lets a thunk
//! finish wiring a structure that was still under construction when the thunk
//! was created, a single-assignment `Slot` for self-referential streams, and
//! the per-direction memo cell `LazyLink`.

use crate::error::{StreamError, StreamResult};
use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

/// A zero-argument suspended computation
pub type Thunk<T> = Rc<dyn Fn() -> StreamResult<T>>;

/// Box a closure as a [`Thunk`]
pub fn thunk<T, F>(f: F) -> Thunk<T>
where
    F: Fn() -> StreamResult<T> + 'static,
{
    Rc::new(f)
}

/// Wraps `thunk` so that its first successful result is handed to `init`
/// before being returned.
///
/// Later invocations skip `init` entirely. A failed invocation does not
/// consume the initializer.
pub fn thunk_init<T, F, I>(thunk: F, init: I) -> Thunk<T>
where
    T: 'static,
    F: Fn() -> StreamResult<T> + 'static,
    I: FnOnce(&T) + 'static,
{
    let init = Cell::new(Some(init));
    Rc::new(move || {
        let obj = thunk()?;
        if let Some(init) = init.take() {
            init(&obj);
        }
        Ok(obj)
    })
}

/// Owned single-assignment cell shared between a thunk and its builder.
///
/// A thunk that needs to reach the value it is about to become part of closes
/// over a `Slot` and reads it when forced; the builder binds the slot once the
/// value exists.
pub struct Slot<T> {
    cell: Rc<OnceCell<T>>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            cell: Rc::new(OnceCell::new()),
        }
    }
}

impl<T: Clone> Slot<T> {
    /// Create an unbound slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the slot. A slot can only be bound once; the rejected value is
    /// handed back.
    pub fn bind(&self, value: T) -> Result<(), T> {
        self.cell.set(value).map_err(|value| {
            log::debug!("Rejected second binding of an already bound slot");
            value
        })
    }

    /// Read the bound value
    pub fn get(&self) -> StreamResult<T> {
        self.cell.get().cloned().ok_or(StreamError::UnboundCell)
    }

    pub fn is_bound(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Two-phase construction: hand a fresh slot to `build`, then bind the
    /// slot to whatever `build` returned.
    ///
    /// If `build` already bound the slot itself, that binding stands and is
    /// what gets returned, so the result always matches what the slot holds.
    ///
    /// ```
    /// use lazy_stream::{LinearStream, SinglyLinkedStream, Slot};
    ///
    /// let ones = Slot::tie(|ones| SinglyLinkedStream::new(1, move || ones.get().map(Some)));
    /// let prefix: Vec<i32> = ones.iter().take(3).collect::<Result<_, _>>().unwrap();
    /// assert_eq!(prefix, vec![1, 1, 1]);
    /// ```
    pub fn tie<F>(build: F) -> T
    where
        F: FnOnce(Slot<T>) -> T,
    {
        let slot = Slot::new();
        let value = build(slot.clone());
        slot.settle(value)
    }

    /// Fallible variant of [`Slot::tie`]. The slot stays unbound on error.
    pub fn try_tie<F>(build: F) -> StreamResult<T>
    where
        F: FnOnce(Slot<T>) -> StreamResult<T>,
    {
        let slot = Slot::new();
        let value = build(slot.clone())?;
        Ok(slot.settle(value))
    }

    fn settle(&self, value: T) -> T {
        match self.bind(value.clone()) {
            Ok(()) => value,
            Err(rejected) => self.cell.get().cloned().unwrap_or(rejected),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Slot").field(value).finish(),
            None => f.write_str("Slot(<unbound>)"),
        }
    }
}

/// Shared node handle that can also be held without keeping the node alive
pub(crate) trait Downgrade: Clone {
    type Weak: Clone;

    fn downgrade(&self) -> Self::Weak;

    fn upgrade(weak: &Self::Weak) -> Option<Self>;
}

enum Resolved<N: Downgrade> {
    /// Result of forcing the thunk
    Strong(Option<N>),
    /// Back reference installed by the neighbor on the other end
    Weak(N::Weak),
}

/// One direction of a stream node: the thunk producing the neighbor and the
/// cache holding it once forced.
///
/// A strong entry never changes once set. A weak entry is a primed back
/// reference; if its target has been dropped the link falls back to the
/// thunk.
pub(crate) struct LazyLink<N: Downgrade> {
    direction: &'static str,
    thunk: Thunk<Option<N>>,
    cache: RefCell<Option<Resolved<N>>>,
}

impl<N: Downgrade> LazyLink<N> {
    pub(crate) fn new(direction: &'static str, thunk: Thunk<Option<N>>) -> Self {
        Self {
            direction,
            thunk,
            cache: RefCell::new(None),
        }
    }

    fn cached(&self) -> Option<Option<N>> {
        match self.cache.borrow().as_ref()? {
            Resolved::Strong(neighbor) => Some(neighbor.clone()),
            Resolved::Weak(weak) => N::upgrade(weak).map(Some),
        }
    }

    /// Force the link. With `does_memoize` the first successful result is
    /// cached and returned on every later call.
    pub(crate) fn force(&self, does_memoize: bool) -> StreamResult<Option<N>> {
        if let Some(cached) = self.cached() {
            return Ok(cached);
        }

        log::trace!(
            "Forcing {} thunk (does_memoize={})",
            self.direction,
            does_memoize
        );
        let resolved = (self.thunk)()?;

        if does_memoize {
            // A re-entrant force may have resolved the link already; keep
            // whichever result got there first.
            if let Some(cached) = self.cached() {
                return Ok(cached);
            }
            *self.cache.borrow_mut() = Some(Resolved::Strong(resolved.clone()));
        }

        Ok(resolved)
    }

    /// Point the link back at `neighbor` without running the thunk or keeping
    /// `neighbor` alive. Only a link with no live entry is primed.
    pub(crate) fn prime(&self, neighbor: N::Weak) {
        if self.cached().is_none() {
            *self.cache.borrow_mut() = Some(Resolved::Weak(neighbor));
        }
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.cached().is_some()
    }

    pub(crate) fn thunk_ptr(&self) -> *const () {
        Rc::as_ptr(&self.thunk) as *const ()
    }

    /// Detach the strongly cached neighbor, leaving the link unresolved
    pub(crate) fn take_cached(&mut self) -> Option<N> {
        match self.cache.get_mut().take() {
            Some(Resolved::Strong(neighbor)) => neighbor,
            _ => None,
        }
    }
}
