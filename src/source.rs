//! Shared pull cursor behind `from_iterable`

use std::cell::{OnceCell, RefCell};
use std::rc::Rc;

/// One position of an external iterator.
///
/// Each position reads the iterator at most once, so nodes that re-run their
/// thunks (non-memoizing) still see the same element at the same position.
pub(crate) struct Tape<V> {
    source: Rc<RefCell<dyn Iterator<Item = V>>>,
    pulled: OnceCell<Option<(V, Rc<Tape<V>>)>>,
}

impl<V: Clone + 'static> Tape<V> {
    pub(crate) fn new<I>(iter: I) -> Rc<Self>
    where
        I: Iterator<Item = V> + 'static,
    {
        Rc::new(Self {
            source: Rc::new(RefCell::new(iter)),
            pulled: OnceCell::new(),
        })
    }

    /// The element at this position and the position after it, or `None`
    /// once the iterator is exhausted.
    pub(crate) fn advance(&self) -> Option<(V, Rc<Tape<V>>)> {
        self.pulled
            .get_or_init(|| {
                let value = self.source.borrow_mut().next()?;
                let rest = Rc::new(Tape {
                    source: Rc::clone(&self.source),
                    pulled: OnceCell::new(),
                });
                Some((value, rest))
            })
            .clone()
    }
}

// Positions already pulled form a forward chain; unlink it iteratively so
// a long tape does not take one stack frame per element to drop.
impl<V> Drop for Tape<V> {
    fn drop(&mut self) {
        let mut pulled = self.pulled.take();
        while let Some(Some((_, rest))) = pulled {
            match Rc::try_unwrap(rest) {
                Ok(mut tape) => pulled = tape.pulled.take(),
                Err(_) => break,
            }
        }
    }
}
