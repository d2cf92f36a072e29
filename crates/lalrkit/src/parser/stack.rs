//! Parse stacks with shared prefixes.
//!
//! Forking a stack clones only its head pointer; the frames below are shared
//! through `Arc` until one of the branches pops them.

use std::sync::Arc;

use super::recovery::RecoveryState;
use super::token::StreamPosition;
use super::value::SemanticValue;
use crate::backend::lr::StateId;

#[derive(Debug)]
struct Frame<V> {
    state: StateId,
    value: V,
    position: StreamPosition,
    prev: Option<Arc<Frame<V>>>,
    depth: usize,
}

impl<V> Frame<V> {
    fn new(state: StateId, value: V, position: StreamPosition, prev: Option<Arc<Self>>) -> Arc<Self> {
        let depth = prev.as_ref().map_or(1, |p| p.depth + 1);
        Arc::new(Self {
            state,
            value,
            position,
            prev,
            depth,
        })
    }
}

impl<V> Drop for Frame<V> {
    // Unlink uniquely owned frames one by one so long stacks do not recurse.
    fn drop(&mut self) {
        let mut next = self.prev.take();
        while let Some(frame) = next {
            match Arc::try_unwrap(frame) {
                Ok(mut frame) => next = frame.prev.take(),
                Err(_) => break,
            }
        }
    }
}

/// One in-flight parse path: states, values and positions.
///
/// The bottom frame holds the initial state and is never popped.
#[derive(Debug, Clone)]
pub struct ParseStack<V> {
    id: usize,
    head: Arc<Frame<V>>,
    pub(crate) recovery: RecoveryState<V>,
    /// Reductions applied under the current token
    reductions: usize,
    /// Depth when the current token was reached
    entry_depth: usize,
}

impl<V: SemanticValue> ParseStack<V> {
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self {
            id,
            head: Frame::new(0, V::default(), StreamPosition::default(), None),
            recovery: RecoveryState::default(),
            reductions: 0,
            entry_depth: 1,
        }
    }

    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Current (top) state
    #[must_use]
    pub fn state(&self) -> StateId {
        self.head.state
    }

    /// Number of frames, the bottom one included
    #[must_use]
    pub fn len(&self) -> usize {
        self.head.depth
    }

    /// Whether only the bottom frame is left
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.depth == 1
    }

    #[must_use]
    pub fn top_position(&self) -> StreamPosition {
        self.head.position
    }

    pub fn push(&mut self, state: StateId, value: V, position: StreamPosition) {
        self.head = Frame::new(state, value, position, Some(Arc::clone(&self.head)));
    }

    /// Pop `count` frames, returning their values and positions bottom to top.
    ///
    /// Returns `None` if that would pop the bottom frame.
    pub fn pop(&mut self, count: usize) -> Option<Vec<(V, StreamPosition)>> {
        if count >= self.head.depth {
            return None;
        }
        let mut popped = Vec::with_capacity(count);
        for _ in 0..count {
            let prev = self.head.prev.clone()?;
            let frame = std::mem::replace(&mut self.head, prev);
            popped.push(match Arc::try_unwrap(frame) {
                Ok(mut frame) => (std::mem::take(&mut frame.value), frame.position),
                Err(shared) => (shared.value.clone(), shared.position),
            });
        }
        popped.reverse();
        Some(popped)
    }

    /// Drop the top frame, keeping the bottom one
    pub fn pop_frame(&mut self) -> bool {
        match self.head.prev.clone() {
            Some(prev) if self.head.depth > 1 => {
                self.head = prev;
                true
            }
            _ => false,
        }
    }

    /// Share every frame with a new stack
    #[must_use]
    pub fn fork(&self, id: usize) -> Self {
        Self {
            id,
            head: Arc::clone(&self.head),
            recovery: self.recovery.clone(),
            reductions: self.reductions,
            entry_depth: self.entry_depth,
        }
    }

    /// Reset the reduction count for a new token
    pub(crate) fn begin_token(&mut self) {
        self.reductions = 0;
        self.entry_depth = self.len();
    }

    /// Count one reduction, returning the total under the current token
    pub(crate) fn count_reduction(&mut self) -> usize {
        self.reductions += 1;
        self.reductions
    }

    pub(crate) const fn entry_depth(&self) -> usize {
        self.entry_depth
    }

    /// State ids from bottom to top
    #[must_use]
    pub fn states(&self) -> Vec<StateId> {
        let mut states = Vec::with_capacity(self.len());
        let mut current = Some(&self.head);
        while let Some(frame) = current {
            states.push(frame.state);
            current = frame.prev.as_ref();
        }
        states.reverse();
        states
    }

    /// Consume the stack, returning the top value
    #[must_use]
    pub fn into_value(self) -> V {
        match Arc::try_unwrap(self.head) {
            Ok(mut frame) => std::mem::take(&mut frame.value),
            Err(shared) => shared.value.clone(),
        }
    }

    /// Whether both stacks share the same top frame
    #[must_use]
    pub fn is_identical(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.head, &other.head)
    }
}
