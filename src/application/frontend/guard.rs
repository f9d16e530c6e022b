use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::domain::entities::EntityId;

/// Marks the builder content interceptor as running. While a guard is alive,
/// nested passes through the main content chain skip the interceptor.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyFlag {
    held: Rc<Cell<bool>>,
}

impl ReentrancyFlag {
    /// `None` when the flag is already held further up the call stack.
    pub fn try_acquire(&self) -> Option<ReentrancyGuard> {
        if self.held.replace(true) {
            return None;
        }
        Some(ReentrancyGuard {
            held: Rc::clone(&self.held),
        })
    }

    pub fn is_held(&self) -> bool {
        self.held.get()
    }
}

#[derive(Debug)]
pub struct ReentrancyGuard {
    held: Rc<Cell<bool>>,
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        self.held.set(false);
    }
}

/// The entity a render pass is producing markup for, and whether that pass
/// runs with editor affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    pub entity: Option<EntityId>,
    pub edit_mode: bool,
}

/// Stack of active frames. The base frame is the request's main entity;
/// nested renders push a frame through [`ContextFrames::enter`].
#[derive(Debug, Clone, Default)]
pub struct ContextFrames {
    stack: Rc<RefCell<Vec<Frame>>>,
}

impl ContextFrames {
    pub fn reset(&self, base: Frame) {
        let mut stack = self.stack.borrow_mut();
        stack.clear();
        stack.push(base);
    }

    pub fn clear(&self) {
        self.stack.borrow_mut().clear();
    }

    pub fn current(&self) -> Frame {
        self.stack.borrow().last().copied().unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    /// Whether `entity` is being rendered anywhere in the active chain.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.stack
            .borrow()
            .iter()
            .any(|frame| frame.entity == Some(entity))
    }

    pub fn enter(&self, frame: Frame) -> FrameGuard {
        let mut stack = self.stack.borrow_mut();
        let restore_to = stack.len();
        stack.push(frame);
        FrameGuard {
            stack: Rc::clone(&self.stack),
            restore_to,
        }
    }
}

/// Pops its frame, and anything pushed above it, when dropped.
#[derive(Debug)]
pub struct FrameGuard {
    stack: Rc<RefCell<Vec<Frame>>>,
    restore_to: usize,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        self.stack.borrow_mut().truncate(self.restore_to);
    }
}
