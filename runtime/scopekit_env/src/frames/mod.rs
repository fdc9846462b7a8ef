//! Call frames: the dynamic chain of who called whom.
//!
//! Each invocation pushes a [`CallFrame`] naming the environment it executes
//! in and the frame that was active at the call site. That caller link is
//! independent of the lexical parent of the execution environment: a closure
//! defined in `f` but called from `g` has `f`'s environment as its lexical
//! parent and `g`'s frame as its caller.
//!
//! Frames are consulted only by explicit caller/dynamic queries, never by
//! [`resolve`](crate::resolve).

use std::fmt;

use crate::errors::{EnvError, EnvResult};
use crate::graph::EnvId;
use crate::value::Value;

/// A frame on the stack: its position (0 is the outermost call) and the
/// serial of the push that created it.
///
/// Once the frame is popped the id stops resolving, even after another
/// frame is pushed at the same position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId {
    index: usize,
    serial: u64,
}

impl FrameId {
    pub fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame {}", self.index)
    }
}

/// One active invocation.
#[derive(Clone, Debug)]
pub struct CallFrame {
    env: EnvId,
    callee: Value,
    called_from: Option<FrameId>,
    /// Assigned by [`CallStack::push`].
    serial: u64,
}

impl CallFrame {
    pub fn new(env: EnvId, callee: Value, called_from: Option<FrameId>) -> Self {
        CallFrame {
            env,
            callee,
            called_from,
            serial: 0,
        }
    }

    fn id(&self, index: usize) -> FrameId {
        FrameId {
            index,
            serial: self.serial,
        }
    }

    /// Execution environment created for this call.
    #[inline]
    pub fn env(&self) -> EnvId {
        self.env
    }

    /// The closure value being run.
    pub fn callee(&self) -> &Value {
        &self.callee
    }

    /// Frame active at the call site; `None` for a call from top level.
    #[inline]
    pub fn called_from(&self) -> Option<FrameId> {
        self.called_from
    }
}

/// LIFO stack of [`CallFrame`]s with an optional depth limit.
///
/// The limit check lives in [`push`](Self::push): a frame that would exceed
/// it is not pushed and [`EnvError::DepthExceeded`] is returned instead.
#[derive(Clone, Debug, Default)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
    pushes: u64,
}

impl CallStack {
    /// `max_depth` of `None` means unbounded.
    pub fn new(max_depth: Option<usize>) -> Self {
        CallStack {
            frames: Vec::new(),
            max_depth,
            pushes: 0,
        }
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Fail if one more frame would exceed the limit.
    #[inline]
    pub fn check_room(&self) -> EnvResult<()> {
        match self.max_depth {
            Some(limit) if self.frames.len() >= limit => Err(EnvError::DepthExceeded { limit }),
            _ => Ok(()),
        }
    }

    pub fn push(&mut self, mut frame: CallFrame) -> EnvResult<FrameId> {
        self.check_room()?;
        self.pushes += 1;
        frame.serial = self.pushes;
        let id = frame.id(self.frames.len());
        self.frames.push(frame);
        Ok(id)
    }

    pub fn pop(&mut self) -> Option<CallFrame> {
        debug_assert!(!self.frames.is_empty(), "CallStack::pop on empty stack");
        self.frames.pop()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Innermost frame, if any call is active.
    #[inline]
    pub fn current(&self) -> Option<FrameId> {
        let index = self.frames.len().checked_sub(1)?;
        Some(self.frames[index].id(index))
    }

    /// The frame `id` names, if it is still on the stack.
    pub fn frame(&self, id: FrameId) -> Option<&CallFrame> {
        self.frames
            .get(id.index)
            .filter(|frame| frame.serial == id.serial)
    }

    /// Frame that called `of`.
    pub fn caller_frame(&self, of: FrameId) -> Option<FrameId> {
        self.frame(of)?.called_from
    }

    /// Environment of the frame that called `of`; `None` when `of` was called
    /// from top level or is not on the stack.
    pub fn caller_env(&self, of: FrameId) -> Option<EnvId> {
        let caller = self.caller_frame(of)?;
        self.frame(caller).map(CallFrame::env)
    }

    /// Active frames, innermost first.
    pub fn frames(&self) -> impl Iterator<Item = (FrameId, &CallFrame)> {
        self.frames
            .iter()
            .enumerate()
            .rev()
            .map(|(index, frame)| (frame.id(index), frame))
    }
}
