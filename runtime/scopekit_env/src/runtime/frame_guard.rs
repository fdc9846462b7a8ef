//! RAII guard for call frames.
//!
//! [`FrameGuard`] pops its frame when dropped, so a frame leaves the stack
//! whether the call returns a value, returns an error through `?`, or unwinds.

use std::ops::{Deref, DerefMut};

use super::Runtime;
use crate::errors::EnvResult;
use crate::frames::{CallFrame, FrameId};

/// Holds the runtime while one frame is active.
///
/// Derefs to [`Runtime`], so code running inside the frame uses the guard
/// exactly like the runtime itself.
pub struct FrameGuard<'rt> {
    runtime: &'rt mut Runtime,
    frame: FrameId,
}

impl FrameGuard<'_> {
    /// The frame this guard keeps on the stack.
    pub fn frame(&self) -> FrameId {
        self.frame
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.runtime.stack.pop();
    }
}

impl Deref for FrameGuard<'_> {
    type Target = Runtime;

    fn deref(&self) -> &Runtime {
        self.runtime
    }
}

impl DerefMut for FrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut Runtime {
        self.runtime
    }
}

impl Runtime {
    /// Push `frame` and return a guard that pops it on drop.
    ///
    /// Fails with [`EnvError::DepthExceeded`](crate::EnvError::DepthExceeded)
    /// without pushing when the stack is full.
    pub fn enter_frame(&mut self, frame: CallFrame) -> EnvResult<FrameGuard<'_>> {
        let frame = self.stack.push(frame)?;
        Ok(FrameGuard {
            runtime: self,
            frame,
        })
    }
}
