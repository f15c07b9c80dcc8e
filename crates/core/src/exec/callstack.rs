//! Shadow call stack.
//!
//! An out-of-band stack of call frames maintained alongside execution for
//! diagnostics: `jal`-with-link pushes, `jalr`-return pops. The stack never
//! affects the simulated machine state; a return-address mismatch is logged
//! and the frame is popped anyway so the view resynchronizes.

use std::fmt;

use log::warn;

/// One recorded function invocation.
#[derive(Debug, Clone, Default)]
pub struct CallFrame {
    /// Label name of the callee (`* main *` for the synthetic bottom frame).
    pub name: String,
    /// Source line currently executing in this frame, if known.
    pub line: Option<usize>,
    /// Address the frame is expected to return to.
    pub return_addr: u32,
}

impl fmt::Display for CallFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.line.map(|l| l as i64).unwrap_or(-1);
        write!(
            f,
            "  {} at line : {} Next Instruction 0x{:08x} ",
            self.name, line, self.return_addr
        )
    }
}

/// The frame stack.
#[derive(Debug, Default, Clone)]
pub struct ShadowCallStack {
    frames: Vec<CallFrame>,
}

impl ShadowCallStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every frame.
    pub fn reset(&mut self) {
        self.frames.clear();
    }

    /// Pushes a frame for a call (or the synthetic entry frame).
    pub fn push_frame(&mut self, name: String, line: Option<usize>, pc: u32) {
        self.frames.push(CallFrame {
            name,
            line,
            return_addr: pc,
        });
    }

    /// Updates the executing line of the top frame.
    pub fn update_top_line(&mut self, line: Option<usize>) {
        if let Some(top) = self.frames.last_mut() {
            top.line = line;
        }
    }

    /// Updates the expected return address of the top frame.
    pub fn update_top_return(&mut self, pc: u32) {
        if let Some(top) = self.frames.last_mut() {
            top.return_addr = pc;
        }
    }

    /// Pops the top frame on a return.
    ///
    /// The computed return target is checked against the caller frame's
    /// recorded return address; a mismatch is logged but the frame is still
    /// popped so the stack tracks the program's actual control flow.
    pub fn pop_on_return(&mut self, target: u32) {
        if self.frames.len() < 2 {
            warn!("shadow call stack empty on jalr");
            return;
        }

        let expected = self.frames[self.frames.len() - 2].return_addr;
        if expected != target {
            warn!(
                "shadow call stack mismatch: expected {:#x}, returning to {:#x}",
                expected, target
            );
        }
        self.frames.pop();
    }

    /// The frames, bottom (oldest) first.
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    /// Returns the current call depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for ShadowCallStack {
    /// Renders the stack oldest-to-newest, one numbered frame per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Call stack (oldest to newest):")?;
        for (i, frame) in self.frames.iter().enumerate() {
            writeln!(f, "#{} {}", i, frame)?;
        }
        Ok(())
    }
}
