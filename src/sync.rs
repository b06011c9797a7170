//! # Synchronization Primitives
//!
//! Reentrant critical sections for kernel code running in process context.
//!
//! Inside a critical section the tick interrupt source is masked, so no
//! rescheduling can happen partway through. Sections nest: only the
//! outermost `enter` masks the tick source and only the matching outermost
//! `leave` unmasks it. Other interrupts stay live.
//!
//! The counter update itself runs with the global interrupt flag cleared,
//! and the flag is then restored to exactly its previous value. Calling
//! `enter`/`leave` from a context that already has interrupts disabled
//! therefore never re-enables them by accident.

use crate::arch::Port;
use crate::config::MAX_CRITICAL_NESTING;
use crate::error::KernelError;

/// Nesting counter of critical sections.
#[derive(Debug, Default)]
pub struct CriticalSection {
    depth: u8,
}

impl CriticalSection {
    pub const fn new() -> Self {
        Self { depth: 0 }
    }

    /// Current nesting depth; 0 outside any critical section.
    #[inline]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    /// Enter a (possibly nested) critical section.
    ///
    /// Fatal if the nesting depth is already `MAX_CRITICAL_NESTING`.
    pub fn enter<P: Port + ?Sized>(&mut self, port: &P) {
        let interrupts = port.global_interrupts_enabled();
        port.set_global_interrupts(false);

        if self.depth == MAX_CRITICAL_NESTING {
            port.fatal(KernelError::CriticalSectionOverflow);
        }
        self.depth += 1;
        if self.depth == 1 {
            port.disable_preemption();
        }

        port.set_global_interrupts(interrupts);
    }

    /// Leave the innermost critical section.
    ///
    /// Fatal if there is no critical section to leave.
    pub fn leave<P: Port + ?Sized>(&mut self, port: &P) {
        let interrupts = port.global_interrupts_enabled();
        port.set_global_interrupts(false);

        if self.depth == 0 {
            port.fatal(KernelError::CriticalSectionUnderflow);
        }
        self.depth -= 1;
        if self.depth == 0 {
            port.enable_preemption();
        }

        port.set_global_interrupts(interrupts);
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
