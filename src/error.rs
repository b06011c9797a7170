//! # Kernel Errors
//!
//! Two classes of failure exist in the scheduler core:
//!
//! - [`ProcessError`] is recoverable. It is returned to the caller of a
//!   process-management operation and leaves the process table unchanged.
//! - [`KernelError`] is fatal. It is handed to [`Port::fatal`], which halts
//!   the system and never returns.
//!
//! [`Port::fatal`]: crate::arch::Port::fatal

use core::fmt;

use crate::process::{ProcessId, StackChecksum};

/// Recoverable failure of a process-management request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessError {
    /// No program was supplied.
    NoProgram,
    /// Every non-idle slot is occupied.
    TableFull,
    /// The process id does not name a slot of the table.
    InvalidProcess(ProcessId),
    /// The operation is not permitted on the idle process.
    IdleProcess,
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::NoProgram => f.write_str("no program given"),
            ProcessError::TableFull => f.write_str("process table full"),
            ProcessError::InvalidProcess(pid) => write!(f, "invalid process id {}", pid),
            ProcessError::IdleProcess => f.write_str("idle process cannot be modified"),
        }
    }
}

/// Unrecoverable kernel failure. The kernel's own data can no longer be
/// trusted, so the system halts instead of continuing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// `enter` called with the nesting counter already at its maximum.
    CriticalSectionOverflow,
    /// `leave` called without a matching `enter`.
    CriticalSectionUnderflow,
    /// The stack checksum of a resuming process differs from the one taken
    /// at its suspension.
    StackCorrupted {
        pid: ProcessId,
        expected: StackChecksum,
        found: StackChecksum,
    },
    /// A suspended process' stack pointer lies outside its own stack region.
    StackPointerOutOfRange { pid: ProcessId, stack_pointer: usize },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::CriticalSectionOverflow => f.write_str("critical section overflow"),
            KernelError::CriticalSectionUnderflow => {
                f.write_str("critical sections don't match")
            }
            KernelError::StackCorrupted { pid, expected, found } => write!(
                f,
                "checksum incorrect for process {} (expected {:#04x}, found {:#04x})",
                pid, expected, found
            ),
            KernelError::StackPointerOutOfRange { pid, stack_pointer } => write!(
                f,
                "stack pointer {:#x} of process {} outside its stack",
                stack_pointer, pid
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_messages() {
        assert_eq!(
            KernelError::CriticalSectionOverflow.to_string(),
            "critical section overflow"
        );
        let err = KernelError::StackCorrupted {
            pid: 3,
            expected: 0x1f,
            found: 0x20,
        };
        assert_eq!(
            err.to_string(),
            "checksum incorrect for process 3 (expected 0x1f, found 0x20)"
        );
    }

    #[test]
    fn test_process_error_messages() {
        assert_eq!(ProcessError::TableFull.to_string(), "process table full");
        assert_eq!(
            ProcessError::InvalidProcess(9).to_string(),
            "invalid process id 9"
        );
    }
}
