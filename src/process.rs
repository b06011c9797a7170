//! # Process Control Block
//!
//! Defines the process model for SlotOS. The process table is a fixed array
//! of [`Process`] slots; a process' identity is its slot index, and its
//! `state` doubles as the occupancy tag of the slot. Slot 0 always holds the
//! idle process once the kernel has started.

use crate::config::{MAX_NUMBER_OF_PROCESSES, STACK_SIZE_PROC};

/// Index into the process table, doubling as process identity.
pub type ProcessId = usize;

/// Scheduling priority: 0 is least favorable, 255 most favorable.
pub type Priority = u8;

/// One-byte XOR digest over a process' stack region.
pub type StackChecksum = u8;

/// Entry routine of a process. Programs never return.
pub type Program = extern "C" fn() -> !;

/// Slot of the idle process.
pub const IDLE_PROCESS: ProcessId = 0;

/// Number of words in the initial register image (8 software-saved,
/// 8 hardware-stacked).
const INITIAL_FRAME_WORDS: usize = 16;

/// xPSR with only the Thumb bit set.
const INITIAL_XPSR: u32 = 0x0100_0000;

// ---------------------------------------------------------------------------
// Process state machine
// ---------------------------------------------------------------------------

/// State of a process slot.
///
/// ```text
///               exec()              tick: selected
///   ┌────────┐ ───────► ┌───────┐ ─────────────────► ┌─────────┐
///   │ Unused │          │ Ready │                    │ Running │
///   └────────┘ ◄─────── └───────┘ ◄───────────────── └─────────┘
///               kill()              tick: demoted
/// ```
///
/// `Blocked` is part of the state space but never entered by the scheduler
/// itself; collaborators such as the task manager may park a process there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Free slot.
    Unused,
    /// Eligible to run, not executing.
    Ready,
    /// Currently executing on the processor.
    Running,
    /// Not eligible to run.
    Blocked,
}

// ---------------------------------------------------------------------------
// Stack region
// ---------------------------------------------------------------------------

/// Stack memory owned by one process slot. Aligned to 8 bytes as required
/// by the ARM AAPCS.
#[repr(C, align(8))]
pub struct ProcessStack(pub [u8; STACK_SIZE_PROC]);

impl ProcessStack {
    pub const fn new() -> Self {
        Self([0; STACK_SIZE_PROC])
    }

    /// Lowest address of the region.
    #[inline]
    pub fn bottom(&self) -> usize {
        self.0.as_ptr() as usize
    }

    /// One past the highest address of the region. Stacks grow down from here.
    #[inline]
    pub fn top(&self) -> usize {
        self.bottom() + STACK_SIZE_PROC
    }

    /// Whether `stack_pointer` addresses this region (an empty full-descending
    /// stack points at `top`).
    #[inline]
    pub fn contains(&self, stack_pointer: usize) -> bool {
        (self.bottom()..=self.top()).contains(&stack_pointer)
    }

    /// XOR of every byte of the region.
    pub fn checksum(&self) -> StackChecksum {
        self.0.iter().fold(0, |acc, byte| acc ^ byte)
    }

    /// Write the initial register image so that the first resumption of the
    /// process starts executing `entry`.
    ///
    /// ## Stack Layout (top = high address, growing down)
    ///
    /// ```text
    /// [Hardware stacked frame]
    ///   xPSR  (Thumb bit set)
    ///   PC    (program entry point)
    ///   LR    (process_exit)
    ///   R12, R3, R2, R1, R0  (0)
    /// [Software saved context]
    ///   R11 .. R4  (0)          <- returned stack pointer
    /// ```
    ///
    /// Returns the stack pointer to save in the PCB.
    pub fn prepare_initial_frame(&mut self, entry: Program) -> usize {
        let frame = STACK_SIZE_PROC - INITIAL_FRAME_WORDS * 4;

        let mut words = [0u32; INITIAL_FRAME_WORDS];
        words[13] = process_exit as usize as u32; // LR
        words[14] = entry as usize as u32; // PC
        words[15] = INITIAL_XPSR;

        for (i, word) in words.iter().enumerate() {
            let at = frame + i * 4;
            self.0[at..at + 4].copy_from_slice(&word.to_le_bytes());
        }

        self.bottom() + frame
    }

    /// Read back the little-endian word at byte offset `offset`.
    pub fn word_at(&self, offset: usize) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.0[offset..offset + 4]);
        u32::from_le_bytes(bytes)
    }
}

impl Default for ProcessStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Landing pad for a program that returns through its LR. Programs are
/// `-> !`, so this only runs on a corrupted frame.
extern "C" fn process_exit() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

// ---------------------------------------------------------------------------
// Process Control Block
// ---------------------------------------------------------------------------

/// Process Control Block (PCB), one per slot of the process table.
pub struct Process {
    /// Current state; `Unused` marks a free slot.
    pub state: ProcessState,

    /// Entry routine. Never changed after creation.
    pub program: Option<Program>,

    /// Caller-supplied priority. Some strategies ignore it.
    pub priority: Priority,

    /// Saved stack cursor while the process is not running.
    pub stack_pointer: usize,

    /// Stack checksum taken at the last suspension.
    pub checksum: StackChecksum,

    /// Stack memory of this slot.
    pub stack: ProcessStack,
}

impl Process {
    /// An unused slot. Used to initialize the static process table.
    pub const EMPTY: Self = Self {
        state: ProcessState::Unused,
        program: None,
        priority: 0,
        stack_pointer: 0,
        checksum: 0,
        stack: ProcessStack::new(),
    };

    /// Occupy this slot with a fresh process and seal its initial stack.
    ///
    /// The previous occupant's checksum is discarded; the checksum of the
    /// prepared frame is recorded so the first resumption verifies.
    pub fn init(&mut self, program: Program, priority: Priority) {
        self.program = Some(program);
        self.priority = priority;
        self.state = ProcessState::Ready;
        self.checksum = 0;
        self.stack_pointer = self.stack.prepare_initial_frame(program);
        self.checksum = self.stack.checksum();
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state == ProcessState::Ready
    }

    #[inline]
    pub fn is_unused(&self) -> bool {
        self.state == ProcessState::Unused
    }
}

impl Default for Process {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// The process table, indexed by [`ProcessId`].
pub type ProcessTable = [Process; MAX_NUMBER_OF_PROCESSES];

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn dummy_program() -> ! {
        loop {}
    }

    #[test]
    fn test_process_initialization() {
        let mut process = Box::new(Process::EMPTY);
        assert!(process.is_unused());

        process.init(dummy_program, 42);

        assert!(process.is_ready());
        assert_eq!(process.priority, 42);
        assert!(process.program.is_some());
        assert!(process.stack.contains(process.stack_pointer));
        assert_eq!(process.checksum, process.stack.checksum());
    }

    #[test]
    fn test_initial_frame_layout() {
        let mut stack = Box::new(ProcessStack::new());
        let sp = stack.prepare_initial_frame(dummy_program);

        let frame = sp - stack.bottom();
        assert_eq!(frame, STACK_SIZE_PROC - 64);
        assert_eq!(sp % 8, 0);

        // R4-R11, then R0-R3 and R12 are zero
        for i in 0..13 {
            assert_eq!(stack.word_at(frame + i * 4), 0);
        }
        assert_eq!(stack.word_at(frame + 13 * 4), process_exit as usize as u32);
        assert_eq!(stack.word_at(frame + 14 * 4), dummy_program as usize as u32);
        assert_eq!(stack.word_at(frame + 15 * 4), INITIAL_XPSR);
    }

    #[test]
    fn test_checksum_detects_single_byte_change() {
        let mut stack = Box::new(ProcessStack::new());
        stack.prepare_initial_frame(dummy_program);
        let before = stack.checksum();
        assert_eq!(stack.checksum(), before);

        stack.0[17] ^= 0x40;
        assert_ne!(stack.checksum(), before);
    }

    #[test]
    fn test_stack_bounds() {
        let stack = Box::new(ProcessStack::new());
        assert!(stack.contains(stack.bottom()));
        assert!(stack.contains(stack.top()));
        assert!(!stack.contains(stack.top() + 1));
        assert!(!stack.contains(stack.bottom() - 1));
    }
}
