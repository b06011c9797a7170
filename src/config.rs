//! # SlotOS Configuration
//!
//! Compile-time constants governing the scheduler and system behavior.
//! All limits are fixed at compile time; no dynamic allocation.

/// Number of process slots in the process table, idle slot included.
/// Each slot owns `STACK_SIZE_PROC` bytes of stack inline.
pub const MAX_NUMBER_OF_PROCESSES: usize = 8;

/// Per-process stack size in bytes. Must hold the deepest call chain of the
/// program plus the hardware exception frame (32 bytes) and the
/// software-saved context (32 bytes for R4–R11).
pub const STACK_SIZE_PROC: usize = 1024;

/// Priority given to autostart programs and to the idle process.
pub const DEFAULT_PRIORITY: u8 = 5;

/// SysTick frequency in Hz. One scheduler tick per SysTick interrupt.
pub const TICK_HZ: u32 = 1000;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Input bitmask that requests the task manager from inside the tick
/// handler (first and fourth button held together).
pub const MAINTENANCE_INPUT: u8 = 0b1001;

/// Deepest supported critical-section nesting. Entering once more is fatal.
pub const MAX_CRITICAL_NESTING: u8 = u8::MAX;

/// Seed of the Random strategy's generator. Must be non-zero.
pub const RANDOM_SEED: u32 = 0x2545_F491;
