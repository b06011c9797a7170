//! # SlotOS: Slot-based Process Scheduler
//!
//! The process scheduler of a small preemptive multitasking kernel for
//! single-core ARM Cortex-M4 microcontrollers.
//!
//! ## Overview
//!
//! A fixed table of process slots is served by a timer tick. On every tick
//! the running process is suspended, its stack is sealed with a checksum,
//! one of five interchangeable strategies picks the next slot, and that
//! process' checksum is verified before it resumes. Kernel code that must
//! not be preempted runs inside nested critical sections that mask the tick.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                      Processes                          │
//! ├────────────────────────────────────────────────────────┤
//! │               Kernel API (kernel.rs)                    │
//! │     init() · exec() · kill() · start() · strategy      │
//! ├──────────────┬────────────────────┬───────────────────┤
//! │  Scheduler   │   Strategies       │  Sync Primitives  │
//! │  scheduler.rs│   strategy.rs      │  sync.rs          │
//! │  ─ tick()    │   ─ even / random  │  ─ enter()        │
//! │  ─ exec()    │   ─ round-robin    │  ─ leave()        │
//! │  ─ kill()    │   ─ aging / rtc    │                   │
//! ├──────────────┴────────────────────┴───────────────────┤
//! │          Process Model (process.rs)                     │
//! │    PCB · ProcessState · ProcessStack · checksum         │
//! ├────────────────────────────────────────────────────────┤
//! │     Port (arch/mod.rs): cortex_m4.rs · sim.rs           │
//! │    SysTick · Context Switch · Interrupt flags           │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Memory Model
//!
//! - **No heap**: All state is statically allocated
//! - **Fixed-size process table**: `[Process; MAX_NUMBER_OF_PROCESSES]`
//! - **Per-process stack**: `[u8; STACK_SIZE_PROC]` inline in the PCB
//! - **Critical sections**: SysTick masked, nesting counted, PRIMASK restored

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
pub mod process;
pub mod strategy;
pub mod scheduler;
pub mod sync;
pub mod arch;
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod kernel;
