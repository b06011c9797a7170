//! # Cortex-M4 Port Layer
//!
//! Hardware-specific code for the ARM Cortex-M4 (Thumb-2) processor.
//! Implements the scheduler tick and context switch in the SysTick handler,
//! SysTick configuration, and the [`Port`] capabilities the kernel needs.
//!
//! ## Context Switch Mechanism
//!
//! The Cortex-M4 uses a split-stack model:
//! - **MSP** (Main Stack Pointer): Used by the kernel and interrupt handlers
//! - **PSP** (Process Stack Pointer): Used by processes in Thread mode
//!
//! On exception entry, the hardware automatically stacks R0–R3, R12, LR, PC,
//! and xPSR onto the process stack. The SysTick handler pushes R4–R11 on top
//! of that, which completes the full context save, before any scheduler
//! code runs. The scheduler itself runs on the MSP and never touches a
//! process stack except to checksum it.
//!
//! ## Preemption Source
//!
//! SysTick is the only preemption source. Critical sections mask it through
//! `SYST_CSR.TICKINT`; PRIMASK is the global interrupt flag.

use core::arch::{asm, naked_asm};

use cortex_m::peripheral::scb::SystemHandler;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::{SCB, SYST};
use cortex_m::register::primask;

use crate::arch::Port;
use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ};
use crate::error::KernelError;

/// SysTick interrupt enable bit of `SYST_CSR`.
const SYST_CSR_TICKINT: u32 = 1 << 1;

/// EXC_RETURN: return to Thread mode, basic frame, PSP.
const EXC_RETURN_THREAD_PSP: u32 = 0xFFFF_FFFD;

/// The Cortex-M4 port. Stateless: every capability is a register access.
#[derive(Debug, Default)]
pub struct CortexM4;

impl CortexM4 {
    pub const fn new() -> Self {
        Self
    }
}

impl Port for CortexM4 {
    fn disable_preemption(&self) {
        unsafe { (*SYST::PTR).csr.modify(|csr| csr & !SYST_CSR_TICKINT) }
    }

    fn enable_preemption(&self) {
        unsafe { (*SYST::PTR).csr.modify(|csr| csr | SYST_CSR_TICKINT) }
    }

    fn global_interrupts_enabled(&self) -> bool {
        primask::read().is_inactive()
    }

    fn set_global_interrupts(&self, enabled: bool) {
        if enabled {
            unsafe { cortex_m::interrupt::enable() }
        } else {
            cortex_m::interrupt::disable();
        }
    }

    fn fatal(&self, error: KernelError) -> ! {
        log::error!("[kernel] fatal: {}", error);
        cortex_m::interrupt::disable();
        loop {
            cortex_m::asm::wfi();
        }
    }
}

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Configure SysTick to fire at `TICK_HZ` from the processor clock.
/// Each tick enters the `SysTick` handler below.
pub fn configure_systick(syst: &mut SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

/// Put SysTick at the lowest exception priority so the context switch never
/// preempts another interrupt handler.
pub fn set_interrupt_priorities(scb: &mut SCB) {
    unsafe { scb.set_priority(SystemHandler::SysTick, 0xFF) }
}

// ---------------------------------------------------------------------------
// First process launch
// ---------------------------------------------------------------------------

/// Start the first process by switching to PSP and branching to Thread mode.
///
/// `psp` points at the software-saved part of an initial register image as
/// written by `ProcessStack::prepare_initial_frame`.
///
/// # Safety
/// Must only be called once, with interrupts disabled and a valid image.
pub unsafe fn start_first_task(psp: *const u32) -> ! {
    asm!(
        // Skip the software-saved R4-R11 (8×4 = 32 bytes)
        "adds r0, #32",
        "msr psp, r0",

        // Switch to PSP for Thread mode (set CONTROL.SPSEL = 1)
        "movs r0, #2",
        "msr control, r0",
        "isb",

        // Pop the hardware frame manually since we're not really returning from an exception
        "pop {{r0-r3, r12}}",
        "pop {{r4}}",          // LR (process_exit, unused: programs never return)
        "pop {{r5}}",          // PC (program entry point)
        "pop {{r6}}",          // xPSR (discarded)

        "cpsie i",
        "bx r5",

        in("r0") psp,
        options(noreturn)
    );
}

// ---------------------------------------------------------------------------
// SysTick handler (tick + context switch)
// ---------------------------------------------------------------------------

/// SysTick exception handler: one scheduler tick.
///
/// ## Sequence
/// 1. Save R4–R11 onto the running process' stack (PSP)
/// 2. Hand the resulting PSP to the scheduler, which returns the PSP of the
///    process to resume
/// 3. Restore R4–R11 from the incoming process' stack
/// 4. Return from exception (hardware restores R0–R3, R12, LR, PC, xPSR)
///
/// # Safety
/// Naked function entered directly by the NVIC; it must follow the exact
/// exception entry/exit convention.
#[no_mangle]
#[unsafe(naked)]
pub unsafe extern "C" fn SysTick() {
    naked_asm!(
        "mrs r0, psp",
        "stmdb r0!, {{r4-r11}}",
        "bl {tick}",
        "ldmia r0!, {{r4-r11}}",
        "msr psp, r0",
        "ldr r0, ={exc_return}",
        "bx r0",
        tick = sym scheduler_tick,
        exc_return = const EXC_RETURN_THREAD_PSP,
    )
}

/// Scheduling decision between register save and restore.
///
/// # Safety
/// Called from the SysTick handler only, with the full context of the
/// outgoing process saved at `psp`.
unsafe extern "C" fn scheduler_tick(psp: *mut u32) -> *mut u32 {
    crate::kernel::tick(psp as usize) as *mut u32
}
