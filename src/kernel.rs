//! # Kernel
//!
//! Top-level kernel initialization and public API for SlotOS on Cortex-M4.
//!
//! The kernel owns the global scheduler instance and the hardware port and
//! forwards every call to [`Scheduler`] with that port. Operations that scan
//! or modify the process table run inside a scheduler critical section.
//!
//! ## Startup Sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► kernel::init(AUTOSTART)  ← Autostart programs + idle in slot 0
//!         ├─► kernel::set_scheduling_strategy()  (optional)
//!         └─► kernel::start()          ← Launch scheduler (no return)
//!               ├─► Configure SysTick
//!               ├─► Set SysTick priority
//!               └─► Start idle via arch::start_first_task()
//! ```

use core::ptr::addr_of_mut;

use crate::arch::cortex_m4::{self, CortexM4};
use crate::error::ProcessError;
use crate::process::{Priority, Process, ProcessId, Program};
use crate::scheduler::Scheduler;
use crate::strategy::SchedulingStrategy;

// ---------------------------------------------------------------------------
// Global scheduler instance
// ---------------------------------------------------------------------------

/// Global scheduler instance.
///
/// # Safety
/// Accessed from process context only inside scheduler critical sections
/// (SysTick masked), and from the SysTick handler, which cannot preempt
/// itself.
static mut SCHEDULER: Scheduler = Scheduler::new();

static PORT: CortexM4 = CortexM4::new();

#[inline]
fn scheduler() -> &'static mut Scheduler {
    unsafe { &mut *addr_of_mut!(SCHEDULER) }
}

// ---------------------------------------------------------------------------
// Kernel API
// ---------------------------------------------------------------------------

/// Reset the process table and start the autostart programs, then idle.
///
/// Must be called exactly once, before `start()`.
pub fn init(autostart: &[Program]) {
    scheduler().init(&PORT, autostart);
}

/// Start `program` with `priority` in the lowest free slot.
///
/// # Returns
/// - `Ok(pid)`: the slot of the new process
/// - `Err(ProcessError::NoProgram)` or `Err(ProcessError::TableFull)`
pub fn exec(program: Option<Program>, priority: Priority) -> Result<ProcessId, ProcessError> {
    scheduler().exec(&PORT, program, priority)
}

/// Terminate process `pid`. Visible to the scheduler at the next tick.
pub fn kill(pid: ProcessId) -> Result<(), ProcessError> {
    scheduler().kill(&PORT, pid)
}

/// Start the scheduler. **Does not return.**
///
/// Configures SysTick, sets its priority, and launches the idle process.
/// After this call the system is preemptive.
pub fn start(mut core_peripherals: cortex_m::Peripherals) -> ! {
    cortex_m::interrupt::disable();

    cortex_m4::configure_systick(&mut core_peripherals.SYST);
    cortex_m4::set_interrupt_priorities(&mut core_peripherals.SCB);

    let first_sp = scheduler().start();
    unsafe { cortex_m4::start_first_task(first_sp as *const u32) }
}

/// Direct reference to the PCB in slot `pid`.
pub fn process_slot(pid: ProcessId) -> Option<&'static Process> {
    let shared: &'static Scheduler = scheduler();
    shared.process_slot(pid)
}

/// Slot of the running process.
pub fn current_proc() -> ProcessId {
    scheduler().current_proc()
}

pub fn set_scheduling_strategy(strategy: SchedulingStrategy) {
    scheduler().set_scheduling_strategy(&PORT, strategy);
}

pub fn scheduling_strategy() -> SchedulingStrategy {
    scheduler().scheduling_strategy()
}

/// Suspend preemption. Nests up to 255 levels.
pub fn enter_critical_section() {
    scheduler().enter_critical_section(&PORT);
}

/// Resume preemption once the outermost critical section is left.
pub fn leave_critical_section() {
    scheduler().leave_critical_section(&PORT);
}

/// Scheduler tick. Called from the SysTick handler with the saved PSP.
pub(crate) fn tick(stack_pointer: usize) -> usize {
    scheduler().tick(&PORT, stack_pointer)
}
