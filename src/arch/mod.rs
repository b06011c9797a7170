//! # Architecture Abstraction Layer
//!
//! Provides the hardware abstraction boundary for the scheduler. The
//! scheduler core never touches registers itself; everything it needs from
//! the platform goes through [`Port`].
//!
//! - `cortex_m4`: the ARM Cortex-M4 port (bare-metal targets only)
//! - `sim`: a simulated port for host builds and tests

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod cortex_m4;
pub mod sim;

use crate::error::KernelError;
use crate::scheduler::Scheduler;

/// Platform capabilities consumed by the scheduler core.
///
/// The save/restore of CPU registers around a context switch is not part of
/// this trait: the port's interrupt entry performs the full register save
/// before calling [`Scheduler::tick`] and the full restore after it returns.
pub trait Port {
    /// Mask the tick interrupt source.
    fn disable_preemption(&self);

    /// Unmask the tick interrupt source.
    fn enable_preemption(&self);

    /// Whether the global interrupt-enable flag is set.
    fn global_interrupts_enabled(&self) -> bool;

    /// Set or clear the global interrupt-enable flag.
    fn set_global_interrupts(&self, enabled: bool);

    /// Current button bitmask. Compared against
    /// [`MAINTENANCE_INPUT`](crate::config::MAINTENANCE_INPUT) on every tick.
    fn poll_input(&self) -> u8 {
        0
    }

    /// Block until every button is released.
    fn wait_for_no_input(&self) {}

    /// Hand control to the task manager. It may change process states and
    /// the scheduling strategy before the tick continues.
    fn run_task_manager(&self, _scheduler: &mut Scheduler) {}

    /// Report a fatal kernel error and halt. Never returns.
    fn fatal(&self, error: KernelError) -> !;
}
