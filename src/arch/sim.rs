//! # Simulated Port
//!
//! A host-side [`Port`] with no hardware behind it. The tick source and the
//! global interrupt flag are plain flags, inputs are replayed from a script,
//! and a fatal error panics with its message so it can be observed.

use core::cell::Cell;

use crate::arch::Port;
use crate::error::KernelError;
use crate::scheduler::Scheduler;

/// Simulated port. All state is interior-mutable so the scheduler can use it
/// through a shared reference, as it would a hardware port.
#[derive(Debug)]
pub struct SimPort {
    preemption_enabled: Cell<bool>,
    global_interrupts: Cell<bool>,
    preemption_enables: Cell<u32>,
    preemption_disables: Cell<u32>,
    input: Cell<u8>,
    input_polls_left: Cell<u32>,
    task_manager_calls: Cell<u32>,
}

impl SimPort {
    /// A port with the tick source and global interrupts enabled and no
    /// button pressed.
    pub const fn new() -> Self {
        Self {
            preemption_enabled: Cell::new(true),
            global_interrupts: Cell::new(true),
            preemption_enables: Cell::new(0),
            preemption_disables: Cell::new(0),
            input: Cell::new(0),
            input_polls_left: Cell::new(0),
            task_manager_calls: Cell::new(0),
        }
    }

    /// Hold `input` for the next `polls` calls to [`Port::poll_input`].
    pub fn press(&self, input: u8, polls: u32) {
        self.input.set(input);
        self.input_polls_left.set(polls);
    }

    pub fn preemption_enabled(&self) -> bool {
        self.preemption_enabled.get()
    }

    /// Number of times the tick source was unmasked.
    pub fn preemption_enables(&self) -> u32 {
        self.preemption_enables.get()
    }

    /// Number of times the tick source was masked.
    pub fn preemption_disables(&self) -> u32 {
        self.preemption_disables.get()
    }

    pub fn task_manager_calls(&self) -> u32 {
        self.task_manager_calls.get()
    }
}

impl Default for SimPort {
    fn default() -> Self {
        Self::new()
    }
}

impl Port for SimPort {
    fn disable_preemption(&self) {
        self.preemption_enabled.set(false);
        self.preemption_disables.set(self.preemption_disables.get() + 1);
    }

    fn enable_preemption(&self) {
        self.preemption_enabled.set(true);
        self.preemption_enables.set(self.preemption_enables.get() + 1);
    }

    fn global_interrupts_enabled(&self) -> bool {
        self.global_interrupts.get()
    }

    fn set_global_interrupts(&self, enabled: bool) {
        self.global_interrupts.set(enabled);
    }

    fn poll_input(&self) -> u8 {
        match self.input_polls_left.get() {
            0 => 0,
            n => {
                self.input_polls_left.set(n - 1);
                self.input.get()
            }
        }
    }

    fn wait_for_no_input(&self) {
        while self.poll_input() != 0 {}
    }

    fn run_task_manager(&self, _scheduler: &mut Scheduler) {
        self.task_manager_calls.set(self.task_manager_calls.get() + 1);
    }

    fn fatal(&self, error: KernelError) -> ! {
        log::error!("{}", error);
        panic!("{}", error);
    }
}
