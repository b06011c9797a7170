//! # Scheduler
//!
//! The process table and the tick-driven scheduling protocol of SlotOS.
//!
//! ## Tick Protocol
//!
//! The port's tick interrupt saves the full register set of the running
//! process onto its own stack and calls [`Scheduler::tick`] with the
//! resulting stack pointer. The tick then runs, in this order:
//!
//! 1. **Suspend**: store the stack pointer in the outgoing PCB
//! 2. **Seal**: compute and store the outgoing stack checksum
//! 3. **Service**: enter the task manager if the maintenance input is held
//! 4. **Demote**: mark the outgoing process Ready (if still Running)
//! 5. **Select**: ask the active strategy for the next slot, mark it Running
//! 6. **Verify**: recompute the incoming stack checksum; a mismatch is fatal
//!
//! and returns the incoming stack pointer. The port loads it and restores
//! the incoming register set as its last act before returning.
//!
//! The checksum is taken before anything else can touch the outgoing stack,
//! so it reflects the process exactly as suspended.

use crate::arch::Port;
use crate::config::{DEFAULT_PRIORITY, MAINTENANCE_INPUT, MAX_NUMBER_OF_PROCESSES};
use crate::error::{KernelError, ProcessError};
use crate::process::{
    Priority, Process, ProcessId, ProcessState, ProcessTable, Program, StackChecksum,
    IDLE_PROCESS,
};
use crate::strategy::{self, SchedulingInfo, SchedulingStrategy};
use crate::sync::CriticalSection;

// ---------------------------------------------------------------------------
// Scheduler struct
// ---------------------------------------------------------------------------

/// The scheduler context: process table, scheduling state and the critical
/// section counter. On hardware a single instance lives in a static in
/// `kernel.rs`; tests build their own.
///
/// ## Design Notes
///
/// - Process identity is the slot index; `state == Unused` marks a free slot
/// - Slot 0 is reserved for the idle process, ordinary processes use 1..
/// - Exactly one slot is `Running` between ticks once started
pub struct Scheduler {
    processes: ProcessTable,
    current: ProcessId,
    strategy: SchedulingStrategy,
    info: SchedulingInfo,
    critical: CriticalSection,
    tick_count: u64,
}

impl Scheduler {
    /// An empty scheduler: every slot unused, Even strategy.
    pub const fn new() -> Self {
        Self {
            processes: [Process::EMPTY; MAX_NUMBER_OF_PROCESSES],
            current: IDLE_PROCESS,
            strategy: SchedulingStrategy::Even,
            info: SchedulingInfo::new(),
            critical: CriticalSection::new(),
            tick_count: 0,
        }
    }

    /// Reset the process table, start every autostart program and finally the
    /// idle process in slot 0.
    ///
    /// Registrations of [`idle`] itself are skipped. Programs that do not fit
    /// into the table are reported and dropped.
    pub fn init<P: Port + ?Sized>(&mut self, port: &P, autostart: &[Program]) {
        log::info!("[sched] initializing process table");

        for process in self.processes.iter_mut() {
            process.state = ProcessState::Unused;
        }
        self.current = IDLE_PROCESS;

        for &program in autostart {
            if core::ptr::fn_addr_eq(program, idle as Program) {
                continue;
            }
            if let Err(err) = self.exec(port, Some(program), DEFAULT_PRIORITY) {
                log::warn!("[sched] autostart program not started: {}", err);
            }
        }

        self.critical.enter(port);
        self.occupy(IDLE_PROCESS, idle, DEFAULT_PRIORITY);
        self.critical.leave(port);
    }

    /// Start `program` in the lowest free non-idle slot.
    ///
    /// # Returns
    /// - `Ok(pid)`: the slot of the new process, now Ready
    /// - `Err(ProcessError::NoProgram)`: `program` is `None`
    /// - `Err(ProcessError::TableFull)`: no free slot; nothing changed
    pub fn exec<P: Port + ?Sized>(
        &mut self,
        port: &P,
        program: Option<Program>,
        priority: Priority,
    ) -> Result<ProcessId, ProcessError> {
        self.critical.enter(port);
        let result = self.exec_locked(program, priority);
        self.critical.leave(port);
        result
    }

    fn exec_locked(
        &mut self,
        program: Option<Program>,
        priority: Priority,
    ) -> Result<ProcessId, ProcessError> {
        let program = program.ok_or(ProcessError::NoProgram)?;
        let pid = (1..MAX_NUMBER_OF_PROCESSES)
            .find(|&pid| self.processes[pid].is_unused())
            .ok_or(ProcessError::TableFull)?;

        self.occupy(pid, program, priority);
        Ok(pid)
    }

    /// Place a fresh process into `pid`, discarding whatever the previous
    /// occupant left in the slot and in the scheduling information.
    fn occupy(&mut self, pid: ProcessId, program: Program, priority: Priority) {
        self.processes[pid].init(program, priority);
        self.info.reset_process(pid);
        log::debug!("[sched] process {} created with priority {}", pid, priority);
    }

    /// Terminate process `pid` by freeing its slot. The change is picked up by
    /// the next tick; a terminated running process is not demoted to Ready.
    pub fn kill<P: Port + ?Sized>(&mut self, port: &P, pid: ProcessId) -> Result<(), ProcessError> {
        if pid == IDLE_PROCESS {
            return Err(ProcessError::IdleProcess);
        }
        if pid >= MAX_NUMBER_OF_PROCESSES {
            return Err(ProcessError::InvalidProcess(pid));
        }

        self.critical.enter(port);
        let result = if self.processes[pid].is_unused() {
            Err(ProcessError::InvalidProcess(pid))
        } else {
            self.processes[pid].state = ProcessState::Unused;
            log::debug!("[sched] process {} terminated", pid);
            Ok(())
        };
        self.critical.leave(port);
        result
    }

    /// Make the idle process the running one and return its stack pointer
    /// for the port to launch.
    pub fn start(&mut self) -> usize {
        log::info!("[sched] starting with strategy {:?}", self.strategy);
        self.current = IDLE_PROCESS;
        self.processes[IDLE_PROCESS].state = ProcessState::Running;
        self.processes[IDLE_PROCESS].stack_pointer
    }

    // -----------------------------------------------------------------------
    // Tick handler
    // -----------------------------------------------------------------------

    /// One scheduling decision. Called by the port's tick interrupt with the
    /// saved stack pointer of the running process; returns the stack pointer
    /// of the process to resume.
    ///
    /// Fatal if the outgoing stack pointer left its stack or the incoming
    /// stack changed while the process was suspended.
    pub fn tick<P: Port + ?Sized>(&mut self, port: &P, stack_pointer: usize) -> usize {
        self.tick_count += 1;

        self.suspend(port, stack_pointer);
        self.service(port);
        let next = self.decide();
        self.resume(port, next)
    }

    fn suspend<P: Port + ?Sized>(&mut self, port: &P, stack_pointer: usize) {
        let pid = self.current;
        let process = &mut self.processes[pid];
        if !process.stack.contains(stack_pointer) {
            port.fatal(KernelError::StackPointerOutOfRange { pid, stack_pointer });
        }

        process.stack_pointer = stack_pointer;
        process.checksum = process.stack.checksum();
    }

    fn service<P: Port + ?Sized>(&mut self, port: &P) {
        if port.poll_input() == MAINTENANCE_INPUT {
            port.wait_for_no_input();
            port.run_task_manager(self);
        }
    }

    fn decide(&mut self) -> ProcessId {
        let outgoing = &mut self.processes[self.current];
        if outgoing.state == ProcessState::Running {
            outgoing.state = ProcessState::Ready;
        }

        let next = strategy::select(self.strategy, &self.processes, self.current, &mut self.info);
        self.processes[next].state = ProcessState::Running;
        log::trace!("[sched] tick {}: {} -> {}", self.tick_count, self.current, next);
        self.current = next;
        next
    }

    fn resume<P: Port + ?Sized>(&self, port: &P, pid: ProcessId) -> usize {
        let process = &self.processes[pid];
        let found = process.stack.checksum();
        if found != process.checksum {
            port.fatal(KernelError::StackCorrupted {
                pid,
                expected: process.checksum,
                found,
            });
        }
        process.stack_pointer
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The PCB in slot `pid`, or `None` if `pid` is out of range.
    pub fn process_slot(&self, pid: ProcessId) -> Option<&Process> {
        self.processes.get(pid)
    }

    /// Mutable access to the PCB in slot `pid`. Callers must hold a critical
    /// section, or run inside the tick (task manager).
    pub fn process_slot_mut(&mut self, pid: ProcessId) -> Option<&mut Process> {
        self.processes.get_mut(pid)
    }

    /// Slot of the running process.
    pub fn current_proc(&self) -> ProcessId {
        self.current
    }

    pub fn scheduling_strategy(&self) -> SchedulingStrategy {
        self.strategy
    }

    /// Switch the active strategy and reset the state it depends on.
    /// Process states are not touched.
    pub fn set_scheduling_strategy<P: Port + ?Sized>(
        &mut self,
        port: &P,
        strategy: SchedulingStrategy,
    ) {
        self.critical.enter(port);
        self.strategy = strategy;
        let priority = self.processes[self.current].priority;
        self.info.reset_for(strategy, priority);
        self.critical.leave(port);
        log::debug!("[sched] strategy set to {:?}", strategy);
    }

    pub fn scheduling_info(&self) -> &SchedulingInfo {
        &self.info
    }

    /// Checksum of the stack region of slot `pid` as it is right now.
    pub fn stack_checksum(&self, pid: ProcessId) -> Option<StackChecksum> {
        self.processes.get(pid).map(|process| process.stack.checksum())
    }

    pub fn enter_critical_section<P: Port + ?Sized>(&mut self, port: &P) {
        self.critical.enter(port);
    }

    pub fn leave_critical_section<P: Port + ?Sized>(&mut self, port: &P) {
        self.critical.leave(port);
    }

    pub fn critical_section_depth(&self) -> u8 {
        self.critical.depth()
    }

    /// Number of ticks handled since boot.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// The idle program. Owns all processor time no other process wants.
pub extern "C" fn idle() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
