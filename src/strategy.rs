//! # Scheduling Strategies
//!
//! The five interchangeable selection algorithms consulted by the tick
//! handler, and the auxiliary state some of them keep between ticks.
//!
//! Every strategy reads the whole process table and the previously running
//! slot and returns the slot to run next. They share one fallback: when no
//! process other than idle is ready, the idle slot is returned.
//!
//! | Strategy | Uses priority | Auxiliary state |
//! |----------|---------------|-----------------|
//! | Even | no | none |
//! | Random | no | generator state |
//! | Round-Robin | yes | `time_slice` |
//! | Inactive-Aging | yes | `age[pid]` |
//! | Run-to-Completion | no | none |

use crate::config::{MAX_NUMBER_OF_PROCESSES, RANDOM_SEED};
use crate::process::{Priority, ProcessId, ProcessTable, IDLE_PROCESS};

/// Accumulated wait credit of a process under Inactive-Aging.
pub type Age = u32;

/// The process-wide scheduling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulingStrategy {
    /// Uniform rotation over ready processes.
    #[default]
    Even,
    /// Uniform random choice among ready processes.
    Random,
    /// Highest priority first, holding the processor for `priority` ticks.
    RoundRobin,
    /// Oldest waiting process first; waiting ages by priority.
    InactiveAging,
    /// The running process keeps the processor until it stops being ready.
    RunToCompletion,
}

// ---------------------------------------------------------------------------
// Pseudo-random source
// ---------------------------------------------------------------------------

/// Marsaglia xorshift32 generator. Never yields 0 from a non-zero seed.
#[derive(Debug, Clone, Copy)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub const fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { RANDOM_SEED } else { seed },
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

// ---------------------------------------------------------------------------
// Scheduling information
// ---------------------------------------------------------------------------

/// Per-strategy memory carried between ticks.
#[derive(Debug, Clone)]
pub struct SchedulingInfo {
    /// Inactive-Aging wait credit, indexed by process id.
    pub age: [Age; MAX_NUMBER_OF_PROCESSES],
    /// Remaining Round-Robin ticks of the running process.
    pub time_slice: Priority,
    /// Random strategy generator.
    pub rng: XorShift32,
}

impl SchedulingInfo {
    pub const fn new() -> Self {
        Self {
            age: [0; MAX_NUMBER_OF_PROCESSES],
            time_slice: 0,
            rng: XorShift32::new(RANDOM_SEED),
        }
    }

    /// Reset the state `strategy` depends on when it becomes active.
    /// `current_priority` is the priority of the running process.
    pub fn reset_for(&mut self, strategy: SchedulingStrategy, current_priority: Priority) {
        match strategy {
            SchedulingStrategy::RoundRobin => self.time_slice = current_priority,
            SchedulingStrategy::InactiveAging => self.age = [0; MAX_NUMBER_OF_PROCESSES],
            _ => {}
        }
    }

    /// Forget everything a previous occupant of slot `pid` left behind.
    pub fn reset_process(&mut self, pid: ProcessId) {
        self.age[pid] = 0;
    }
}

impl Default for SchedulingInfo {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Run the selection algorithm of `strategy`.
pub fn select(
    strategy: SchedulingStrategy,
    processes: &ProcessTable,
    current: ProcessId,
    info: &mut SchedulingInfo,
) -> ProcessId {
    match strategy {
        SchedulingStrategy::Even => select_even(processes, current),
        SchedulingStrategy::Random => select_random(processes, &mut info.rng),
        SchedulingStrategy::RoundRobin => select_round_robin(processes, current, info),
        SchedulingStrategy::InactiveAging => select_inactive_aging(processes, &mut info.age),
        SchedulingStrategy::RunToCompletion => select_run_to_completion(processes, current),
    }
}

/// Ready processes other than idle, in ascending slot order.
fn ready_user_processes(processes: &ProcessTable) -> impl Iterator<Item = ProcessId> + '_ {
    processes
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, process)| process.is_ready())
        .map(|(pid, _)| pid)
}

/// Next ready non-idle slot after `current`, wrapping from the last slot back
/// to slot 1. `current` itself is the last candidate.
pub fn select_even(processes: &ProcessTable, current: ProcessId) -> ProcessId {
    const LAST: ProcessId = MAX_NUMBER_OF_PROCESSES - 1;

    let mut pid = if current == IDLE_PROCESS { LAST } else { current };
    for _ in 0..LAST {
        pid = if pid == LAST { 1 } else { pid + 1 };
        if processes[pid].is_ready() {
            return pid;
        }
    }
    IDLE_PROCESS
}

/// Uniform choice among ready non-idle slots.
pub fn select_random(processes: &ProcessTable, rng: &mut XorShift32) -> ProcessId {
    let mut candidates = [IDLE_PROCESS; MAX_NUMBER_OF_PROCESSES];
    let mut count = 0;
    for pid in ready_user_processes(processes) {
        candidates[count] = pid;
        count += 1;
    }

    if count == 0 {
        return IDLE_PROCESS;
    }
    candidates[rng.next_u32() as usize % count]
}

/// Keep a ready non-idle `current` while its time slice lasts; otherwise
/// pick the ready process with the highest priority (lowest slot on ties)
/// and give it `priority` ticks, counting this one.
pub fn select_round_robin(
    processes: &ProcessTable,
    current: ProcessId,
    info: &mut SchedulingInfo,
) -> ProcessId {
    if current != IDLE_PROCESS && processes[current].is_ready() && info.time_slice > 0 {
        info.time_slice -= 1;
        return current;
    }

    let mut best: Option<ProcessId> = None;
    for pid in ready_user_processes(processes) {
        match best {
            Some(b) if processes[pid].priority <= processes[b].priority => {}
            _ => best = Some(pid),
        }
    }

    match best {
        Some(pid) => {
            info.time_slice = processes[pid].priority.saturating_sub(1);
            pid
        }
        None => {
            info.time_slice = 0;
            IDLE_PROCESS
        }
    }
}

/// Age every ready process by its priority, then pick the oldest; ties go
/// to the higher priority, then to the lower slot. The winner's age is
/// reset.
pub fn select_inactive_aging(
    processes: &ProcessTable,
    age: &mut [Age; MAX_NUMBER_OF_PROCESSES],
) -> ProcessId {
    for pid in ready_user_processes(processes) {
        age[pid] = age[pid].saturating_add(Age::from(processes[pid].priority));
    }

    let mut best: Option<ProcessId> = None;
    for pid in ready_user_processes(processes) {
        let better = match best {
            None => true,
            Some(b) => {
                age[pid] > age[b]
                    || (age[pid] == age[b] && processes[pid].priority > processes[b].priority)
            }
        };
        if better {
            best = Some(pid);
        }
    }

    match best {
        Some(pid) => {
            age[pid] = 0;
            pid
        }
        None => IDLE_PROCESS,
    }
}

/// Keep a ready non-idle `current`; otherwise continue like Even.
pub fn select_run_to_completion(processes: &ProcessTable, current: ProcessId) -> ProcessId {
    if current != IDLE_PROCESS && processes[current].is_ready() {
        return current;
    }
    select_even(processes, current)
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Process, ProcessState};

    const ALL: [SchedulingStrategy; 5] = [
        SchedulingStrategy::Even,
        SchedulingStrategy::Random,
        SchedulingStrategy::RoundRobin,
        SchedulingStrategy::InactiveAging,
        SchedulingStrategy::RunToCompletion,
    ];

    /// Table with idle ready in slot 0 and the given `(pid, priority)` pairs
    /// ready. States are set directly; stacks are left untouched.
    fn make_table(ready: &[(ProcessId, Priority)]) -> Box<ProcessTable> {
        let mut table: Box<ProcessTable> = Box::new([Process::EMPTY; MAX_NUMBER_OF_PROCESSES]);
        table[IDLE_PROCESS].state = ProcessState::Ready;
        for &(pid, priority) in ready {
            table[pid].state = ProcessState::Ready;
            table[pid].priority = priority;
        }
        table
    }

    #[test]
    fn test_idle_only_falls_back_to_idle() {
        let table = make_table(&[]);
        for strategy in ALL {
            let mut info = SchedulingInfo::new();
            info.reset_for(strategy, 5);
            assert_eq!(select(strategy, &table, 0, &mut info), IDLE_PROCESS);
        }
    }

    #[test]
    fn test_blocked_processes_are_never_selected() {
        let mut table = make_table(&[(2, 9)]);
        table[2].state = ProcessState::Blocked;
        table[4].state = ProcessState::Running;
        for strategy in ALL {
            let mut info = SchedulingInfo::new();
            assert_eq!(select(strategy, &table, 4, &mut info), IDLE_PROCESS);
        }
    }

    #[test]
    fn test_even_visits_each_slot_once_in_wraparound_order() {
        let table = make_table(&[(1, 0), (2, 0), (3, 0), (4, 0), (5, 0), (6, 0), (7, 0)]);
        let mut current = 5;
        let mut order = Vec::new();
        for _ in 0..7 {
            current = select_even(&table, current);
            order.push(current);
        }
        assert_eq!(order, [6, 7, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_even_skips_idle_and_gaps() {
        let table = make_table(&[(2, 0), (6, 0)]);
        assert_eq!(select_even(&table, 0), 2);
        assert_eq!(select_even(&table, 2), 6);
        assert_eq!(select_even(&table, 6), 2);
        // Only current ready: it is picked again
        let table = make_table(&[(3, 0)]);
        assert_eq!(select_even(&table, 3), 3);
    }

    #[test]
    fn test_even_ignores_priority() {
        let table = make_table(&[(1, 200), (3, 1)]);
        assert_eq!(select_even(&table, 1), 3);
    }

    #[test]
    fn test_random_picks_only_ready_user_processes() {
        let table = make_table(&[(1, 0), (4, 0), (7, 0)]);
        let mut rng = XorShift32::new(7);
        let mut seen = [false; MAX_NUMBER_OF_PROCESSES];
        for _ in 0..500 {
            let pid = select_random(&table, &mut rng);
            assert!(matches!(pid, 1 | 4 | 7));
            seen[pid] = true;
        }
        assert!(seen[1] && seen[4] && seen[7]);
    }

    #[test]
    fn test_xorshift_never_sticks_at_zero() {
        let mut rng = XorShift32::new(0);
        for _ in 0..1000 {
            assert_ne!(rng.next_u32(), 0);
        }
    }

    #[test]
    fn test_round_robin_keeps_current_for_its_slice() {
        let table = make_table(&[(2, 50), (5, 90)]);
        let mut info = SchedulingInfo::new();
        info.time_slice = 3;

        for expected in [2, 1, 0] {
            assert_eq!(select_round_robin(&table, 2, &mut info), 2);
            assert_eq!(info.time_slice, expected);
        }
        // Slice exhausted: reselect by priority
        assert_eq!(select_round_robin(&table, 2, &mut info), 5);
        assert_eq!(info.time_slice, 89);
    }

    #[test]
    fn test_round_robin_ties_go_to_lowest_slot() {
        let table = make_table(&[(3, 40), (1, 40), (6, 40)]);
        let mut info = SchedulingInfo::new();
        assert_eq!(select_round_robin(&table, 0, &mut info), 1);
    }

    #[test]
    fn test_round_robin_priority_zero_can_win() {
        let table = make_table(&[(4, 0)]);
        let mut info = SchedulingInfo::new();
        assert_eq!(select_round_robin(&table, 0, &mut info), 4);
        assert_eq!(info.time_slice, 0);
        // Zero slice: reselected every tick
        assert_eq!(select_round_robin(&table, 4, &mut info), 4);
    }

    #[test]
    fn test_round_robin_idle_does_not_keep_processor() {
        let table = make_table(&[(3, 10)]);
        let mut info = SchedulingInfo::new();
        info.reset_for(SchedulingStrategy::RoundRobin, 5);
        assert_eq!(select_round_robin(&table, IDLE_PROCESS, &mut info), 3);
    }

    #[test]
    fn test_inactive_aging_prefers_oldest() {
        let table = make_table(&[(1, 10), (2, 30)]);
        let mut age = [0; MAX_NUMBER_OF_PROCESSES];
        age[1] = 25;

        // Ages become 35 and 30
        assert_eq!(select_inactive_aging(&table, &mut age), 1);
        assert_eq!(age[1], 0);
        assert_eq!(age[2], 30);
    }

    #[test]
    fn test_inactive_aging_tie_breaks() {
        // Equal age: higher priority wins
        let table = make_table(&[(1, 10), (2, 20)]);
        let mut age = [0; MAX_NUMBER_OF_PROCESSES];
        age[1] = 10;
        assert_eq!(select_inactive_aging(&table, &mut age), 2);

        // Equal age and priority: lower slot wins
        let table = make_table(&[(3, 15), (6, 15)]);
        let mut age = [0; MAX_NUMBER_OF_PROCESSES];
        assert_eq!(select_inactive_aging(&table, &mut age), 3);
        assert_eq!(age[6], 15);
    }

    #[test]
    fn test_inactive_aging_is_starvation_free() {
        let table = make_table(&[(1, 10), (2, 50), (3, 90)]);
        let mut age = [0; MAX_NUMBER_OF_PROCESSES];

        let mut last_age = 0;
        let mut waited = 0;
        loop {
            let pid = select_inactive_aging(&table, &mut age);
            if pid == 1 {
                break;
            }
            assert!(age[1] >= last_age);
            last_age = age[1];
            waited += 1;
            assert!(waited < 20, "low priority process starved");
        }
    }

    #[test]
    fn test_inactive_aging_skips_idle() {
        let table = make_table(&[]);
        let mut age = [0; MAX_NUMBER_OF_PROCESSES];
        assert_eq!(select_inactive_aging(&table, &mut age), IDLE_PROCESS);
        assert_eq!(age[IDLE_PROCESS], 0);
    }

    #[test]
    fn test_run_to_completion() {
        let mut table = make_table(&[(2, 0), (5, 0)]);
        assert_eq!(select_run_to_completion(&table, 5), 5);

        table[5].state = ProcessState::Blocked;
        assert_eq!(select_run_to_completion(&table, 5), 2);
        assert_eq!(select_run_to_completion(&table, IDLE_PROCESS), 2);
    }

    #[test]
    fn test_strategy_reset() {
        let mut info = SchedulingInfo::new();
        info.age = [7; MAX_NUMBER_OF_PROCESSES];

        info.reset_for(SchedulingStrategy::RoundRobin, 33);
        assert_eq!(info.time_slice, 33);
        assert_eq!(info.age[3], 7);

        info.reset_for(SchedulingStrategy::InactiveAging, 33);
        assert_eq!(info.age, [0; MAX_NUMBER_OF_PROCESSES]);

        info.age[4] = 9;
        info.reset_process(4);
        assert_eq!(info.age[4], 0);
    }
}
