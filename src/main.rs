//! # SlotOS Example Firmware
//!
//! Three counting processes with different priorities under the
//! Round-Robin strategy:
//!
//! | Process | Priority | Behavior |
//! |---------|----------|----------|
//! | `background_task` | 10 | Counts without ever yielding |
//! | `sampling_task` | 50 | Counts, publishing totals inside a critical section |
//! | `control_task` | 90 | Counts without ever yielding |
//!
//! Round-Robin hands the processor to the highest-priority ready process for
//! `priority` ticks at a time, so `control_task` dominates. Switching to
//! Inactive-Aging (see `main`) shares the processor in proportion to
//! priority instead.
//!
//! On a hosted target the same processes are scheduled against the
//! simulated port and the share of ticks per process is printed for every
//! strategy.

#![cfg_attr(all(target_arch = "arm", target_os = "none"), no_std)]
#![cfg_attr(all(target_arch = "arm", target_os = "none"), no_main)]

use core::sync::atomic::{AtomicU32, Ordering};

static COUNTERS: [AtomicU32; 3] = [AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)];
static PUBLISHED: AtomicU32 = AtomicU32::new(0);

// ---------------------------------------------------------------------------
// Process entry points
// ---------------------------------------------------------------------------

extern "C" fn background_task() -> ! {
    loop {
        COUNTERS[0].fetch_add(1, Ordering::Relaxed);
    }
}

extern "C" fn sampling_task() -> ! {
    loop {
        let n = COUNTERS[1].fetch_add(1, Ordering::Relaxed);
        if n % 1024 == 0 {
            publish();
        }
    }
}

extern "C" fn control_task() -> ! {
    loop {
        COUNTERS[2].fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot the counters without being preempted halfway.
#[cfg(all(target_arch = "arm", target_os = "none"))]
fn publish() {
    slotos::kernel::enter_critical_section();
    let total = COUNTERS.iter().map(|c| c.load(Ordering::Relaxed)).fold(0u32, u32::wrapping_add);
    PUBLISHED.store(total, Ordering::Relaxed);
    slotos::kernel::leave_critical_section();
}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
fn publish() {
    let total = COUNTERS.iter().map(|c| c.load(Ordering::Relaxed)).fold(0u32, u32::wrapping_add);
    PUBLISHED.store(total, Ordering::Relaxed);
}

// ---------------------------------------------------------------------------
// Firmware entry point
// ---------------------------------------------------------------------------

#[cfg(all(target_arch = "arm", target_os = "none"))]
mod firmware {
    use cortex_m_rt::entry;
    use panic_halt as _;

    use slotos::kernel;
    use slotos::strategy::SchedulingStrategy;

    /// Initializes the kernel with no autostart programs, starts the three
    /// processes and launches the scheduler. Does not return.
    #[entry]
    fn main() -> ! {
        let cp = match cortex_m::Peripherals::take() {
            Some(cp) => cp,
            None => loop {
                cortex_m::asm::wfi();
            },
        };

        kernel::init(&[]);

        for (program, priority) in [
            (super::background_task as slotos::process::Program, 10),
            (super::sampling_task, 50),
            (super::control_task, 90),
        ] {
            if kernel::exec(Some(program), priority).is_err() {
                log::warn!("[main] process table full");
            }
        }

        kernel::set_scheduling_strategy(SchedulingStrategy::RoundRobin);

        // Start the scheduler, does not return
        kernel::start(cp)
    }
}

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
fn main() {
    use slotos::arch::sim::SimPort;
    use slotos::config::MAX_NUMBER_OF_PROCESSES;
    use slotos::process::Program;
    use slotos::scheduler::Scheduler;
    use slotos::strategy::SchedulingStrategy;

    const TICKS: u32 = 1000;

    let processes: [(Program, u8); 3] = [
        (background_task, 10),
        (sampling_task, 50),
        (control_task, 90),
    ];

    for strategy in [
        SchedulingStrategy::Even,
        SchedulingStrategy::Random,
        SchedulingStrategy::RoundRobin,
        SchedulingStrategy::InactiveAging,
        SchedulingStrategy::RunToCompletion,
    ] {
        let port = SimPort::new();
        let mut scheduler = Box::new(Scheduler::new());
        scheduler.init(&port, &[]);
        for (program, priority) in processes {
            if let Err(err) = scheduler.exec(&port, Some(program), priority) {
                eprintln!("exec failed: {}", err);
            }
        }
        scheduler.set_scheduling_strategy(&port, strategy);
        let mut stack_pointer = scheduler.start();

        let mut served = [0u32; MAX_NUMBER_OF_PROCESSES];
        for _ in 0..TICKS {
            stack_pointer = scheduler.tick(&port, stack_pointer);
            served[scheduler.current_proc()] += 1;
        }

        println!("{:<16} {:?}", format!("{:?}", strategy), &served[..4]);
    }
}
