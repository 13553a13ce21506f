use std::collections::VecDeque;

use log::info;

use super::{Pid, ProcessControlBlock, ProcessState};
use crate::hardware::Tick;

pub const PRIORITY_LEVELS: usize = 5;
pub const ROUND_ROBIN_QUANTUM: u32 = 3;

const AGING_TICKS: Tick = 3;

/// Scheduling policy selected at kernel construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPolicy {
    FirstComeFirstServed,
    Priority,
    PriorityPreemptive,
    RoundRobin,
}

pub struct AgingEntry {
    pid: Pid,
    enqueued_at: Tick,
}

/// The ready queue and the run-order policy over it. One variant per policy;
/// all of them hand out entries of a given queue in strict arrival order.
pub enum Scheduler {
    FirstComeFirstServed {
        ready: VecDeque<Pid>,
    },
    /// Five level queues, 0 highest .. 4 lowest. Entries record the tick they
    /// were enqueued at so starving ones can be promoted.
    Priority {
        levels: [VecDeque<AgingEntry>; PRIORITY_LEVELS],
        preemptive: bool,
        queued: usize,
    },
    RoundRobin {
        ready: VecDeque<Pid>,
    },
}

impl Scheduler {
    pub fn new(policy: SchedulerPolicy) -> Scheduler {
        match policy {
            SchedulerPolicy::FirstComeFirstServed => Scheduler::FirstComeFirstServed {
                ready: VecDeque::new(),
            },
            SchedulerPolicy::Priority => Scheduler::Priority {
                levels: Default::default(),
                preemptive: false,
                queued: 0,
            },
            SchedulerPolicy::PriorityPreemptive => Scheduler::Priority {
                levels: Default::default(),
                preemptive: true,
                queued: 0,
            },
            SchedulerPolicy::RoundRobin => Scheduler::RoundRobin {
                ready: VecDeque::new(),
            },
        }
    }

    /// The time slice this policy wants the hardware timer configured with.
    pub fn quantum(&self) -> Option<u32> {
        match self {
            Scheduler::RoundRobin { .. } => Some(ROUND_ROBIN_QUANTUM),
            _ => None,
        }
    }

    /// Marks the process ready and enqueues it behind its peers.
    pub fn add(&mut self, pcb: &mut ProcessControlBlock, now: Tick) {
        pcb.state = ProcessState::Ready;

        match self {
            Scheduler::FirstComeFirstServed { ready } | Scheduler::RoundRobin { ready } => {
                ready.push_back(pcb.pid());
            }
            Scheduler::Priority { levels, queued, .. } => {
                levels[pcb.priority() as usize].push_back(AgingEntry {
                    pid: pcb.pid(),
                    enqueued_at: now,
                });
                *queued += 1;
            }
        }
    }

    /// Removes and returns the process that should run next.
    pub fn next(&mut self) -> Option<Pid> {
        match self {
            Scheduler::FirstComeFirstServed { ready } | Scheduler::RoundRobin { ready } => {
                ready.pop_front()
            }
            Scheduler::Priority { levels, queued, .. } => {
                for level in levels.iter_mut() {
                    if let Some(entry) = level.pop_front() {
                        *queued -= 1;
                        return Some(entry.pid);
                    }
                }
                None
            }
        }
    }

    pub fn has_next(&self) -> bool {
        match self {
            Scheduler::FirstComeFirstServed { ready } | Scheduler::RoundRobin { ready } => {
                !ready.is_empty()
            }
            Scheduler::Priority { queued, .. } => *queued != 0,
        }
    }

    /// Whether an arriving process should push the running one off the CPU.
    pub fn must_expropriate(
        &self,
        running: &ProcessControlBlock,
        arriving: &ProcessControlBlock,
    ) -> bool {
        match self {
            Scheduler::Priority {
                preemptive: true, ..
            } => arriving.priority() < running.priority(),
            _ => false,
        }
    }

    /// Clock-tick hook. Priority variants promote every entry that has waited
    /// at least `AGING_TICKS` at its current level one level up, resetting
    /// its enqueue tick to the promotion tick.
    pub fn tick(&mut self, now: Tick) {
        let Scheduler::Priority { levels, .. } = self else {
            return;
        };

        for level in 1..PRIORITY_LEVELS {
            while let Some(entry) = levels[level].front() {
                if now - entry.enqueued_at < AGING_TICKS {
                    break;
                }
                let pid = entry.pid;
                levels[level].pop_front();
                info!("new priority {} for pid {}", level - 1, pid);
                levels[level - 1].push_back(AgingEntry {
                    pid,
                    enqueued_at: now,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcb(pid: Pid, priority: u8) -> ProcessControlBlock {
        ProcessControlBlock::new(pid, "prg.exe", priority, 1)
    }

    fn drain(scheduler: &mut Scheduler) -> Vec<Pid> {
        let mut order = Vec::new();
        while let Some(pid) = scheduler.next() {
            order.push(pid);
        }
        order
    }

    #[test]
    fn test_fcfs_dequeues_in_arrival_order() {
        let mut scheduler = Scheduler::new(SchedulerPolicy::FirstComeFirstServed);

        for pid in [3, 1, 2] {
            scheduler.add(&mut pcb(pid, 0), 0);
        }

        assert_eq!(drain(&mut scheduler), vec![3, 1, 2]);
        assert!(!scheduler.has_next());
    }

    #[test]
    fn test_add_marks_process_ready() {
        let mut scheduler = Scheduler::new(SchedulerPolicy::FirstComeFirstServed);
        let mut process = pcb(0, 0);

        scheduler.add(&mut process, 0);

        assert_eq!(process.state, ProcessState::Ready);
    }

    #[test]
    fn test_has_next_false_only_when_empty() {
        let mut scheduler = Scheduler::new(SchedulerPolicy::Priority);
        assert!(!scheduler.has_next());

        scheduler.add(&mut pcb(0, 4), 0);
        assert!(scheduler.has_next());

        scheduler.next().unwrap();
        assert!(!scheduler.has_next());
        assert_eq!(scheduler.next(), None);
    }

    #[test]
    fn test_priority_dequeues_best_level_first() {
        let mut scheduler = Scheduler::new(SchedulerPolicy::Priority);

        scheduler.add(&mut pcb(0, 3), 0);
        scheduler.add(&mut pcb(1, 4), 0);
        scheduler.add(&mut pcb(2, 1), 0);

        assert_eq!(drain(&mut scheduler), vec![2, 0, 1]);
    }

    #[test]
    fn test_priority_same_level_keeps_arrival_order() {
        let mut scheduler = Scheduler::new(SchedulerPolicy::Priority);

        scheduler.add(&mut pcb(5, 2), 0);
        scheduler.add(&mut pcb(6, 2), 0);
        scheduler.add(&mut pcb(7, 2), 0);

        assert_eq!(drain(&mut scheduler), vec![5, 6, 7]);
    }

    #[test]
    fn test_priority_aging_promotes_after_threshold() {
        let mut scheduler = Scheduler::new(SchedulerPolicy::Priority);
        scheduler.add(&mut pcb(0, 3), 1);

        scheduler.tick(2);
        scheduler.tick(3);

        // Still at level 3: a better-priority late arrival would win.
        scheduler.add(&mut pcb(1, 2), 3);
        scheduler.tick(4);

        // Waited 3 ticks: promoted to level 2 behind pid 1.
        assert_eq!(drain(&mut scheduler), vec![1, 0]);
    }

    #[test]
    fn test_priority_aging_resets_enqueue_tick() {
        let mut scheduler = Scheduler::new(SchedulerPolicy::Priority);
        scheduler.add(&mut pcb(0, 2), 0);

        scheduler.tick(3);
        // Promoted at tick 3; the next promotion needs 3 more ticks.
        scheduler.tick(5);

        let Scheduler::Priority { levels, .. } = &scheduler else {
            unreachable!();
        };
        assert_eq!(levels[1].len(), 1);
        assert_eq!(levels[1].front().unwrap().enqueued_at, 3);

        scheduler.tick(6);
        let Scheduler::Priority { levels, .. } = &scheduler else {
            unreachable!();
        };
        assert_eq!(levels[0].len(), 1);
    }

    #[test]
    fn test_priority_aging_bottoms_at_level_zero() {
        let mut scheduler = Scheduler::new(SchedulerPolicy::Priority);
        scheduler.add(&mut pcb(0, 1), 0);

        scheduler.tick(3);
        scheduler.tick(6);
        scheduler.tick(9);

        let Scheduler::Priority { levels, .. } = &scheduler else {
            unreachable!();
        };
        assert_eq!(levels[0].len(), 1);
    }

    #[test]
    fn test_priority_never_expropriates() {
        let scheduler = Scheduler::new(SchedulerPolicy::Priority);

        assert!(!scheduler.must_expropriate(&pcb(0, 3), &pcb(1, 1)));
    }

    #[test]
    fn test_priority_preemptive_expropriates_for_better_priority() {
        let scheduler = Scheduler::new(SchedulerPolicy::PriorityPreemptive);

        assert!(scheduler.must_expropriate(&pcb(0, 3), &pcb(1, 1)));
        assert!(!scheduler.must_expropriate(&pcb(0, 1), &pcb(1, 3)));
        assert!(!scheduler.must_expropriate(&pcb(0, 2), &pcb(1, 2)));
    }

    #[test]
    fn test_round_robin_reports_its_quantum() {
        let scheduler = Scheduler::new(SchedulerPolicy::RoundRobin);

        assert_eq!(scheduler.quantum(), Some(ROUND_ROBIN_QUANTUM));
        assert_eq!(
            Scheduler::new(SchedulerPolicy::FirstComeFirstServed).quantum(),
            None
        );
    }

    #[test]
    fn test_round_robin_never_expropriates_on_arrival() {
        let scheduler = Scheduler::new(SchedulerPolicy::RoundRobin);

        assert!(!scheduler.must_expropriate(&pcb(0, 4), &pcb(1, 0)));
    }
}
