use std::collections::{HashMap, VecDeque};

use log::debug;

use super::{KernelError, Pid, ProcessTable};
use crate::hardware::{Frame, Mmu};

/// Victim-selection policy chosen at kernel construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VictimPolicy {
    Fifo,
    Lru,
    Clock,
}

struct ClockFrame {
    referenced: bool,
    owner: Option<Pid>,
}

/// Bookkeeping of which frame holds which process's page, one variant per
/// replacement policy.
enum VictimAlgorithm {
    /// Resident frames in allocation order; the oldest one is evicted.
    Fifo { resident: VecDeque<(Frame, Pid)> },
    /// Owner map only; the victim is whatever frame the translation unit
    /// reports as least recently used.
    Lru { owners: HashMap<Frame, Pid> },
    /// Reference bit per frame plus a circular hand. The sweep clears set
    /// bits and evicts the first frame whose bit is already clear.
    Clock { frames: Vec<ClockFrame>, hand: usize },
}

/// Owns the free-frame pool and reclaims frames through the configured
/// victim algorithm when the pool runs dry.
pub struct MemoryManager {
    free_frames: VecDeque<Frame>,
    algorithm: VictimAlgorithm,
    frame_count: usize,
}

impl MemoryManager {
    pub fn new(policy: VictimPolicy, frame_count: usize) -> MemoryManager {
        let algorithm = match policy {
            VictimPolicy::Fifo => VictimAlgorithm::Fifo {
                resident: VecDeque::new(),
            },
            VictimPolicy::Lru => VictimAlgorithm::Lru {
                owners: HashMap::new(),
            },
            VictimPolicy::Clock => VictimAlgorithm::Clock {
                frames: (0..frame_count)
                    .map(|_| ClockFrame {
                        referenced: false,
                        owner: None,
                    })
                    .collect(),
                hand: 0,
            },
        };

        MemoryManager {
            free_frames: (0..frame_count).collect(),
            algorithm,
            frame_count,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn free_frame_count(&self) -> usize {
        self.free_frames.len()
    }

    /// Hands out a frame for a page of `owner`, evicting a resident page if
    /// the free pool is empty. The evicted page's slot is emptied on its
    /// owning PCB before the frame is reused; when the victim belongs to the
    /// running process itself, its translation-unit binding is dropped too,
    /// so the next access faults and reloads it.
    pub fn allocate_frame(
        &mut self,
        owner: Pid,
        table: &mut ProcessTable,
        mmu: &mut Mmu,
    ) -> Result<Frame, KernelError> {
        self.refresh_reference_bits(mmu);

        let frame = match self.free_frames.pop_front() {
            Some(frame) => frame,
            None => self.evict(owner, table, mmu)?,
        };

        self.record(frame, owner);
        Ok(frame)
    }

    /// Returns a frame to the pool, invalidating its bookkeeping.
    pub fn release_frame(&mut self, frame: Frame, mmu: &mut Mmu) {
        self.refresh_reference_bits(mmu);

        match &mut self.algorithm {
            VictimAlgorithm::Fifo { resident } => {
                resident.retain(|(resident_frame, _)| *resident_frame != frame);
            }
            VictimAlgorithm::Lru { owners } => {
                owners.remove(&frame);
            }
            VictimAlgorithm::Clock { frames, .. } => {
                frames[frame] = ClockFrame {
                    referenced: true,
                    owner: None,
                };
            }
        }

        self.free_frames.push_back(frame);
    }

    fn evict(
        &mut self,
        running: Pid,
        table: &mut ProcessTable,
        mmu: &mut Mmu,
    ) -> Result<Frame, KernelError> {
        let (frame, victim) = match &mut self.algorithm {
            VictimAlgorithm::Fifo { resident } => {
                resident.pop_front().ok_or(KernelError::OutOfMemory)?
            }
            VictimAlgorithm::Lru { owners } => {
                let frame = mmu.least_recently_used().ok_or(KernelError::OutOfMemory)?;
                let victim = match owners.remove(&frame) {
                    Some(pid) => pid,
                    None => panic!("lru victim frame {} has no owner", frame),
                };
                (frame, victim)
            }
            VictimAlgorithm::Clock { frames, hand } => {
                if frames.iter().all(|f| f.owner.is_none()) {
                    return Err(KernelError::OutOfMemory);
                }

                loop {
                    let slot = &mut frames[*hand];
                    match slot.owner {
                        Some(pid) if !slot.referenced => {
                            let frame = *hand;
                            slot.owner = None;
                            *hand = (*hand + 1) % frames.len();
                            break (frame, pid);
                        }
                        Some(_) => {
                            slot.referenced = false;
                            *hand = (*hand + 1) % frames.len();
                        }
                        None => {
                            *hand = (*hand + 1) % frames.len();
                        }
                    }
                }
            }
        };

        debug!("evicting frame {} from pid {}", frame, victim);
        table.get_mut(victim).clear_frame(frame);
        if victim == running {
            mmu.unbind_frame(frame);
        }

        Ok(frame)
    }

    fn record(&mut self, frame: Frame, owner: Pid) {
        match &mut self.algorithm {
            VictimAlgorithm::Fifo { resident } => resident.push_back((frame, owner)),
            VictimAlgorithm::Lru { owners } => {
                owners.insert(frame, owner);
            }
            VictimAlgorithm::Clock { frames, .. } => {
                frames[frame] = ClockFrame {
                    referenced: true,
                    owner: Some(owner),
                };
            }
        }
    }

    fn refresh_reference_bits(&mut self, mmu: &mut Mmu) {
        let VictimAlgorithm::Clock { frames, .. } = &mut self.algorithm else {
            return;
        };

        for frame in mmu.drain_recent_uses() {
            frames[frame].referenced = true;
        }
    }
}
