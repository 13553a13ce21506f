use std::collections::BTreeMap;
use std::fmt;

use crate::hardware::Frame;

pub type Pid = u32;

/// Process queue status. Exactly one process is `Running` system-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    New,
    Ready,
    Running,
    Waiting,
    Terminated,
}

/// The process control block. Holds one program's execution state, including
/// its page table: one slot per page, `None` while the page is not resident.
pub struct ProcessControlBlock {
    pid: Pid,
    pub program_counter: usize,
    priority: u8,
    pub state: ProcessState,
    path: String,
    pub page_table: Vec<Option<Frame>>,
}

impl ProcessControlBlock {
    pub fn new(pid: Pid, path: &str, priority: u8, page_count: usize) -> ProcessControlBlock {
        ProcessControlBlock {
            pid,
            program_counter: 0,
            priority,
            state: ProcessState::New,
            path: path.to_string(),
            page_table: vec![None; page_count],
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn resident_frame_count(&self) -> usize {
        self.page_table.iter().flatten().count()
    }

    /// Empties any page-table slot mapped to the given frame. Called when the
    /// frame is evicted; a later fault reloads the page.
    pub fn clear_frame(&mut self, frame: Frame) {
        for slot in &mut self.page_table {
            if *slot == Some(frame) {
                *slot = None;
            }
        }
    }

    /// Empties the whole page table and returns the frames it held.
    pub fn take_resident_frames(&mut self) -> Vec<Frame> {
        let frames = self.page_table.iter().flatten().copied().collect();
        for slot in &mut self.page_table {
            *slot = None;
        }
        frames
    }
}

impl fmt::Display for ProcessControlBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PCB(pid={}, state={:?}, pc={}, path={})",
            self.pid, self.state, self.program_counter, self.path
        )
    }
}

/// Owns every process control block and the identity of the running one.
pub struct ProcessTable {
    pcbs: BTreeMap<Pid, ProcessControlBlock>,
    next_pid: Pid,
    running: Option<Pid>,
}

impl ProcessTable {
    pub fn new() -> ProcessTable {
        ProcessTable {
            pcbs: BTreeMap::new(),
            next_pid: 0,
            running: None,
        }
    }

    /// Hands out strictly increasing pids; a pid is never reused.
    pub fn allocate_pid(&mut self) -> Pid {
        let pid = self.next_pid;
        self.next_pid += 1;
        pid
    }

    pub fn add(&mut self, pcb: ProcessControlBlock) {
        self.pcbs.insert(pcb.pid(), pcb);
    }

    pub fn get(&self, pid: Pid) -> &ProcessControlBlock {
        match self.pcbs.get(&pid) {
            Some(pcb) => pcb,
            None => panic!("no process found for pid {}", pid),
        }
    }

    pub fn get_mut(&mut self, pid: Pid) -> &mut ProcessControlBlock {
        match self.pcbs.get_mut(&pid) {
            Some(pcb) => pcb,
            None => panic!("no process found for pid {}", pid),
        }
    }

    pub fn running(&self) -> Option<Pid> {
        self.running
    }

    pub fn set_running(&mut self, pid: Option<Pid>) {
        self.running = pid;
    }

    /// All PCBs in pid order.
    pub fn pcbs(&self) -> impl Iterator<Item = &ProcessControlBlock> {
        self.pcbs.values()
    }

    pub fn len(&self) -> usize {
        self.pcbs.len()
    }

    pub fn all_terminated(&self) -> bool {
        self.pcbs
            .values()
            .all(|pcb| pcb.state == ProcessState::Terminated)
    }
}
