use log::debug;

use super::ProcessControlBlock;
use crate::hardware::{Cpu, Mmu};

/// Moves a process's saved execution context onto and off the simulated CPU.
pub struct Dispatcher;

impl Dispatcher {
    /// Installs the process: resets the translation unit, binds every
    /// resident page, and restores the program counter.
    pub fn load(&self, pcb: &ProcessControlBlock, cpu: &mut Cpu, mmu: &mut Mmu) {
        debug!("dispatcher load: {}", pcb);

        mmu.reset();
        for (page, frame) in pcb.page_table.iter().enumerate() {
            if let Some(frame) = frame {
                mmu.bind(page, *frame);
            }
        }

        cpu.set_pc(Some(pcb.program_counter));
    }

    /// Saves the program counter back into the process and parks the CPU on
    /// its idle sentinel.
    pub fn save(&self, pcb: &mut ProcessControlBlock, cpu: &mut Cpu) {
        debug!("dispatcher save: {}", pcb);

        match cpu.pc() {
            Some(pc) => pcb.program_counter = pc,
            None => panic!("dispatcher save with no process on cpu"),
        }
        cpu.set_pc(None);
    }
}
