use super::{Memory, Mmu, Page};
use crate::io::Instruction;

/// Outcome of one fetch-execute cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuStep {
    /// No process is loaded.
    Idle,
    /// The referenced page is not resident; the program counter is left
    /// untouched so the fetch retries after the page is loaded.
    Fault(Page),
    /// The instruction was fetched and the program counter advanced.
    Executed(Instruction),
}

/// The simulated processor: a program counter and one instruction per tick.
/// `None` is the idle sentinel installed whenever no process is loaded.
pub struct Cpu {
    pc: Option<usize>,
}

impl Cpu {
    pub fn new() -> Cpu {
        Cpu { pc: None }
    }

    pub fn pc(&self) -> Option<usize> {
        self.pc
    }

    pub fn set_pc(&mut self, pc: Option<usize>) {
        self.pc = pc;
    }

    pub fn step(&mut self, mmu: &mut Mmu, memory: &Memory) -> CpuStep {
        let Some(pc) = self.pc else {
            return CpuStep::Idle;
        };

        match mmu.translate(pc) {
            Ok(address) => {
                let instruction = memory.read(address);
                self.pc = Some(pc + 1);
                CpuStep::Executed(instruction)
            }
            Err(page) => CpuStep::Fault(page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded_machine() -> (Cpu, Mmu, Memory) {
        let mut cpu = Cpu::new();
        let mut mmu = Mmu::new();
        let mut memory = Memory::new(8);

        mmu.set_frame_size(4);
        mmu.bind(0, 1);
        memory.write(4, Instruction::Cpu);
        memory.write(5, Instruction::Exit);
        cpu.set_pc(Some(0));

        (cpu, mmu, memory)
    }

    #[test]
    fn test_cpu_idle_without_process() {
        let mut cpu = Cpu::new();
        let mut mmu = Mmu::new();
        let memory = Memory::new(4);

        assert_eq!(cpu.step(&mut mmu, &memory), CpuStep::Idle);
    }

    #[test]
    fn test_cpu_executes_and_advances() {
        let (mut cpu, mut mmu, memory) = loaded_machine();

        assert_eq!(cpu.step(&mut mmu, &memory), CpuStep::Executed(Instruction::Cpu));
        assert_eq!(cpu.pc(), Some(1));
        assert_eq!(
            cpu.step(&mut mmu, &memory),
            CpuStep::Executed(Instruction::Exit)
        );
        assert_eq!(cpu.pc(), Some(2));
    }

    #[test]
    fn test_cpu_fault_leaves_pc_untouched() {
        let (mut cpu, mut mmu, memory) = loaded_machine();
        cpu.set_pc(Some(4));

        assert_eq!(cpu.step(&mut mmu, &memory), CpuStep::Fault(1));
        assert_eq!(cpu.pc(), Some(4));
    }
}
