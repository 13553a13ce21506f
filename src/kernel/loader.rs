use log::debug;

use crate::hardware::{Frame, Memory, Page};
use crate::io::Instruction;

/// Copies one page of a program into a physical frame on demand. A partial
/// last page is legal; the copy is bounded by the instruction count.
pub struct Loader {
    frame_size: usize,
}

impl Loader {
    pub fn new(frame_size: usize) -> Loader {
        Loader { frame_size }
    }

    pub fn load_page(
        &self,
        program: &[Instruction],
        page: Page,
        frame: Frame,
        memory: &mut Memory,
    ) {
        let start = page * self.frame_size;
        let end = (start + self.frame_size).min(program.len());

        for (offset, instruction) in program[start..end].iter().enumerate() {
            memory.write(frame * self.frame_size + offset, *instruction);
        }

        debug!(
            "loaded page {} ({} words) into frame {}",
            page,
            end - start,
            frame
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{Asm, Program};

    #[test]
    fn test_loader_copies_a_full_page() {
        let loader = Loader::new(2);
        let mut memory = Memory::new(8);
        let program = Program::new("prg.exe", vec![Asm::cpu(3)]);

        loader.load_page(program.instructions(), 1, 3, &mut memory);

        assert_eq!(memory.read(6), Instruction::Cpu);
        assert_eq!(memory.read(7), Instruction::Exit);
    }

    #[test]
    fn test_loader_partial_last_page() {
        let loader = Loader::new(4);
        let mut memory = Memory::new(8);
        let program = Program::new("prg.exe", vec![Asm::cpu(4)]);

        loader.load_page(program.instructions(), 1, 0, &mut memory);

        // Only the fifth word exists on page 1.
        assert_eq!(memory.read(0), Instruction::Exit);
    }

    #[test]
    fn test_loader_reload_restores_program_words() {
        let loader = Loader::new(2);
        let mut memory = Memory::new(4);
        let program = Program::new("prg.exe", vec![Asm::cpu(1), Asm::io()]);

        loader.load_page(program.instructions(), 0, 0, &mut memory);
        // Another page claims the frame, then page 0 is faulted back in.
        loader.load_page(program.instructions(), 1, 0, &mut memory);
        loader.load_page(program.instructions(), 0, 0, &mut memory);

        assert_eq!(memory.read(0), Instruction::Cpu);
        assert_eq!(memory.read(1), Instruction::Io);
    }
}
