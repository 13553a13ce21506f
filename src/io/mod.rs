pub mod file_system;
pub mod program;

pub use file_system::FileSystem;
pub use program::{Asm, Instruction, Program};
