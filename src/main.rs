mod hardware;
mod io;
mod kernel;

use log::info;

use hardware::Hardware;
use io::{Asm, Program};
use kernel::{Kernel, SchedulerPolicy, VictimPolicy};

const MEMORY_CELLS: usize = 16;
const FRAME_SIZE: usize = 4;
const MAX_TICKS: u64 = 1000;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("starting emulator");

    let hardware = Hardware::new(MEMORY_CELLS);
    let mut kernel = Kernel::new(
        hardware,
        SchedulerPolicy::Priority,
        FRAME_SIZE,
        VictimPolicy::Fifo,
    );

    let prg1 = Program::new(
        "prg1.exe",
        vec![Asm::cpu(2), Asm::io(), Asm::cpu(3), Asm::io(), Asm::cpu(2)],
    );
    let prg2 = Program::new("prg2.exe", vec![Asm::cpu(7)]);
    let prg3 = Program::new("prg3.exe", vec![Asm::cpu(4), Asm::io(), Asm::cpu(1)]);

    for program in [&prg1, &prg2, &prg3] {
        kernel.file_system_mut().write_program(program);
    }

    kernel.run(prg1.name(), 3).expect("prg1 should launch");
    kernel.run(prg2.name(), 2).expect("prg2 should launch");
    kernel.run(prg3.name(), 4).expect("prg3 should launch");

    let ticks = kernel.start(MAX_TICKS);
    info!("all processes terminated after {} ticks", ticks);

    kernel.stat_table().report();
}
