use log::info;

use super::kernel::Kernel;
use super::stat_table::state_char;
use super::{KernelError, ProcessState};
use crate::hardware::Page;
use crate::io::Instruction;

/// An interrupt request: a kind plus its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Irq {
    /// A program launch: the sole system call.
    New { path: String, priority: u8 },
    /// The running program executed its EXIT instruction.
    Kill,
    /// The running program voluntarily requested an I/O operation.
    IoIn(Instruction),
    /// The I/O device finished its in-service operation.
    IoOut,
    /// The running program exhausted its time slice.
    Timeout,
    /// The referenced page is not resident.
    PageFault(Page),
    /// Per-tick sampling hook.
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptKind {
    New = 0,
    Kill = 1,
    IoIn = 2,
    IoOut = 3,
    Timeout = 4,
    PageFault = 5,
    Stats = 6,
}

pub const INTERRUPT_KINDS: usize = 7;

impl Irq {
    pub fn kind(&self) -> InterruptKind {
        match self {
            Irq::New { .. } => InterruptKind::New,
            Irq::Kill => InterruptKind::Kill,
            Irq::IoIn(_) => InterruptKind::IoIn,
            Irq::IoOut => InterruptKind::IoOut,
            Irq::Timeout => InterruptKind::Timeout,
            Irq::PageFault(_) => InterruptKind::PageFault,
            Irq::Stats => InterruptKind::Stats,
        }
    }
}

pub type InterruptHandler = fn(&mut Kernel, Irq) -> Result<(), KernelError>;

/// The interrupt vector: one handler per kind, indexed by the kind's
/// discriminant. Built once at kernel construction; the array literal keeps
/// the kind set exhaustive by construction.
pub fn interrupt_vector() -> [InterruptHandler; INTERRUPT_KINDS] {
    [
        on_new,        // InterruptKind::New
        on_kill,       // InterruptKind::Kill
        on_io_in,      // InterruptKind::IoIn
        on_io_out,     // InterruptKind::IoOut
        on_timeout,    // InterruptKind::Timeout
        on_page_fault, // InterruptKind::PageFault
        on_stats,      // InterruptKind::Stats
    ]
}

/// Builds the PCB for a launched program, with an all-empty page table (pages
/// load on demand), then tries to run it.
fn on_new(kernel: &mut Kernel, irq: Irq) -> Result<(), KernelError> {
    let Irq::New { path, priority } = irq else {
        unreachable!("new handler invoked with {:?}", irq);
    };
    assert!(
        (priority as usize) < super::scheduler::PRIORITY_LEVELS,
        "priority {} out of range",
        priority
    );

    let program_size = kernel
        .file_system
        .program_size(&path)
        .ok_or_else(|| KernelError::ProgramNotFound(path.clone()))?;
    let page_count = program_size.div_ceil(kernel.frame_size);

    let pid = kernel.process_table.allocate_pid();
    let pcb = super::ProcessControlBlock::new(pid, &path, priority, page_count);
    info!("executing program: {} as pid {}", pcb.path(), pid);
    kernel.process_table.add(pcb);

    kernel.run_if_possible(pid);
    Ok(())
}

/// Releases every resident frame of the terminating process, marks it
/// terminated, and dispatches the next ready process if any.
fn on_kill(kernel: &mut Kernel, irq: Irq) -> Result<(), KernelError> {
    let Irq::Kill = irq else {
        unreachable!("kill handler invoked with {:?}", irq);
    };

    let running = match kernel.process_table.running() {
        Some(pid) => pid,
        None => panic!("kill with no running process"),
    };
    info!("program finished: pid {}", running);

    let frames = kernel.process_table.get_mut(running).take_resident_frames();
    for frame in frames {
        kernel
            .memory_manager
            .release_frame(frame, &mut kernel.hardware.mmu);
    }

    kernel.save_running(ProcessState::Terminated);
    kernel.run_next_if_ready();
    Ok(())
}

/// Parks the running process on the I/O controller and frees the CPU.
fn on_io_in(kernel: &mut Kernel, irq: Irq) -> Result<(), KernelError> {
    let Irq::IoIn(operation) = irq else {
        unreachable!("io-in handler invoked with {:?}", irq);
    };

    let pid = kernel.save_running(ProcessState::Waiting);
    kernel
        .io_device_controller
        .run_operation(pid, operation, &mut kernel.hardware.io_device);
    info!("{}", kernel.io_device_controller);

    kernel.run_next_if_ready();
    Ok(())
}

/// Retrieves the process whose I/O finished and tries to run it; the
/// controller starts its next queued request on the way.
fn on_io_out(kernel: &mut Kernel, irq: Irq) -> Result<(), KernelError> {
    let Irq::IoOut = irq else {
        unreachable!("io-out handler invoked with {:?}", irq);
    };

    let pid = kernel
        .io_device_controller
        .finished_pcb(&mut kernel.hardware.io_device);
    kernel.run_if_possible(pid);
    info!("{}", kernel.io_device_controller);
    Ok(())
}

/// Rotates the CPU to the next ready process, or lets the running one keep
/// going when nothing is waiting.
fn on_timeout(kernel: &mut Kernel, irq: Irq) -> Result<(), KernelError> {
    let Irq::Timeout = irq else {
        unreachable!("timeout handler invoked with {:?}", irq);
    };

    if kernel.scheduler.has_next() {
        let pid = kernel.save_running(ProcessState::Ready);
        let now = kernel.hardware.clock.current_tick();
        kernel
            .scheduler
            .add(kernel.process_table.get_mut(pid), now);
        kernel.run_next();
    } else {
        kernel.hardware.timer.reset();
    }
    Ok(())
}

/// Demand-pages the faulting page of the running process: obtains a frame
/// (possibly evicting), binds it, and copies the page's instructions in.
fn on_page_fault(kernel: &mut Kernel, irq: Irq) -> Result<(), KernelError> {
    let Irq::PageFault(page) = irq else {
        unreachable!("page-fault handler invoked with {:?}", irq);
    };

    let running = match kernel.process_table.running() {
        Some(pid) => pid,
        None => panic!("page fault with no running process"),
    };
    let path = kernel.process_table.get(running).path().to_string();

    let frame = kernel.memory_manager.allocate_frame(
        running,
        &mut kernel.process_table,
        &mut kernel.hardware.mmu,
    )?;

    kernel.hardware.mmu.bind(page, frame);
    kernel.process_table.get_mut(running).page_table[page] = Some(frame);

    let program = kernel
        .file_system
        .read(&path)
        .ok_or(KernelError::ProgramNotFound(path))?;
    kernel
        .loader
        .load_page(program, page, frame, &mut kernel.hardware.memory);
    Ok(())
}

/// Samples every process's state into one Gantt row.
fn on_stats(kernel: &mut Kernel, irq: Irq) -> Result<(), KernelError> {
    let Irq::Stats = irq else {
        unreachable!("stats handler invoked with {:?}", irq);
    };

    let row = kernel
        .process_table
        .pcbs()
        .map(|pcb| state_char(pcb.state))
        .collect();
    kernel.stat_table.add_row(row);
    Ok(())
}
