use log::{debug, error};

use super::dispatcher::Dispatcher;
use super::interrupts::{interrupt_vector, InterruptHandler, Irq, INTERRUPT_KINDS};
use super::io_device_controller::IoDeviceController;
use super::loader::Loader;
use super::memory_manager::{MemoryManager, VictimPolicy};
use super::scheduler::{Scheduler, SchedulerPolicy};
use super::stat_table::StatTable;
use super::{KernelError, Pid, ProcessState, ProcessTable};
use crate::hardware::{CpuStep, Hardware};
use crate::io::{FileSystem, Instruction};

/// The operating-system core: owns the simulated machine and every kernel
/// component, and reacts to the interrupts the machine raises. Exactly one
/// handler runs at a time, to completion; interrupts are synchronous calls.
pub struct Kernel {
    pub(crate) hardware: Hardware,
    pub(crate) process_table: ProcessTable,
    pub(crate) scheduler: Scheduler,
    pub(crate) memory_manager: MemoryManager,
    pub(crate) io_device_controller: IoDeviceController,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) loader: Loader,
    pub(crate) file_system: FileSystem,
    pub(crate) stat_table: StatTable,
    pub(crate) frame_size: usize,
    interrupt_vector: [InterruptHandler; INTERRUPT_KINDS],
}

impl Kernel {
    pub fn new(
        mut hardware: Hardware,
        policy: SchedulerPolicy,
        frame_size: usize,
        victim_policy: VictimPolicy,
    ) -> Kernel {
        assert!(frame_size > 0, "frame size must be non-zero");

        let frame_count = hardware.memory.size() / frame_size;
        hardware.mmu.set_frame_size(frame_size);

        let scheduler = Scheduler::new(policy);
        if let Some(quantum) = scheduler.quantum() {
            hardware.timer.set_quantum(quantum);
        }

        Kernel {
            hardware,
            process_table: ProcessTable::new(),
            scheduler,
            memory_manager: MemoryManager::new(victim_policy, frame_count),
            io_device_controller: IoDeviceController::new(),
            dispatcher: Dispatcher,
            loader: Loader::new(frame_size),
            file_system: FileSystem::new(),
            stat_table: StatTable::new(),
            frame_size,
            interrupt_vector: interrupt_vector(),
        }
    }

    /// The sole system call: launch the named program at the given priority.
    pub fn run(&mut self, path: &str, priority: u8) -> Result<(), KernelError> {
        self.raise(Irq::New {
            path: path.to_string(),
            priority,
        })
    }

    /// Invokes the registered handler for the interrupt, synchronously.
    pub fn raise(&mut self, irq: Irq) -> Result<(), KernelError> {
        let handler = self.interrupt_vector[irq.kind() as usize];
        handler(self, irq)
    }

    /// Advances the machine one clock tick: aging, timer, I/O device, one
    /// CPU fetch-execute step, then the per-tick stats sample.
    pub fn tick(&mut self) {
        let now = self.hardware.clock.advance();
        debug!("tick {}", now);

        self.scheduler.tick(now);

        if self.hardware.timer.tick(self.hardware.cpu.pc().is_some()) {
            self.dispatch(Irq::Timeout);
        }

        if self.hardware.io_device.tick() {
            self.dispatch(Irq::IoOut);
        }

        match self.hardware.step_cpu() {
            CpuStep::Idle => {}
            CpuStep::Fault(page) => self.dispatch(Irq::PageFault(page)),
            CpuStep::Executed(Instruction::Exit) => self.dispatch(Irq::Kill),
            CpuStep::Executed(Instruction::Io) => self.dispatch(Irq::IoIn(Instruction::Io)),
            CpuStep::Executed(Instruction::Cpu) => {}
        }

        self.dispatch(Irq::Stats);
    }

    /// Ticks until every registered process has terminated or `max_ticks`
    /// elapse. Returns the number of ticks executed.
    pub fn start(&mut self, max_ticks: u64) -> u64 {
        let mut ticks = 0;
        while ticks < max_ticks && !self.process_table.all_terminated() {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    pub fn file_system_mut(&mut self) -> &mut FileSystem {
        &mut self.file_system
    }

    pub fn stat_table(&self) -> &StatTable {
        &self.stat_table
    }

    fn dispatch(&mut self, irq: Irq) {
        if let Err(err) = self.raise(irq) {
            error!("{}", err);
        }
    }

    /// Installs a process on the CPU: fresh time slice, RUNNING state, and
    /// its saved context loaded through the dispatcher.
    pub(crate) fn run_pcb(&mut self, pid: Pid) {
        self.hardware.timer.reset();

        let pcb = self.process_table.get_mut(pid);
        pcb.state = ProcessState::Running;
        self.process_table.set_running(Some(pid));

        self.dispatcher.load(
            self.process_table.get(pid),
            &mut self.hardware.cpu,
            &mut self.hardware.mmu,
        );
    }

    /// Dispatches the scheduler's next process. Calling this with an empty
    /// ready queue is a contract violation.
    pub(crate) fn run_next(&mut self) {
        let pid = match self.scheduler.next() {
            Some(pid) => pid,
            None => panic!("dispatch from an empty ready queue"),
        };
        self.run_pcb(pid);
    }

    pub(crate) fn run_next_if_ready(&mut self) {
        if self.scheduler.has_next() {
            self.run_next();
        }
    }

    /// Takes the running process off the CPU, saving its context and leaving
    /// it in the given state. Returns its pid.
    pub(crate) fn save_running(&mut self, state: ProcessState) -> Pid {
        let pid = match self.process_table.running() {
            Some(pid) => pid,
            None => panic!("no running process to save"),
        };

        self.dispatcher
            .save(self.process_table.get_mut(pid), &mut self.hardware.cpu);
        self.process_table.set_running(None);
        self.process_table.get_mut(pid).state = state;
        pid
    }

    /// Runs the process now if the CPU is free, preempts the running one if
    /// the scheduler demands it, and otherwise enqueues it as ready.
    pub(crate) fn run_if_possible(&mut self, pid: Pid) {
        let now = self.hardware.clock.current_tick();

        match self.process_table.running() {
            None => self.run_pcb(pid),
            Some(running)
                if self
                    .scheduler
                    .must_expropriate(self.process_table.get(running), self.process_table.get(pid)) =>
            {
                let preempted = self.save_running(ProcessState::Ready);
                self.scheduler
                    .add(self.process_table.get_mut(preempted), now);
                self.run_pcb(pid);
            }
            Some(_) => {
                self.scheduler.add(self.process_table.get_mut(pid), now);
            }
        }
    }
}
