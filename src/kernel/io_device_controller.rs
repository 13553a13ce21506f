use std::collections::VecDeque;
use std::fmt;

use super::Pid;
use crate::hardware::IoDevice;
use crate::io::Instruction;

/// Driver for the single I/O device: a waiting queue of requests plus the
/// process whose operation the device is currently serving. Completion
/// arrives later as an I/O-out interrupt, never synchronously.
pub struct IoDeviceController {
    waiting_queue: VecDeque<(Pid, Instruction)>,
    current: Option<Pid>,
}

impl IoDeviceController {
    pub fn new() -> IoDeviceController {
        IoDeviceController {
            waiting_queue: VecDeque::new(),
            current: None,
        }
    }

    /// Enqueues a request and starts it at once if the device is idle.
    pub fn run_operation(&mut self, pid: Pid, instruction: Instruction, device: &mut IoDevice) {
        self.waiting_queue.push_back((pid, instruction));
        self.start_next_if_idle(device);
    }

    /// Returns the process whose operation just finished and immediately
    /// hands the device the next queued request, if any.
    pub fn finished_pcb(&mut self, device: &mut IoDevice) -> Pid {
        let finished = match self.current.take() {
            Some(pid) => pid,
            None => panic!("io completion with no operation in service"),
        };

        self.start_next_if_idle(device);
        finished
    }

    pub fn current(&self) -> Option<Pid> {
        self.current
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting_queue.len()
    }

    fn start_next_if_idle(&mut self, device: &mut IoDevice) {
        if self.current.is_none() && device.is_idle() {
            if let Some((pid, instruction)) = self.waiting_queue.pop_front() {
                self.current = Some(pid);
                device.execute(instruction);
            }
        }
    }
}

impl fmt::Display for IoDeviceController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "io device controller serving: {:?} waiting: {}",
            self.current,
            self.waiting_queue.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_operation_on_idle_device_starts_service() {
        let mut controller = IoDeviceController::new();
        let mut device = IoDevice::new(3);

        controller.run_operation(1, Instruction::Io, &mut device);

        assert!(!device.is_idle());
        assert_eq!(controller.current(), Some(1));
        assert_eq!(controller.waiting_count(), 0);
    }

    #[test]
    fn test_run_operation_on_busy_device_only_enqueues() {
        let mut controller = IoDeviceController::new();
        let mut device = IoDevice::new(3);

        controller.run_operation(1, Instruction::Io, &mut device);
        controller.run_operation(2, Instruction::Io, &mut device);

        assert_eq!(controller.current(), Some(1));
        assert_eq!(controller.waiting_count(), 1);
    }

    #[test]
    fn test_finished_pcb_starts_next_request_before_returning() {
        let mut controller = IoDeviceController::new();
        let mut device = IoDevice::new(1);

        controller.run_operation(1, Instruction::Io, &mut device);
        controller.run_operation(2, Instruction::Io, &mut device);
        assert!(device.tick());

        let finished = controller.finished_pcb(&mut device);

        assert_eq!(finished, 1);
        assert_eq!(controller.current(), Some(2));
        assert!(!device.is_idle());
    }

    #[test]
    fn test_finished_pcb_with_empty_queue_leaves_device_idle() {
        let mut controller = IoDeviceController::new();
        let mut device = IoDevice::new(1);

        controller.run_operation(1, Instruction::Io, &mut device);
        assert!(device.tick());

        assert_eq!(controller.finished_pcb(&mut device), 1);
        assert_eq!(controller.current(), None);
        assert!(device.is_idle());
    }

    #[test]
    #[should_panic(expected = "no operation in service")]
    fn test_finished_pcb_without_service_is_a_contract_violation() {
        let mut controller = IoDeviceController::new();
        let mut device = IoDevice::new(1);

        controller.finished_pcb(&mut device);
    }
}
