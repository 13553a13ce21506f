use log::debug;

use crate::io::Instruction;

/// The single simulated I/O device. Serves one operation at a time, taking a
/// fixed number of ticks per operation; completion is signalled through the
/// I/O-out interrupt, never as a return value.
pub struct IoDevice {
    service_ticks: u32,
    remaining: u32,
    current: Option<Instruction>,
}

impl IoDevice {
    pub fn new(service_ticks: u32) -> IoDevice {
        IoDevice {
            service_ticks,
            remaining: 0,
            current: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    pub fn execute(&mut self, instruction: Instruction) {
        if !self.is_idle() {
            panic!("io device started while busy");
        }

        debug!("io device executing {}", instruction);
        self.current = Some(instruction);
        self.remaining = self.service_ticks;
    }

    /// Counts down the in-service operation. Returns true when it finishes,
    /// which raises an I/O-out interrupt.
    pub fn tick(&mut self) -> bool {
        if self.current.is_none() {
            return false;
        }

        self.remaining -= 1;
        if self.remaining == 0 {
            self.current = None;
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_device_execute_makes_it_busy() {
        let mut device = IoDevice::new(3);
        assert!(device.is_idle());

        device.execute(Instruction::Io);

        assert!(!device.is_idle());
    }

    #[test]
    fn test_io_device_finishes_after_service_time() {
        let mut device = IoDevice::new(2);
        device.execute(Instruction::Io);

        assert!(!device.tick());
        assert!(device.tick());
        assert!(device.is_idle());
    }

    #[test]
    fn test_io_device_idle_tick_is_a_no_op() {
        let mut device = IoDevice::new(2);

        assert!(!device.tick());
    }

    #[test]
    #[should_panic(expected = "busy")]
    fn test_io_device_execute_while_busy() {
        let mut device = IoDevice::new(2);
        device.execute(Instruction::Io);
        device.execute(Instruction::Io);
    }
}
