/// Quantum timer. Inert until a scheduler configures a quantum; counts only
/// while a process occupies the CPU and fires once a full quantum elapses.
pub struct Timer {
    quantum: Option<u32>,
    count: u32,
}

impl Timer {
    pub fn new() -> Timer {
        Timer {
            quantum: None,
            count: 0,
        }
    }

    pub fn set_quantum(&mut self, quantum: u32) {
        self.quantum = Some(quantum);
        self.count = 0;
    }

    pub fn quantum(&self) -> Option<u32> {
        self.quantum
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Counts one tick of CPU occupancy. Returns true when the quantum
    /// expires, which raises a timeout interrupt.
    pub fn tick(&mut self, cpu_busy: bool) -> bool {
        let Some(quantum) = self.quantum else {
            return false;
        };

        if !cpu_busy {
            return false;
        }

        self.count += 1;
        if self.count >= quantum {
            self.count = 0;
            return true;
        }

        false
    }
}
