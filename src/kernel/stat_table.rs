use log::info;

use super::ProcessState;

/// One-character sample of a process state for the Gantt report.
pub fn state_char(state: ProcessState) -> char {
    match state {
        ProcessState::New => 'N',
        ProcessState::Ready => '.',
        ProcessState::Running => 'R',
        ProcessState::Waiting => 'W',
        ProcessState::Terminated => 'T',
    }
}

/// Per-tick snapshots of every process's coarse state, one row per tick and
/// one column per process in pid order. Waiting time counts the ticks a
/// process spent ready ('.'); turnaround time counts the ticks until it
/// terminated (everything but 'T').
pub struct StatTable {
    rows: Vec<Vec<char>>,
}

impl StatTable {
    pub fn new() -> StatTable {
        StatTable { rows: Vec::new() }
    }

    pub fn add_row(&mut self, row: Vec<char>) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Vec<char>] {
        &self.rows
    }

    /// The first tick (1-based row) at which the given process column shows
    /// `state`, if it ever does.
    pub fn first_tick_in(&self, column: usize, state: char) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.get(column) == Some(&state))
            .map(|row| row + 1)
    }

    pub fn waiting_times(&self) -> Vec<u64> {
        self.count_per_process(|state| state == '.')
    }

    pub fn turnaround_times(&self) -> Vec<u64> {
        self.count_per_process(|state| state != 'T')
    }

    /// Logs the Gantt table and the per-process waiting and turnaround times.
    pub fn report(&self) {
        let process_count = self.rows.iter().map(Vec::len).max().unwrap_or(0);

        let header: Vec<String> = (0..process_count).map(|pid| format!("P{}", pid)).collect();
        info!("tick | {}", header.join(" | "));
        for (tick, row) in self.rows.iter().enumerate() {
            let cells: Vec<String> = row.iter().map(|state| format!("{} ", state)).collect();
            info!("{:04} | {}", tick + 1, cells.join(" | "));
        }

        let waiting = self.waiting_times();
        let turnaround = self.turnaround_times();
        info!("process | waiting | turnaround");
        for pid in 0..process_count {
            info!("{:07} | {:07} | {:010}", pid, waiting[pid], turnaround[pid]);
        }
        info!("average waiting time: {:.2}", Self::average(&waiting));
        info!("average turnaround time: {:.2}", Self::average(&turnaround));
    }

    fn count_per_process(&self, counts: impl Fn(char) -> bool) -> Vec<u64> {
        let process_count = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut totals = vec![0u64; process_count];

        for row in &self.rows {
            for (pid, state) in row.iter().enumerate() {
                if counts(*state) {
                    totals[pid] += 1;
                }
            }
        }

        totals
    }

    fn average(times: &[u64]) -> f64 {
        if times.is_empty() {
            return 0.0;
        }
        times.iter().sum::<u64>() as f64 / times.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_chars() {
        assert_eq!(state_char(ProcessState::Running), 'R');
        assert_eq!(state_char(ProcessState::Ready), '.');
        assert_eq!(state_char(ProcessState::Waiting), 'W');
        assert_eq!(state_char(ProcessState::Terminated), 'T');
    }

    #[test]
    fn test_waiting_counts_ready_ticks() {
        let mut stats = StatTable::new();
        stats.add_row(vec!['R', '.']);
        stats.add_row(vec!['R', '.']);
        stats.add_row(vec!['T', 'R']);

        assert_eq!(stats.waiting_times(), vec![0, 2]);
    }

    #[test]
    fn test_turnaround_counts_until_terminated() {
        let mut stats = StatTable::new();
        stats.add_row(vec!['R', '.']);
        stats.add_row(vec!['T', 'R']);
        stats.add_row(vec!['T', 'T']);

        assert_eq!(stats.turnaround_times(), vec![1, 2]);
    }

    #[test]
    fn test_first_tick_in() {
        let mut stats = StatTable::new();
        stats.add_row(vec!['R', '.']);
        stats.add_row(vec!['W', 'R']);

        assert_eq!(stats.first_tick_in(1, 'R'), Some(2));
        assert_eq!(stats.first_tick_in(0, 'T'), None);
    }
}
