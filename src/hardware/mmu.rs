use std::collections::{HashMap, VecDeque};

pub type Page = usize;
pub type Frame = usize;

/// Memory translation unit. Holds the running process's page table, splits
/// logical addresses into page and offset, and tracks frame accesses for the
/// replacement algorithms: a recency order over frames (for LRU victim
/// selection) and a drainable set of recently used frames (for Clock
/// reference bits).
pub struct Mmu {
    frame_size: usize,
    table: HashMap<Page, Frame>,
    recency: VecDeque<Frame>,
    recent_uses: Vec<Frame>,
}

impl Mmu {
    pub fn new() -> Mmu {
        Mmu {
            frame_size: 1,
            table: HashMap::new(),
            recency: VecDeque::new(),
            recent_uses: Vec::new(),
        }
    }

    pub fn set_frame_size(&mut self, frame_size: usize) {
        assert!(frame_size > 0, "frame size must be non-zero");
        self.frame_size = frame_size;
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Clears the page table. Access tracking survives a reset; it describes
    /// physical frames, not the process currently loaded.
    pub fn reset(&mut self) {
        self.table.clear();
    }

    pub fn bind(&mut self, page: Page, frame: Frame) {
        self.table.insert(page, frame);
    }

    /// Drops any binding that points at the given frame. Used when a resident
    /// page of the running process loses its frame.
    pub fn unbind_frame(&mut self, frame: Frame) {
        self.table.retain(|_, f| *f != frame);
    }

    /// Translates a logical instruction address to a physical cell address.
    /// A missing page is reported as `Err(page)`, which raises a page-fault
    /// interrupt.
    pub fn translate(&mut self, address: usize) -> Result<usize, Page> {
        let page = address / self.frame_size;
        let offset = address % self.frame_size;

        match self.table.get(&page) {
            Some(&frame) => {
                self.record_use(frame);
                Ok(frame * self.frame_size + offset)
            }
            None => Err(page),
        }
    }

    /// The least recently accessed frame, if any access has been recorded.
    pub fn least_recently_used(&self) -> Option<Frame> {
        self.recency.front().copied()
    }

    /// Returns and clears the set of frames accessed since the last call.
    pub fn drain_recent_uses(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.recent_uses)
    }

    fn record_use(&mut self, frame: Frame) {
        self.recency.retain(|f| *f != frame);
        self.recency.push_back(frame);

        if !self.recent_uses.contains(&frame) {
            self.recent_uses.push(frame);
        }
    }
}
