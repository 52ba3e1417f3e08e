/// Boundary signal produced by an utterance transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Begin(i32),
    End(i32),
}

/// Tracks the single open playback utterance of a session
///
/// Ids are handed out once and never reused, even across `reset`, so a client can
/// never confuse a stale utterance with a new one.
#[derive(Debug, Default)]
pub struct UtteranceTracker {
    open: Option<i32>,
    next_id: i32,
}

impl UtteranceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently open utterance, if any
    pub fn open_utterance(&self) -> Option<i32> {
        self.open
    }

    /// Open utterance id in wire form (-1 when idle)
    pub fn open_id(&self) -> i32 {
        self.open.unwrap_or(-1)
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Open a new utterance, closing the current one first if the end signal was missed
    pub fn start(&mut self) -> Vec<Boundary> {
        let mut boundaries = Vec::with_capacity(2);

        if let Some(id) = self.open.take() {
            boundaries.push(Boundary::End(id));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.open = Some(id);
        boundaries.push(Boundary::Begin(id));

        boundaries
    }

    /// Close the open utterance; a duplicate or late end is ignored
    pub fn end(&mut self) -> Option<Boundary> {
        self.open.take().map(Boundary::End)
    }

    pub fn reset(&mut self) {
        self.open = None;
    }
}
