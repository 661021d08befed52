/// Discrete simulated time. Only moves when explicitly advanced, never by
/// reading a wall clock, so a fixed sequence of calls always replays the same.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Clock {
    now: u64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Moves time forward by `units`, returning the new time.
    pub fn advance(&mut self, units: u64) -> u64 {
        self.now = self.now.saturating_add(units);
        self.now
    }
}
