//! One-way latch
//!
//! A flag that moves from pending to done exactly once. There is no reset.

/// Latch position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LatchState {
    /// Not yet tripped
    #[default]
    Pending,
    /// Tripped; terminal
    Done,
}

/// Pending → done flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Latch {
    state: LatchState,
}

impl Latch {
    /// Create a pending latch
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: LatchState::Pending,
        }
    }

    /// Trip the latch; returns `true` only for the call that tripped it
    #[inline]
    pub fn trip(&mut self) -> bool {
        match self.state {
            LatchState::Pending => {
                self.state = LatchState::Done;
                true
            }
            LatchState::Done => false,
        }
    }

    /// Current position
    #[inline]
    #[must_use]
    pub const fn state(&self) -> LatchState {
        self.state
    }

    /// Whether the latch has tripped
    #[inline]
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self.state, LatchState::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_once() {
        let mut latch = Latch::new();
        assert!(!latch.is_done());
        assert!(latch.trip());
        assert!(!latch.trip());
        assert_eq!(latch.state(), LatchState::Done);
    }
}
