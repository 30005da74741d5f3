//! Lock tracking state machine and search scheduler.
//!
//! Acquisition is gradual: `max_score` consecutive qualifying frames are
//! required. Loss is immediate: one disqualifying frame drops the score to
//! zero. While locked, a countdown decides when the next full search runs.

/// Explicit lock state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    /// Accumulating qualifying frames; `score < max_score`
    Unlocked { score: u32 },
    /// Lock held; `timer` frames remain before the next forced search
    Locked { timer: u32 },
}

/// Side effect requested by a score update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing beyond the score change
    None,
    /// Score just reached `max_score`
    Acquired,
    /// Score dropped from non-zero to zero
    Lost,
}

/// Whether the current step runs a fresh search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDecision {
    Search,
    Reuse,
}

/// Owns the tracking state; the only place the score changes
#[derive(Debug, Clone)]
pub struct TrackingMachine {
    state: TrackingState,
    max_score: u32,
    period: u32,
}

impl TrackingMachine {
    /// `max_score` is raised to one; a zero threshold would lock without evidence
    pub fn new(max_score: u32, period: u32) -> Self {
        Self {
            state: TrackingState::Unlocked { score: 0 },
            max_score: max_score.max(1),
            period,
        }
    }

    /// Current state
    #[inline]
    pub fn state(&self) -> TrackingState {
        self.state
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        matches!(self.state, TrackingState::Locked { .. })
    }

    /// Score in `[0, max_score]`
    #[inline]
    pub fn score(&self) -> u32 {
        match self.state {
            TrackingState::Unlocked { score } => score,
            TrackingState::Locked { .. } => self.max_score,
        }
    }

    /// Frames until the next forced search (0 when unlocked)
    #[inline]
    pub fn timer(&self) -> u32 {
        match self.state {
            TrackingState::Unlocked { .. } => 0,
            TrackingState::Locked { timer } => timer,
        }
    }

    #[inline]
    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    /// Decide whether this step searches, advancing the timer.
    ///
    /// Unlocked or expired timer: search and rearm the timer. Otherwise count
    /// down and reuse the previous alignment.
    pub fn schedule(&mut self) -> SearchDecision {
        match self.state {
            TrackingState::Unlocked { .. } => SearchDecision::Search,
            TrackingState::Locked { timer: 0 } => {
                self.state = TrackingState::Locked { timer: self.period };
                SearchDecision::Search
            }
            TrackingState::Locked { timer } => {
                self.state = TrackingState::Locked { timer: timer - 1 };
                SearchDecision::Reuse
            }
        }
    }

    /// Feed one quality reading
    pub fn on_metric(&mut self, over_threshold: bool) -> Transition {
        if over_threshold {
            self.increment_score()
        } else {
            self.reset_score()
        }
    }

    /// Clamped at `max_score`; reaching it locks with an expired timer so
    /// the next step searches immediately.
    pub fn increment_score(&mut self) -> Transition {
        match self.state {
            TrackingState::Locked { .. } => Transition::None,
            TrackingState::Unlocked { score } => {
                let score = score + 1;
                if score >= self.max_score {
                    self.state = TrackingState::Locked { timer: 0 };
                    Transition::Acquired
                } else {
                    self.state = TrackingState::Unlocked { score };
                    Transition::None
                }
            }
        }
    }

    /// No-op at zero; otherwise drops to `Unlocked { score: 0 }`
    pub fn reset_score(&mut self) -> Transition {
        if self.score() == 0 {
            return Transition::None;
        }
        self.state = TrackingState::Unlocked { score: 0 };
        Transition::Lost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold_never_scores() {
        let mut machine = TrackingMachine::new(3, 4);
        for _ in 0..20 {
            assert_eq!(machine.on_metric(false), Transition::None);
            assert_eq!(machine.score(), 0);
            assert!(!machine.is_locked());
        }
    }

    #[test]
    fn test_locks_on_kth_reading_and_clamps() {
        let k = 5;
        let mut machine = TrackingMachine::new(k, 2);

        for i in 1..k {
            assert_eq!(machine.on_metric(true), Transition::None);
            assert_eq!(machine.score(), i);
            assert!(!machine.is_locked());
        }

        assert_eq!(machine.on_metric(true), Transition::Acquired);
        assert!(machine.is_locked());
        assert_eq!(machine.score(), k);

        assert_eq!(machine.on_metric(true), Transition::None);
        assert_eq!(machine.score(), k);
    }

    #[test]
    fn test_single_miss_drops_lock() {
        let mut machine = TrackingMachine::new(2, 4);
        machine.on_metric(true);
        machine.on_metric(true);
        assert!(machine.is_locked());

        assert_eq!(machine.on_metric(false), Transition::Lost);
        assert_eq!(machine.score(), 0);
        assert_eq!(machine.timer(), 0);
        assert!(!machine.is_locked());

        // Already at zero: no second loss
        assert_eq!(machine.on_metric(false), Transition::None);
    }

    #[test]
    fn test_miss_during_acquisition_is_a_loss() {
        let mut machine = TrackingMachine::new(4, 0);
        machine.on_metric(true);
        assert_eq!(machine.on_metric(false), Transition::Lost);
        assert_eq!(machine.score(), 0);
    }

    #[test]
    fn test_hysteresis_sequence() {
        let mut machine = TrackingMachine::new(3, 4);
        let threshold = 0.5;
        let metrics = [0.9, 0.9, 0.9, 0.9, 0.2, 0.9];

        let mut scores = Vec::new();
        let mut locked = Vec::new();
        let mut losses = Vec::new();
        for (i, m) in metrics.iter().enumerate() {
            if machine.on_metric(*m > threshold) == Transition::Lost {
                losses.push(i);
            }
            scores.push(machine.score());
            locked.push(machine.is_locked());
        }

        assert_eq!(scores, vec![1, 2, 3, 3, 0, 1]);
        assert_eq!(locked, vec![false, false, true, true, false, false]);
        assert_eq!(losses, vec![4]);
    }

    #[test]
    fn test_schedule_cycles_timer_while_locked() {
        let mut machine = TrackingMachine::new(1, 2);
        assert_eq!(machine.schedule(), SearchDecision::Search);
        assert_eq!(machine.on_metric(true), Transition::Acquired);
        assert_eq!(machine.timer(), 0);

        // Expired timer forces a search and rearms
        assert_eq!(machine.schedule(), SearchDecision::Search);
        assert_eq!(machine.timer(), 2);
        assert_eq!(machine.schedule(), SearchDecision::Reuse);
        assert_eq!(machine.schedule(), SearchDecision::Reuse);
        assert_eq!(machine.timer(), 0);
        assert_eq!(machine.schedule(), SearchDecision::Search);
    }

    #[test]
    fn test_zero_period_searches_every_step() {
        let mut machine = TrackingMachine::new(1, 0);
        machine.on_metric(true);
        for _ in 0..5 {
            assert_eq!(machine.schedule(), SearchDecision::Search);
        }
    }

    #[test]
    fn test_unlocked_always_searches() {
        let mut machine = TrackingMachine::new(3, 10);
        for _ in 0..4 {
            assert_eq!(machine.schedule(), SearchDecision::Search);
            machine.on_metric(false);
        }
    }
}
