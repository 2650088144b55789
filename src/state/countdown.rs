use crate::config::DEFAULT_PERIOD;

/// Result of advancing the countdown by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still counting; carries the new remaining value.
    Counting(u32),
    /// The period elapsed: one scoring trigger is due and the countdown restarted.
    Expired,
}

/// Repeating countdown from `period` down to 1.
///
/// `remaining` stays within `1..=period`; the tick that would take it to zero
/// expires the period and resets it to `period` in the same step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownState {
    remaining: u32,
    period: u32,
    rounds: u64,
}

impl Default for CountdownState {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}

impl CountdownState {
    /// Start a full period. A zero period is treated as one.
    pub fn new(period: u32) -> Self {
        let period = period.max(1);
        Self {
            remaining: period,
            period,
            rounds: 0,
        }
    }

    /// Ticks left before the next expiry.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// Number of periods that have expired so far.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Advance by one tick.
    pub fn tick(&mut self) -> Tick {
        if self.remaining <= 1 {
            self.remaining = self.period;
            self.rounds += 1;
            Tick::Expired
        } else {
            self.remaining -= 1;
            Tick::Counting(self.remaining)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_then_expires_once_per_period() {
        let mut countdown = CountdownState::new(7);
        let ticks: Vec<_> = (0..8).map(|_| countdown.tick()).collect();

        assert_eq!(
            ticks,
            vec![
                Tick::Counting(6),
                Tick::Counting(5),
                Tick::Counting(4),
                Tick::Counting(3),
                Tick::Counting(2),
                Tick::Counting(1),
                Tick::Expired,
                Tick::Counting(6),
            ]
        );
        assert_eq!(countdown.rounds(), 1);
    }

    #[test]
    fn remaining_stays_in_bounds_over_many_periods() {
        let mut countdown = CountdownState::new(7);
        let mut expiries = 0;
        for _ in 0..7 * 50 {
            if countdown.tick() == Tick::Expired {
                expiries += 1;
                assert_eq!(countdown.remaining(), countdown.period());
            }
            assert!((1..=7).contains(&countdown.remaining()));
        }

        assert_eq!(expiries, 50);
        assert_eq!(countdown.rounds(), 50);
    }

    #[test]
    fn period_of_one_expires_every_tick() {
        let mut countdown = CountdownState::new(0);
        assert_eq!(countdown.period(), 1);
        assert_eq!(countdown.tick(), Tick::Expired);
        assert_eq!(countdown.tick(), Tick::Expired);
    }
}
