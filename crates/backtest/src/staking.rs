//! Stake sizing for each staking policy.

use rust_decimal::Decimal;

use crate::strategy::StakingPolicy;

/// Flat stake for [`StakingPolicy::Flat100`].
pub const FLAT_STAKE: Decimal = Decimal::ONE_HUNDRED;

/// 5%, shared by the percentage policies.
pub const STAKE_FRACTION: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Fibonacci terms (1, 1, 2, 3, 5, ...) memoized for a single run.
///
/// Terms saturate at `u64::MAX`; stakes that large are clipped by the
/// bankroll long before they matter.
#[derive(Debug, Clone)]
pub struct FibonacciLadder {
    terms: Vec<u64>,
}

impl Default for FibonacciLadder {
    fn default() -> Self {
        Self { terms: vec![1, 1] }
    }
}

impl FibonacciLadder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `fib(step)` with `fib(0) = fib(1) = 1`.
    pub fn term(&mut self, step: u32) -> u64 {
        let step = step as usize;
        while self.terms.len() <= step {
            let n = self.terms.len();
            self.terms.push(self.terms[n - 1].saturating_add(self.terms[n - 2]));
        }
        self.terms[step]
    }
}

/// Per-run stake calculator.
#[derive(Debug, Clone)]
pub struct StakeSizer {
    policy: StakingPolicy,
    fixed_amount: Decimal,
    ladder: FibonacciLadder,
}

impl StakeSizer {
    /// The fixed-percent amount is taken from `starting_bankroll` here and
    /// never recomputed.
    #[must_use]
    pub fn new(policy: StakingPolicy, starting_bankroll: Decimal) -> Self {
        Self {
            policy,
            fixed_amount: (starting_bankroll * STAKE_FRACTION).floor(),
            ladder: FibonacciLadder::new(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> StakingPolicy {
        self.policy
    }

    /// Stake requested by the policy before clipping.
    pub fn raw_stake(&mut self, bankroll: Decimal, step: u32) -> Decimal {
        match self.policy {
            StakingPolicy::Flat100 => FLAT_STAKE,
            StakingPolicy::Pct5 => bankroll * STAKE_FRACTION,
            StakingPolicy::FixedPct5 => self.fixed_amount,
            StakingPolicy::Fib1 | StakingPolicy::Fib5 => {
                let unit = self.policy.fibonacci_unit().unwrap_or(Decimal::ONE);
                Decimal::from(self.ladder.term(step))
                    .checked_mul(unit)
                    .unwrap_or(Decimal::MAX)
            }
        }
    }
}

/// Clips a raw stake to `[0, min(bankroll, cap)]` and floors it to whole units.
#[must_use]
pub fn clip_stake(raw: Decimal, bankroll: Decimal, cap: Option<Decimal>) -> Decimal {
    let mut stake = raw.min(bankroll);
    if let Some(cap) = cap {
        stake = stake.min(cap);
    }
    stake.max(Decimal::ZERO).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ladder_follows_sequence() {
        let mut ladder = FibonacciLadder::new();
        let terms: Vec<u64> = (0..8).map(|s| ladder.term(s)).collect();
        assert_eq!(terms, vec![1, 1, 2, 3, 5, 8, 13, 21]);
    }

    #[test]
    fn ladder_saturates_instead_of_overflowing() {
        let mut ladder = FibonacciLadder::new();
        assert_eq!(ladder.term(200), u64::MAX);
        assert_eq!(ladder.term(12), 233);
    }

    #[test]
    fn policies_size_stakes() {
        let bank = dec!(1234);
        assert_eq!(StakeSizer::new(StakingPolicy::Flat100, bank).raw_stake(bank, 0), dec!(100));
        assert_eq!(StakeSizer::new(StakingPolicy::Pct5, bank).raw_stake(bank, 0), dec!(61.70));

        let mut fixed = StakeSizer::new(StakingPolicy::FixedPct5, bank);
        assert_eq!(fixed.raw_stake(dec!(5000), 0), dec!(61));
        assert_eq!(fixed.raw_stake(dec!(10), 0), dec!(61));

        let mut fib5 = StakeSizer::new(StakingPolicy::Fib5, bank);
        assert_eq!(fib5.raw_stake(bank, 4), dec!(25));
    }

    #[test]
    fn huge_fibonacci_stake_does_not_panic() {
        let mut fib = StakeSizer::new(StakingPolicy::Fib5, dec!(1000));
        let raw = fib.raw_stake(dec!(1000), 500);
        assert_eq!(clip_stake(raw, dec!(1000), None), dec!(1000));
    }

    #[test]
    fn clip_respects_bankroll_and_cap() {
        assert_eq!(clip_stake(dec!(150), dec!(120), Some(dec!(10000))), dec!(120));
        assert_eq!(clip_stake(dec!(150), dec!(1000), Some(dec!(80))), dec!(80));
        assert_eq!(clip_stake(dec!(49.99), dec!(1000), None), dec!(49));
        assert_eq!(clip_stake(dec!(0.4), dec!(1000), None), dec!(0));
        assert_eq!(clip_stake(dec!(-3), dec!(1000), None), dec!(0));
    }
}
