//! Property tests spanning the engine and both analyses.

use proptest::prelude::*;
use pulsenet_convergence::{first_convergence, lcm_of};
use pulsenet_core::test_utils::*;
use pulsenet_stats::count_pulses;

fn arb_periods() -> impl Strategy<Value = Vec<u64>> {
    proptest::sample::subsequence(vec![3u64, 5, 7, 11, 13], 1..=3)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// A bank of counters converges at the lcm of their periods.
    #[test]
    fn counter_bank_converges_at_lcm(periods in arb_periods()) {
        let mut net = counter_bank(&periods);
        prop_assert_eq!(first_convergence(&mut net).unwrap(), lcm_of(periods.clone()).unwrap());
    }

    /// Pulse counts depend only on wiring and trigger count.
    #[test]
    fn count_pulses_is_deterministic(periods in arb_periods(), triggers in 0u64..200) {
        let a = count_pulses(&mut counter_bank(&periods), triggers).unwrap();
        let b = count_pulses(&mut counter_bank(&periods), triggers).unwrap();
        prop_assert_eq!(a, b);
    }
}
