//! Randomized invariant sweeps over the belief engine.
//!
//! Uses a local xorshift generator for test inputs rather than an external
//! property-testing crate, to keep dependencies minimal.
//!
//! ## Invariants Tested
//!
//! - Posterior rows are probability distributions
//! - Confidence lies in [0, 1] under both weighting models
//! - Wilson confidence is monotone in the majority count at fixed n
//! - Pseudo-counts never decrease
//! - All-zero tallies leave the belief untouched
//! - A single failing axis blocks the joint stop

use parallax_common::{
    Axis, AxisMap, BeliefOptions, BeliefState, ConfidenceModel, Sign, SignCounts, SignMap,
    VoteTally,
};

/// Simple pseudo-random number generator for test inputs (xorshift64).
struct TestRng {
    state: u64,
}

impl TestRng {
    fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_range(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        min + (self.next_u64() % (max - min))
    }

    fn counts(&mut self, max_per_sign: u64) -> SignCounts {
        SignMap::new(
            self.next_range(0, max_per_sign) as u32,
            self.next_range(0, max_per_sign) as u32,
            self.next_range(0, max_per_sign) as u32,
        )
    }

    fn tally(&mut self, max_per_sign: u64) -> VoteTally {
        AxisMap::new(
            self.counts(max_per_sign),
            self.counts(max_per_sign),
            self.counts(max_per_sign),
        )
    }
}

#[test]
fn posterior_rows_are_distributions_across_random_updates() {
    let mut rng = TestRng::new(42);
    for model in [ConfidenceModel::Wilson, ConfidenceModel::Entropy] {
        let mut belief = BeliefState::new(BeliefOptions {
            model,
            ..BeliefOptions::default()
        });
        for _ in 0..200 {
            belief.update(&rng.tally(12));
            let posterior = belief.posterior();
            for axis in Axis::ALL {
                let mut sum = 0.0;
                for sign in Sign::ALL {
                    let p = posterior[axis][sign];
                    assert!(p >= 0.0, "{model:?}: negative probability {p}");
                    sum += p;
                }
                assert!(
                    (sum - 1.0).abs() < 1e-9,
                    "{model:?}: row sums to {sum}, not 1"
                );
            }
        }
    }
}

#[test]
fn confidence_stays_in_unit_interval() {
    let mut rng = TestRng::new(7);
    for model in [ConfidenceModel::Wilson, ConfidenceModel::Entropy] {
        for _ in 0..2000 {
            let counts = rng.counts(40);
            let gamma = 0.5 + (rng.next_range(0, 40) as f64) / 10.0;
            let (n_eff, confidence) = model.score(&counts, 1.0, gamma);
            assert!(
                (0.0..=1.0).contains(&confidence),
                "{model:?}: confidence {confidence} out of range for {counts:?}"
            );
            assert!(n_eff >= 0.0);
            assert!(n_eff <= counts.total() as f64 + 1e-9);
        }
    }
}

#[test]
fn wilson_confidence_monotone_in_majority_at_fixed_n() {
    let mut rng = TestRng::new(99);
    for _ in 0..300 {
        let n = rng.next_range(2, 60) as u32;
        let mut last = -1.0;
        // Grow the majority bucket from an even split to unanimity.
        for k in (n / 2 + 1)..=n {
            let counts = SignMap::new(k, n - k, 0);
            let (_, confidence) = ConfidenceModel::Wilson.score(&counts, 1.0, 1.0);
            assert!(
                confidence >= last - 1e-12,
                "n={n}: confidence dropped from {last} to {confidence} at k={k}"
            );
            last = confidence;
        }
    }
}

#[test]
fn pseudo_counts_never_decrease_across_random_runs() {
    let mut rng = TestRng::new(1337);
    for model in [ConfidenceModel::Wilson, ConfidenceModel::Entropy] {
        let mut belief = BeliefState::new(BeliefOptions {
            model,
            ..BeliefOptions::default()
        });
        let mut last_mass = AxisMap::new(0.0, 0.0, 0.0);
        for _ in 0..500 {
            belief.update(&rng.tally(10));
            for axis in Axis::ALL {
                let mass = belief.mass(axis);
                assert!(
                    mass >= last_mass[axis] - 1e-12,
                    "{model:?}: mass shrank on {axis}"
                );
                last_mass[axis] = mass;
            }
        }
    }
}

#[test]
fn all_zero_tally_is_idempotent() {
    let mut rng = TestRng::new(3);
    let mut belief = BeliefState::default();
    for _ in 0..20 {
        belief.update(&rng.tally(8));
    }
    let before: Vec<f64> = Axis::ALL.iter().map(|&a| belief.mass(a)).collect();
    for _ in 0..50 {
        belief.update(&VoteTally::default());
    }
    let after: Vec<f64> = Axis::ALL.iter().map(|&a| belief.mass(a)).collect();
    assert_eq!(before, after);
}

#[test]
fn joint_stop_needs_every_axis() {
    let mut rng = TestRng::new(4242);
    for blocked in Axis::ALL {
        let mut belief = BeliefState::default();
        for _ in 0..rng.next_range(10, 30) {
            let tally = AxisMap::from_fn(|axis| {
                if axis == blocked {
                    // Persistently split: no usable evidence.
                    SignMap::new(5, 0, 5)
                } else {
                    SignMap::new(10, 0, 0)
                }
            });
            belief.update(&tally);
        }
        assert!(
            !belief.should_stop(0.8, 10.0),
            "stop fired despite blocked axis {blocked}"
        );
    }
}
