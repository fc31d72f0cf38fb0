//! Dirichlet belief over per-axis displacement signs.
//!
//! Each axis carries three pseudo-counts, one per sign. A step's vote tally
//! is first scored for reliability (Wilson lower bound or normalized entropy,
//! chosen at construction), then folded in as evidence-weighted smoothed
//! proportions: unanimous votes move the belief by close to their full count,
//! split votes barely move it at all.

use crate::axis::{Axis, AxisMap, Sign, SignCounts, SignMap, VoteTally};
use serde::{Deserialize, Serialize};

/// Two-sided 95% z-score used by the Wilson lower bound.
const WILSON_Z: f64 = 1.96;

/// How a step's vote tally is mapped to a reliability score in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceModel {
    /// Wilson score lower bound on the majority proportion, rescaled so a
    /// uniform three-way split scores zero.
    Wilson,
    /// One minus the normalized Shannon entropy of the smoothed proportions.
    Entropy,
}

impl Default for ConfidenceModel {
    fn default() -> Self {
        Self::Wilson
    }
}

impl ConfidenceModel {
    /// Score one axis's tally, returning `(n_eff, confidence)`.
    ///
    /// `n_eff` is the vote count discounted by the confidence; an empty tally
    /// scores `(0, 0)` under both models.
    pub fn score(&self, counts: &SignCounts, lambda: f64, gamma: f64) -> (f64, f64) {
        let n = counts.total() as f64;
        if n == 0.0 {
            return (0.0, 0.0);
        }
        let confidence = match self {
            Self::Wilson => {
                let p_hat = counts.majority() as f64 / n;
                let z = WILSON_Z;
                let lb = (p_hat + z * z / (2.0 * n)
                    - z * (p_hat * (1.0 - p_hat) / n + z * z / (4.0 * n * n)).sqrt())
                    / (1.0 + z * z / n);
                // A lower bound indistinguishable from 1/3 is no evidence at all.
                ((lb.max(1.0 / 3.0) - 1.0 / 3.0) / (2.0 / 3.0))
                    .max(0.0)
                    .powf(gamma)
            }
            Self::Entropy => {
                let h: f64 = Sign::ALL
                    .iter()
                    .map(|&s| (counts[s] as f64 + lambda) / (n + 3.0 * lambda))
                    .filter(|&p| p > 0.0)
                    .map(|p| -p * p.ln())
                    .sum();
                (1.0 - h / 3f64.ln()).max(0.0).powf(gamma)
            }
        };
        (n * confidence, confidence)
    }
}

/// Per-axis settling policy for [`BeliefState::should_stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopRule {
    /// Every axis must clear both thresholds at the same check. An axis whose
    /// top probability later dips below `tau` re-blocks the stop.
    Joint,
    /// An axis that has once cleared both thresholds stays settled; the run
    /// stops when all three have latched.
    Latched,
}

impl Default for StopRule {
    fn default() -> Self {
        Self::Joint
    }
}

/// Tunables fixed at belief construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BeliefOptions {
    /// Dirichlet prior mass per sign, and Laplace smoothing constant.
    pub lambda: f64,
    /// Sharpening exponent applied to the raw confidence.
    pub gamma: f64,
    pub model: ConfidenceModel,
    pub stop_rule: StopRule,
}

impl Default for BeliefOptions {
    fn default() -> Self {
        Self {
            lambda: 1.0,
            gamma: 1.0,
            model: ConfidenceModel::default(),
            stop_rule: StopRule::default(),
        }
    }
}

/// Calibrated posterior over the sign of each axis.
///
/// Pseudo-counts only ever grow; the belief is never reset within a run.
#[derive(Debug, Clone)]
pub struct BeliefState {
    opts: BeliefOptions,
    alpha: AxisMap<SignMap<f64>>,
    settled: AxisMap<bool>,
}

impl BeliefState {
    pub fn new(opts: BeliefOptions) -> Self {
        let prior = SignMap::new(opts.lambda, opts.lambda, opts.lambda);
        Self {
            opts,
            alpha: AxisMap::new(prior, prior, prior),
            settled: AxisMap::default(),
        }
    }

    /// Total pseudo-count mass accumulated for one axis.
    pub fn mass(&self, axis: Axis) -> f64 {
        Sign::ALL.iter().map(|&s| self.alpha[axis][s]).sum()
    }

    /// Fold one step's tally into the belief. Returns the per-axis confidence
    /// scores; an axis with zero effective evidence is left untouched.
    pub fn update(&mut self, tally: &VoteTally) -> AxisMap<f64> {
        AxisMap::from_fn(|axis| {
            let counts = &tally[axis];
            let (n_eff, confidence) = self.opts.model.score(counts, self.opts.lambda, self.opts.gamma);
            let n = counts.total() as f64;
            if n > 0.0 && n_eff > 0.0 {
                for sign in Sign::ALL {
                    let p_hat =
                        (counts[sign] as f64 + self.opts.lambda) / (n + 3.0 * self.opts.lambda);
                    self.alpha[axis][sign] += n_eff * p_hat;
                }
            }
            confidence
        })
    }

    /// Posterior mean over signs, per axis.
    pub fn posterior(&self) -> AxisMap<SignMap<f64>> {
        AxisMap::from_fn(|axis| {
            let mass = self.mass(axis);
            SignMap::from_fn(|sign| self.alpha[axis][sign] / mass)
        })
    }

    /// Most probable sign per axis with its posterior probability. Ties go to
    /// the earlier sign in `+`, `0`, `-` order.
    pub fn decision(&self) -> (AxisMap<Sign>, AxisMap<f64>) {
        let posterior = self.posterior();
        let mut signs = AxisMap::new(Sign::Plus, Sign::Plus, Sign::Plus);
        let mut top_probs = AxisMap::default();
        for axis in Axis::ALL {
            let mut top_sign = Sign::Plus;
            let mut top_p = f64::MIN;
            for sign in Sign::ALL {
                let p = posterior[axis][sign];
                if p > top_p {
                    top_sign = sign;
                    top_p = p;
                }
            }
            signs[axis] = top_sign;
            top_probs[axis] = top_p;
        }
        (signs, top_probs)
    }

    /// Whether the run may terminate: every axis needs top probability at
    /// least `tau` AND pseudo-count mass at least `kappa_min`. A confident
    /// posterior built from almost no evidence is not trusted, nor is a heavy
    /// but undecided one.
    pub fn should_stop(&mut self, tau: f64, kappa_min: f64) -> bool {
        let (_, top_probs) = self.decision();
        for axis in Axis::ALL {
            let clear = top_probs[axis] >= tau && self.mass(axis) >= kappa_min;
            if clear {
                self.settled[axis] = true;
            }
        }
        match self.opts.stop_rule {
            StopRule::Joint => {
                Axis::ALL
                    .iter()
                    .all(|&a| top_probs[a] >= tau && self.mass(a) >= kappa_min)
            }
            StopRule::Latched => Axis::ALL.iter().all(|&a| self.settled[a]),
        }
    }
}

impl Default for BeliefState {
    fn default() -> Self {
        Self::new(BeliefOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tally(x: [u32; 3], y: [u32; 3], z: [u32; 3]) -> VoteTally {
        AxisMap::new(
            SignMap::new(x[0], x[1], x[2]),
            SignMap::new(y[0], y[1], y[2]),
            SignMap::new(z[0], z[1], z[2]),
        )
    }

    #[test]
    fn posterior_rows_sum_to_one() {
        let mut belief = BeliefState::default();
        belief.update(&tally([9, 1, 0], [0, 10, 0], [5, 0, 5]));
        let posterior = belief.posterior();
        for axis in Axis::ALL {
            let sum: f64 = Sign::ALL.iter().map(|&s| posterior[axis][s]).sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-9);
            for sign in Sign::ALL {
                assert!(posterior[axis][sign] >= 0.0);
            }
        }
    }

    #[test]
    fn empty_tally_scores_zero_under_both_models() {
        let counts = SignCounts::default();
        for model in [ConfidenceModel::Wilson, ConfidenceModel::Entropy] {
            assert_eq!(model.score(&counts, 1.0, 1.0), (0.0, 0.0));
        }
    }

    #[test]
    fn uniform_split_has_zero_wilson_confidence() {
        let counts = SignMap::new(5, 0, 5);
        let (n_eff, confidence) = ConfidenceModel::Wilson.score(&counts, 1.0, 1.0);
        assert_eq!(confidence, 0.0);
        assert_eq!(n_eff, 0.0);
    }

    #[test]
    fn unanimous_votes_are_most_confident() {
        for model in [ConfidenceModel::Wilson, ConfidenceModel::Entropy] {
            let (_, split) = model.score(&SignMap::new(6, 4, 0), 1.0, 1.0);
            let (_, unanimous) = model.score(&SignMap::new(10, 0, 0), 1.0, 1.0);
            assert!(
                unanimous > split,
                "{model:?}: {unanimous} should exceed {split}"
            );
            assert!((0.0..=1.0).contains(&split));
            assert!((0.0..=1.0).contains(&unanimous));
        }
    }

    #[test]
    fn wilson_confidence_monotone_in_majority() {
        // Hold n = 12 fixed, grow the majority bucket.
        let mut last = -1.0;
        for k in 6..=12 {
            let counts = SignMap::new(k, 12 - k, 0);
            let (_, confidence) = ConfidenceModel::Wilson.score(&counts, 1.0, 1.0);
            assert!(
                confidence >= last,
                "confidence dropped from {last} to {confidence} at k={k}"
            );
            last = confidence;
        }
    }

    #[test]
    fn zero_evidence_axis_is_untouched() {
        let mut belief = BeliefState::default();
        let before = belief.mass(Axis::Y);
        let confidence = belief.update(&tally([8, 0, 0], [0, 0, 0], [0, 0, 0]));
        assert_eq!(confidence[Axis::Y], 0.0);
        assert_relative_eq!(belief.mass(Axis::Y), before);
        assert!(belief.mass(Axis::X) > before);
    }

    #[test]
    fn split_votes_barely_move_the_belief() {
        let mut belief = BeliefState::default();
        // Uniform split: Wilson confidence is exactly zero, so no movement.
        belief.update(&tally([0, 0, 0], [0, 0, 0], [5, 0, 5]));
        assert_relative_eq!(belief.mass(Axis::Z), 3.0);
        let posterior = belief.posterior();
        for sign in Sign::ALL {
            assert_relative_eq!(posterior[Axis::Z][sign], 1.0 / 3.0);
        }
    }

    #[test]
    fn pseudo_counts_never_decrease() {
        let mut belief = BeliefState::default();
        let tallies = [
            tally([9, 1, 0], [0, 10, 0], [5, 0, 5]),
            tally([0, 0, 0], [3, 3, 3], [10, 0, 0]),
            tally([1, 0, 0], [0, 0, 1], [0, 0, 0]),
        ];
        let mut last = AxisMap::from_fn(|axis| belief.mass(axis));
        for t in &tallies {
            belief.update(t);
            for axis in Axis::ALL {
                assert!(belief.mass(axis) >= last[axis] - 1e-12);
                last[axis] = belief.mass(axis);
            }
        }
    }

    #[test]
    fn decision_tie_breaks_in_sign_order() {
        let belief = BeliefState::default();
        let (signs, top_probs) = belief.decision();
        for axis in Axis::ALL {
            assert_eq!(signs[axis], Sign::Plus);
            assert_relative_eq!(top_probs[axis], 1.0 / 3.0);
        }
    }

    #[test]
    fn one_weak_axis_blocks_the_joint_stop() {
        let mut belief = BeliefState::default();
        for _ in 0..12 {
            belief.update(&tally([10, 0, 0], [0, 10, 0], [5, 0, 5]));
        }
        assert!(!belief.should_stop(0.8, 10.0));
        let (signs, top_probs) = belief.decision();
        assert_eq!(signs[Axis::X], Sign::Plus);
        assert_eq!(signs[Axis::Y], Sign::Zero);
        assert!(top_probs[Axis::X] >= 0.8);
        assert!(top_probs[Axis::Y] >= 0.8);
        assert!(top_probs[Axis::Z] < 0.4);
    }

    #[test]
    fn joint_stop_when_all_axes_clear() {
        let mut belief = BeliefState::default();
        for _ in 0..12 {
            belief.update(&tally([10, 0, 0], [0, 10, 0], [0, 0, 10]));
        }
        assert!(belief.should_stop(0.8, 10.0));
    }

    #[test]
    fn latched_axis_survives_later_dilution() {
        let opts = BeliefOptions {
            stop_rule: StopRule::Latched,
            ..BeliefOptions::default()
        };
        let mut latched = BeliefState::new(opts);
        let mut joint = BeliefState::default();

        // X converges hard while Y and Z stay open.
        for _ in 0..12 {
            latched.update(&tally([10, 0, 0], [0, 0, 0], [0, 0, 0]));
            joint.update(&tally([10, 0, 0], [0, 0, 0], [0, 0, 0]));
        }
        assert!(!latched.should_stop(0.8, 10.0));
        assert!(!joint.should_stop(0.8, 10.0));

        // Contradicting evidence on X while Y and Z converge.
        for _ in 0..40 {
            let t = tally([0, 0, 10], [0, 10, 0], [0, 0, 10]);
            latched.update(&t);
            joint.update(&t);
        }
        // X's top probability has been dragged under tau for the joint rule,
        // but the latched rule remembers that it once cleared.
        let (_, top_probs) = joint.decision();
        assert!(top_probs[Axis::X] < 0.8);
        assert!(latched.should_stop(0.8, 10.0));
        assert!(!joint.should_stop(0.8, 10.0));
    }

    #[test]
    fn gamma_sharpens_confidence() {
        let counts = SignMap::new(8, 2, 0);
        let (_, soft) = ConfidenceModel::Wilson.score(&counts, 1.0, 1.0);
        let (_, sharp) = ConfidenceModel::Wilson.score(&counts, 1.0, 2.0);
        assert!(sharp < soft);
        assert_relative_eq!(sharp, soft * soft, epsilon = 1e-12);
    }
}
