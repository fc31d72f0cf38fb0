//! The active-evidence-aggregation control loop.
//!
//! One run walks PROPOSE -> VOTE -> UPDATE -> CHECK until the belief clears
//! both stop thresholds, the planner stops on its own, or the step budget
//! runs out. Each VOTE phase reads the proposed view plus a handful of
//! jittered repeats and tallies the decoded signs; tallying happens only
//! after every perception call of the step has returned.

use crate::answers::{self, ActionPlan, PlanAction};
use crate::axis::{Axis, AxisMap, Sign, VoteTally};
use crate::belief::BeliefState;
use crate::config::AgentConfig;
use crate::error::ParallaxError;
use crate::jitter::{sample_offsets, JitterOffset};
use crate::model::{PerceptionModel, PlannerModel};
use crate::prompts;
use crate::scene::{SceneCamera, Viewpoint};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

/// Immutable record of one completed step, fed back to the planner on every
/// subsequent turn.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub step: usize,
    pub view: Viewpoint,
    /// Canonical-view answer of record, as a formatted sign tuple.
    pub answer: String,
    pub confidence: AxisMap<f64>,
}

/// Why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The planner returned a STOP action.
    PlannerStopped,
    /// Every axis cleared both stop thresholds.
    Converged,
    /// The step budget ran out; the best current decision is returned.
    BudgetExhausted,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlannerStopped => "planner_stopped",
            Self::Converged => "converged",
            Self::BudgetExhausted => "budget_exhausted",
        }
    }
}

/// Final result of one agent run. A successful run always carries a
/// well-formed tagged sign tuple for all three axes, however low the
/// confidence behind it.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Tagged wire form, e.g. `<answer>(+X, -Y, 0Z)</answer>`.
    pub answer: String,
    pub decision: AxisMap<Sign>,
    pub top_probs: AxisMap<f64>,
    pub steps_used: usize,
    pub stop_reason: StopReason,
}

/// Step-boundary callbacks, injected so the core stays free of process-wide
/// logging state. All hooks default to no-ops.
pub trait StepObserver {
    fn on_propose(&mut self, _step: usize, _plan: &ActionPlan) {}
    fn on_votes(&mut self, _step: usize, _tally: &VoteTally) {}
    fn on_update(&mut self, _step: usize, _confidence: &AxisMap<f64>) {}
    fn on_stop_check(&mut self, _step: usize, _stop: bool) {}
}

/// Default observer: structured logging via `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl StepObserver for TracingObserver {
    fn on_propose(&mut self, step: usize, plan: &ActionPlan) {
        tracing::info!(step, ?plan, "planner proposal");
    }

    fn on_votes(&mut self, step: usize, tally: &VoteTally) {
        for axis in Axis::ALL {
            let counts = &tally[axis];
            tracing::debug!(
                step,
                axis = %axis,
                plus = counts[Sign::Plus],
                zero = counts[Sign::Zero],
                minus = counts[Sign::Minus],
                "vote tally"
            );
        }
    }

    fn on_update(&mut self, step: usize, confidence: &AxisMap<f64>) {
        tracing::info!(
            step,
            x = confidence[Axis::X],
            y = confidence[Axis::Y],
            z = confidence[Axis::Z],
            "confidence scores"
        );
    }

    fn on_stop_check(&mut self, step: usize, stop: bool) {
        tracing::debug!(step, stop, "stop check");
    }
}

/// The agent: owns the belief and the history for exactly one run.
pub struct Agent<'a> {
    planner: &'a dyn PlannerModel,
    perception: &'a dyn PerceptionModel,
    config: AgentConfig,
    belief: BeliefState,
    history: Vec<HistoryEntry>,
    observer: Box<dyn StepObserver>,
    rng: StdRng,
}

impl<'a> Agent<'a> {
    pub fn new(
        planner: &'a dyn PlannerModel,
        perception: &'a dyn PerceptionModel,
        config: AgentConfig,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let belief = BeliefState::new(config.belief_options());
        Self {
            planner,
            perception,
            config,
            belief,
            history: Vec::new(),
            observer: Box::new(TracingObserver),
            rng,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn StepObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn belief(&self) -> &BeliefState {
        &self.belief
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Ask the planner for the next action: the fixed opening prompt on the
    /// first step, the posterior- and history-carrying prompt afterwards.
    fn propose(&self, central: &str, target: &str) -> Result<ActionPlan, ParallaxError> {
        let user_prompt = if self.history.is_empty() {
            prompts::planner_first_turn(central, target, self.config.tau)
        } else {
            let belief_state = serde_json::to_string(&self.belief.posterior())?;
            let history = serde_json::to_string(&self.history)?;
            prompts::planner_intermediate(self.config.tau, &belief_state, &history)
        };
        let response = self.planner.propose(prompts::PLANNER_SYSTEM, &user_prompt)?;
        answers::parse_action_plan(&response)
    }

    /// Run one VOTE phase: canonical view plus jittered repeats, tallied
    /// after all calls complete. Returns the tally and the canonical-view
    /// answer of record.
    fn vote(
        &mut self,
        camera: &mut dyn SceneCamera,
        view: Viewpoint,
        focus: &[Axis],
        central: &str,
        target: &str,
    ) -> Result<(VoteTally, String), ParallaxError> {
        let system_prompt = prompts::perception_system(focus, central, target);
        let user_prompt = prompts::perception_user(central, target);

        let mut offsets = sample_offsets(
            &mut self.rng,
            self.config.jitter_count,
            self.config.jitter_az,
            self.config.jitter_el,
        );
        // The canonical view goes last; its decoded answer is the answer of
        // record for this step.
        offsets.push(JitterOffset::ZERO);
        let canonical_index = offsets.len() - 1;

        let mut tally = VoteTally::default();
        let mut canonical_answer = String::new();
        for (i, offset) in offsets.iter().enumerate() {
            let image = camera.capture(view.az + offset.d_az, view.el + offset.d_el)?;
            let response = self
                .perception
                .judge(&system_prompt, &user_prompt, &image)?;
            let reading = answers::parse_sign_tuple(&response);
            tally.record(&reading);
            if i == canonical_index {
                canonical_answer = answers::format_reading(&reading);
            }
        }
        Ok((tally, canonical_answer))
    }

    /// Run the full loop and return the final decision.
    ///
    /// Formatting failures from either model service and camera failures
    /// propagate and fail the run; an exhausted budget does not.
    pub fn run(
        &mut self,
        central: &str,
        target: &str,
        camera: &mut dyn SceneCamera,
    ) -> Result<RunOutcome, ParallaxError> {
        let mut steps_used = 0;
        let mut stop_reason = StopReason::BudgetExhausted;

        for step in 1..=self.config.max_steps {
            let plan = self.propose(central, target)?;
            self.observer.on_propose(step, &plan);

            if plan.action == PlanAction::Stop {
                stop_reason = StopReason::PlannerStopped;
                break;
            }
            let view = plan.view.ok_or_else(|| {
                ParallaxError::MalformedPlan("CAPTURE action without a view".to_string())
            })?;
            let focus = match &plan.axis {
                Some(axes) if !axes.is_empty() => axes.clone(),
                _ => Axis::ALL.to_vec(),
            };

            let (tally, canonical_answer) = self.vote(camera, view, &focus, central, target)?;
            self.observer.on_votes(step, &tally);

            let confidence = self.belief.update(&tally);
            self.observer.on_update(step, &confidence);
            self.history.push(HistoryEntry {
                step,
                view,
                answer: canonical_answer,
                confidence,
            });
            steps_used = step;

            let stop = self
                .belief
                .should_stop(self.config.tau, self.config.kappa_min);
            self.observer.on_stop_check(step, stop);
            if stop {
                stop_reason = StopReason::Converged;
                break;
            }
        }

        let (decision, top_probs) = self.belief.decision();
        Ok(RunOutcome {
            answer: answers::tagged_answer(&decision),
            decision,
            top_probs,
            steps_used,
            stop_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FakeModel;
    use crate::scene::ScriptedCamera;

    const CAPTURE_FRONT: &str = r#"<think>front view</think>
<answer>{"action": "CAPTURE", "view": {"az": 0.0, "el": 90.0}, "axis": ["X", "Y"]}</answer>"#;

    fn quiet_config() -> AgentConfig {
        AgentConfig {
            jitter_count: 0,
            seed: Some(7),
            ..AgentConfig::default()
        }
    }

    #[test]
    fn planner_stop_ends_run_without_voting() {
        let planner = FakeModel::always(r#"<answer>{"action": "STOP", "view": null, "axis": null}</answer>"#);
        let perception = FakeModel::always("<answer>(+X)</answer>");
        let mut camera = ScriptedCamera::new();
        let mut agent = Agent::new(&planner, &perception, quiet_config());

        let outcome = agent.run("mug", "lamp", &mut camera).unwrap();
        assert_eq!(outcome.stop_reason, StopReason::PlannerStopped);
        assert_eq!(outcome.steps_used, 0);
        assert_eq!(perception.call_count(), 0);
        assert!(camera.requests().is_empty());
        // Uniform prior: tie-break picks `+` everywhere.
        assert_eq!(outcome.answer, "<answer>(+X, +Y, +Z)</answer>");
    }

    #[test]
    fn capture_without_view_is_malformed() {
        let planner = FakeModel::always(r#"<answer>{"action": "CAPTURE", "view": null, "axis": ["X"]}</answer>"#);
        let perception = FakeModel::always("<answer>(+X)</answer>");
        let mut camera = ScriptedCamera::new();
        let mut agent = Agent::new(&planner, &perception, quiet_config());

        let err = agent.run("mug", "lamp", &mut camera).unwrap_err();
        assert!(matches!(err, ParallaxError::MalformedPlan(_)));
    }

    #[test]
    fn canonical_view_is_captured_last_at_exact_angles() {
        let planner = FakeModel::always(CAPTURE_FRONT);
        let perception = FakeModel::always("<answer>(+X, -Y)</answer>");
        let mut camera = ScriptedCamera::new();
        let config = AgentConfig {
            jitter_count: 3,
            max_steps: 1,
            seed: Some(42),
            ..AgentConfig::default()
        };
        let mut agent = Agent::new(&planner, &perception, config);

        let outcome = agent.run("mug", "lamp", &mut camera).unwrap();
        assert_eq!(outcome.steps_used, 1);
        assert_eq!(camera.requests().len(), 4);
        // Jittered requests first, the canonical view last.
        assert_eq!(*camera.requests().last().unwrap(), (0.0, 90.0));
        for &(az, el) in &camera.requests()[..3] {
            assert!((az - 0.0).abs() <= 3.0);
            assert!((el - 90.0).abs() <= 3.0);
        }
        assert_eq!(agent.history().len(), 1);
        assert_eq!(agent.history()[0].answer, "(+X, -Y)");
    }

    #[test]
    fn axes_missing_from_votes_keep_zero_confidence() {
        let planner = FakeModel::always(CAPTURE_FRONT);
        // The judge only ever answers for X.
        let perception = FakeModel::always("<answer>(+X)</answer>");
        let mut camera = ScriptedCamera::new();
        let config = AgentConfig {
            max_steps: 2,
            ..quiet_config()
        };
        let mut agent = Agent::new(&planner, &perception, config);

        let outcome = agent.run("mug", "lamp", &mut camera).unwrap();
        assert_eq!(outcome.stop_reason, StopReason::BudgetExhausted);
        for entry in agent.history() {
            assert_eq!(entry.confidence[Axis::Y], 0.0);
            assert_eq!(entry.confidence[Axis::Z], 0.0);
        }
        // Y and Z never received evidence, so their posterior is untouched.
        assert!((outcome.top_probs[Axis::Y] - 1.0 / 3.0).abs() < 1e-9);
        assert!((outcome.top_probs[Axis::Z] - 1.0 / 3.0).abs() < 1e-9);
    }
}
