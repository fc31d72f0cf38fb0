//! Terminal output - clean, ASCII-only.

use owo_colors::OwoColorize;
use parallax_common::{
    ActionPlan, Axis, AxisMap, PlanAction, RunOutcome, Sign, SignReading, StepObserver, StopReason,
    VoteTally,
};

/// Observer that narrates the run on stderr while it happens.
#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl StepObserver for ConsoleObserver {
    fn on_propose(&mut self, step: usize, plan: &ActionPlan) {
        match plan.action {
            PlanAction::Stop => eprintln!("[step {step}] planner: stop and commit"),
            PlanAction::Capture => {
                let view = plan
                    .view
                    .map(|v| format!("az={:.0} el={:.0}", v.az, v.el))
                    .unwrap_or_else(|| "?".to_string());
                let focus = plan
                    .axis
                    .as_deref()
                    .map(axes_label)
                    .unwrap_or_else(|| "XYZ".to_string());
                eprintln!("[step {step}] planner: capture {view} focus {focus}");
            }
        }
    }

    fn on_votes(&mut self, step: usize, tally: &VoteTally) {
        for axis in Axis::ALL {
            let counts = &tally[axis];
            if counts.total() > 0 {
                eprintln!(
                    "[step {step}]   votes {axis}: +{} 0:{} -{}",
                    counts[Sign::Plus],
                    counts[Sign::Zero],
                    counts[Sign::Minus],
                );
            }
        }
    }

    fn on_update(&mut self, step: usize, confidence: &AxisMap<f64>) {
        eprintln!(
            "[step {step}]   confidence X={:.2} Y={:.2} Z={:.2}",
            confidence[Axis::X],
            confidence[Axis::Y],
            confidence[Axis::Z],
        );
    }

    fn on_stop_check(&mut self, step: usize, stop: bool) {
        if stop {
            eprintln!("[step {step}]   belief cleared both thresholds");
        }
    }
}

/// Render the final outcome of a run.
pub fn display_outcome(outcome: &RunOutcome, expected: Option<&str>) {
    let reason = match outcome.stop_reason {
        StopReason::Converged => "[CONVERGED]".bright_green().to_string(),
        StopReason::PlannerStopped => "[PLANNER STOP]".yellow().to_string(),
        StopReason::BudgetExhausted => "[BUDGET]".bright_red().to_string(),
    };

    println!();
    println!("{reason}  after {} step(s)", outcome.steps_used);
    println!();
    for axis in Axis::ALL {
        let sign = outcome.decision[axis];
        let p = outcome.top_probs[axis];
        println!(
            "  {}: {}  (p = {})",
            axis,
            sign.to_string().bold(),
            colored_probability(p)
        );
    }
    println!();
    println!("{}", outcome.answer);

    if let Some(truth) = expected {
        let verdict = if parallax_common::matches_ground_truth(truth, &outcome.answer) {
            "[MATCH]".bright_green().to_string()
        } else {
            "[MISMATCH]".bright_red().to_string()
        };
        println!();
        println!("{verdict}  expected {truth}");
    }
}

/// Render a single-view judgment.
pub fn display_reading(reading: &SignReading, raw: &str) {
    if reading.is_empty() {
        println!("{}", "no usable signs in the answer".bright_red());
        println!("raw response: {raw}");
        return;
    }
    for (axis, sign) in reading.iter() {
        println!("  {}: {}", axis, sign.to_string().bold());
    }
}

fn colored_probability(p: f64) -> String {
    let text = format!("{p:.3}");
    if p >= 0.9 {
        text.bright_green().to_string()
    } else if p >= 0.7 {
        text.yellow().to_string()
    } else {
        text.bright_red().to_string()
    }
}

fn axes_label(axes: &[Axis]) -> String {
    axes.iter().map(Axis::as_str).collect::<Vec<_>>().join("")
}
