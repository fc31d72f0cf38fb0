//! Decoding and encoding of tagged model answers.
//!
//! Two wire shapes share the `<answer>...</answer>` delimiters: the
//! perception service emits a parenthesized sign tuple like `(+X, -Y, 0Z)`,
//! the planner emits a JSON action plan. Sign tuples decode leniently (bad
//! tokens are dropped, missing tags fall back to the raw text); action plans
//! decode strictly, because a half-understood plan must not steer the camera.

use crate::axis::{Axis, AxisMap, Sign, SignReading};
use crate::error::ParallaxError;
use crate::scene::Viewpoint;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static ANSWER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<answer>\s*(.*?)\s*</answer>").expect("answer regex"));

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+\-0])([XYZ])$").expect("token regex"));

/// What the planner wants next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanAction {
    Capture,
    Stop,
}

/// Decoded planner response: capture from a viewpoint with a set of focus
/// axes, or stop and commit to the current belief.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub action: PlanAction,
    #[serde(default)]
    pub view: Option<Viewpoint>,
    #[serde(default)]
    pub axis: Option<Vec<Axis>>,
}

/// Extract the first `<answer>` region, if any.
fn answer_region(response: &str) -> Option<&str> {
    ANSWER_RE
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Decode a perception answer into a partial per-axis sign reading.
///
/// Falls back to the whole trimmed text when the tags are absent; strips one
/// enclosing parenthesis pair; tokens that are not exactly a sign character
/// followed by an axis letter are silently dropped. A later token for the
/// same axis wins.
pub fn parse_sign_tuple(response: &str) -> SignReading {
    let mut content = answer_region(response).unwrap_or_else(|| response.trim());
    content = content.trim();
    if let Some(inner) = content
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        content = inner;
    }

    let mut reading = SignReading::default();
    for part in content.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(caps) = TOKEN_RE.captures(part) {
            let sign = match &caps[1] {
                "+" => Sign::Plus,
                "0" => Sign::Zero,
                _ => Sign::Minus,
            };
            let axis = match &caps[2] {
                "X" => Axis::X,
                "Y" => Axis::Y,
                _ => Axis::Z,
            };
            reading.set(axis, sign);
        }
    }
    reading
}

/// Decode a planner response into an [`ActionPlan`].
///
/// Missing delimiters or invalid JSON are hard failures surfaced to the
/// caller; the control loop does not retry them.
pub fn parse_action_plan(response: &str) -> Result<ActionPlan, ParallaxError> {
    let content = answer_region(response).ok_or(ParallaxError::MissingAnswerTag)?;
    serde_json::from_str(content).map_err(|e| ParallaxError::MalformedPlan(e.to_string()))
}

/// Render a partial reading as `(+X, -Y)` in canonical axis order.
pub fn format_reading(reading: &SignReading) -> String {
    let parts: Vec<String> = reading
        .iter()
        .map(|(axis, sign)| format!("{sign}{axis}"))
        .collect();
    format!("({})", parts.join(", "))
}

/// Render a full decision as `(+X, -Y, 0Z)`.
pub fn format_signs(signs: &AxisMap<Sign>) -> String {
    format_reading(&SignReading::from(*signs))
}

/// Render a full decision in the tagged wire form.
pub fn tagged_answer(signs: &AxisMap<Sign>) -> String {
    format!("<answer>{}</answer>", format_signs(signs))
}

/// Partial-credit comparison against a ground-truth tuple: every axis present
/// in the candidate must match the ground truth; axes the candidate omits are
/// not checked. Used by evaluation tooling, not by the control loop.
pub fn matches_ground_truth(ground_truth: &str, response: &str) -> bool {
    let candidate = parse_sign_tuple(response);
    let truth = parse_sign_tuple(ground_truth);
    let result = candidate
        .iter()
        .all(|(axis, sign)| truth.get(axis) == Some(sign));
    result
}
