//! Prompt templates for the planner and perception services.
//!
//! The perception prompt is scoped to the axes the planner asked this view to
//! settle; the planner prompt carries the full posterior and step history so
//! it can revisit earlier viewpoints.

use crate::axis::Axis;

/// System prompt for the per-view vision judge. `axes` is the focus set for
/// this view.
pub fn perception_system(axes: &[Axis], central: &str, target: &str) -> String {
    let axis_list = axis_list(axes);
    format!(
        r#"You are a precise vision judge. The image shows colored world axes:

COORDINATE SYSTEM:
- X-axis: RED rod, pointing to positive X direction
- Y-axis: GREEN rod, pointing to positive Y direction
- Z-axis: BLUE rod, pointing to positive Z direction
- Origin (0,0,0): YELLOW sphere, located at the center of the {central}
- Both CENTRAL and TARGET objects have the same scale in X, Y, Z dimensions

TASK:
Determine the relative position of the {target} compared to the {central} in terms of their geometric centers.

INSTRUCTIONS:
1. Only focus on axes {axis_list} for this view and only give answers for these axes.
2. Compare the TARGET center to the CENTRAL center along each of {axis_list}:
   - "+" if TARGET lies in the positive direction
   - "-" if in the negative direction
   - "0" if approximately equal (centers aligned along that axis)
3. Wrap your full step-by-step reasoning in <think>...</think>.
4. Then emit exactly one line, wrapped in <answer>...</answer>, listing only axes {axis_list} with their sign or 0.
Do not include any extra text or prose."#
    )
}

/// User prompt for the per-view vision judge.
pub fn perception_user(central: &str, target: &str) -> String {
    format!(
        r#"CENTRAL: {central}
TARGET:  {target}

Return exactly:
<think>...step-by-step reasoning...</think>
<answer>(+X, -Y, 0Z)</answer>

Valid examples:
  <think>I see red and green axes...</think>
  <answer>(+X, -Y)</answer>

  <think>Blue axis only is clear...</think>
  <answer>(-Z)</answer>"#
    )
}

/// System prompt for the viewpoint planner.
pub const PLANNER_SYSTEM: &str = r#"You control a camera in a 3D scene. Your goal is to decide the signs (+, 0, -)
of TARGET relative to CENTRAL on axes X, Y, Z by choosing successive viewpoints.

**Camera Coordinate System:**
- Azimuth 0: X-axis points towards viewer, Y-axis points right
- As azimuth increases (clockwise rotation):
  - Azimuth 90: Y-axis points towards viewer, X-axis points left
  - Azimuth 180: X-axis points away from viewer, Y-axis points left
  - Azimuth 270: Y-axis points away from viewer, X-axis points right
- Elevation 0: Camera views from directly above (top-down)
- Elevation 90: Camera views from horizontal level
- Elevation 180: Camera views from directly below (bottom-up)

On every turn you will receive:
- threshold tau (a float in [0,1])
- belief_state:
    {
      "X": {"+": p_plus, "0": p_zero, "-": p_minus},
      "Y": {...},
      "Z": {...}
    }
- history: a list of previously checked views, each entry:
    {
      "step": n,
      "view": {"az": az_deg, "el": el_deg},
      "answer": "(+X, -Y, 0Z)" or shorter,
      "confidence": {"X": cX, "Y": cY, "Z": cZ}
    }

If all axes have max(belief) >= tau, you should stop. Otherwise choose the next
best view. You may revisit views to strengthen your belief.

You should also decide which axes to focus on in a view. For example, a view
showing the XY plane should focus on only the X and Y axes, or even just one
of them.

The confidence score is the reliability of the answer obtained from a view.
Zero confidence means the view did not clearly reveal the relative position.

**Rules**
1. Wrap your internal reasoning in <think>...</think>
2. Then emit exactly one <answer>...</answer> containing only this JSON:

{
  "action": "CAPTURE"|"STOP",
  "view": {"az": <number>, "el": <number>} | null,
  "axis": ["X", "Y"]
}
No extra text or fields."#;

/// Opening user prompt: no belief or history yet.
pub fn planner_first_turn(central: &str, target: &str, tau: f64) -> String {
    format!(
        r#"# First turn (no belief_state or history)
Task: find the per-axis signs (+, 0, -) on X, Y, Z for TARGET={target} vs CENTRAL={central}.
Threshold tau = {tau}.

Propose your initial viewpoint.
Respond with:
<think>...</think>
<answer>{{
  "action": "CAPTURE",
  "view": {{"az": <num>, "el": <num>}},
  "axis": ["axes to focus on for this view"]
}}</answer>"#
    )
}

/// Subsequent user prompt carrying the posterior and the full step history,
/// both serialized as JSON.
pub fn planner_intermediate(tau: f64, belief_state: &str, history: &str) -> String {
    format!(
        r#"# Subsequent turn
Threshold tau = {tau}
belief_state = {belief_state}
history      = {history}

Decide whether to STOP or pick another view.
Respond with:
<think>...</think>
<answer>{{
  "action": "CAPTURE"|"STOP",
  "view": {{"az": <num>, "el": <num>}} | null,
  "axis": ["axes to focus on for this view"] | null
}}</answer>"#
    )
}

fn axis_list(axes: &[Axis]) -> String {
    let names: Vec<&str> = axes.iter().map(Axis::as_str).collect();
    names.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perception_system_scopes_to_focus_axes() {
        let prompt = perception_system(&[Axis::X, Axis::Z], "mug", "lamp");
        assert!(prompt.contains("X, Z"));
        assert!(prompt.contains("center of the mug"));
        assert!(prompt.contains("the lamp compared to the mug"));
    }

    #[test]
    fn first_turn_names_objects_and_threshold() {
        let prompt = planner_first_turn("mug", "lamp", 0.9);
        assert!(prompt.contains("TARGET=lamp"));
        assert!(prompt.contains("CENTRAL=mug"));
        assert!(prompt.contains("tau = 0.9"));
    }

    #[test]
    fn intermediate_turn_carries_state() {
        let prompt = planner_intermediate(0.85, r#"{"X":{}}"#, "[]");
        assert!(prompt.contains(r#"belief_state = {"X":{}}"#));
        assert!(prompt.contains("history      = []"));
    }
}
