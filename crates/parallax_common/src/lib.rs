//! Parallax Common - active viewpoint selection for relative-displacement
//! estimation.
//!
//! An agent steers a camera around a fixed 3D scene, asks a vision model to
//! judge the sign of the target's displacement from the central object along
//! each world axis, and folds the per-view votes into a Dirichlet belief
//! until every axis is both confident and well-evidenced.

pub mod agent;
pub mod answers;
pub mod axis;
pub mod belief;
pub mod config;
pub mod error;
pub mod jitter;
pub mod model;
pub mod prompts;
pub mod scene;

pub use agent::{Agent, HistoryEntry, RunOutcome, StepObserver, StopReason, TracingObserver};
pub use answers::{
    format_reading, format_signs, matches_ground_truth, parse_action_plan, parse_sign_tuple,
    tagged_answer, ActionPlan, PlanAction,
};
pub use axis::{Axis, AxisMap, Sign, SignCounts, SignMap, SignReading, VoteTally};
pub use belief::{BeliefOptions, BeliefState, ConfidenceModel, StopRule};
pub use config::{AgentConfig, ParallaxConfig, SceneConfig};
pub use error::ParallaxError;
pub use model::{FakeModel, HttpChatModel, ModelConfig, ModelError, PerceptionModel, PlannerModel};
pub use scene::{FrameStore, ImageHandle, SceneCamera, ScriptedCamera, Viewpoint};
