//! Rendering-environment boundary.
//!
//! The agent never renders anything itself; it asks a [`SceneCamera`] for an
//! image of the fixed scene at a given azimuth/elevation and passes the
//! resulting handle to the perception model untouched. For a fixed scene the
//! same angles must yield a reproducible image.

use crate::error::ParallaxError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A camera viewpoint on the scene's view sphere, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    pub az: f64,
    pub el: f64,
}

impl Viewpoint {
    pub fn new(az: f64, el: f64) -> Self {
        Self { az, el }
    }
}

/// Opaque handle to one rendered view. The core never inspects the image
/// content; only the model client reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    path: PathBuf,
}

impl ImageHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

/// The rendering environment, reduced to the one call the agent needs.
pub trait SceneCamera {
    /// Produce an image of the scene from the given angles.
    fn capture(&mut self, az: f64, el: f64) -> Result<ImageHandle, ParallaxError>;
}

/// Camera over a directory of pre-rendered frames.
///
/// Frames follow the renderer's naming scheme
/// `{object}_sphere_az{az:03}_el{el:03}.png`, with angles truncated to whole
/// degrees. A missing frame is a collaborator failure, not a format error.
#[derive(Debug, Clone)]
pub struct FrameStore {
    frames_dir: PathBuf,
    object_id: String,
}

impl FrameStore {
    pub fn new(frames_dir: impl Into<PathBuf>, object_id: impl Into<String>) -> Self {
        Self {
            frames_dir: frames_dir.into(),
            object_id: object_id.into(),
        }
    }

    pub fn frame_path(&self, az: f64, el: f64) -> PathBuf {
        self.frames_dir.join(format!(
            "{}_sphere_az{:03}_el{:03}.png",
            self.object_id, az as i64, el as i64
        ))
    }
}

impl SceneCamera for FrameStore {
    fn capture(&mut self, az: f64, el: f64) -> Result<ImageHandle, ParallaxError> {
        let path = self.frame_path(az, el);
        if !path.is_file() {
            return Err(ParallaxError::Camera(format!(
                "no frame rendered at az={az:.1} el={el:.1} ({})",
                path.display()
            )));
        }
        Ok(ImageHandle::new(path))
    }
}

/// Test camera: hands out a synthetic handle for any angles and records the
/// requests it served.
#[derive(Debug, Default)]
pub struct ScriptedCamera {
    requests: Vec<(f64, f64)>,
}

impl ScriptedCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> &[(f64, f64)] {
        &self.requests
    }
}

impl SceneCamera for ScriptedCamera {
    fn capture(&mut self, az: f64, el: f64) -> Result<ImageHandle, ParallaxError> {
        self.requests.push((az, el));
        Ok(ImageHandle::new(format!(
            "scripted_az{az:.2}_el{el:.2}.png"
        )))
    }
}
