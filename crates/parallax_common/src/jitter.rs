//! Angular jitter around a proposed viewpoint.
//!
//! Each decision step evaluates the canonical view plus a handful of small
//! random perturbations, so one borderline rendering cannot dominate the
//! step's vote tally.

use rand::Rng;

/// A small angular perturbation of a viewpoint, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JitterOffset {
    pub d_az: f64,
    pub d_el: f64,
}

impl JitterOffset {
    /// The canonical, unperturbed view.
    pub const ZERO: JitterOffset = JitterOffset { d_az: 0.0, d_el: 0.0 };

    pub fn is_canonical(&self) -> bool {
        self.d_az == 0.0 && self.d_el == 0.0
    }
}

/// Draw `m` independent offsets, each coordinate uniform in `[-r, r]`.
///
/// No uniqueness guarantee between pairs. `m = 0` yields an empty vec; the
/// caller still evaluates [`JitterOffset::ZERO`] separately.
pub fn sample_offsets<R: Rng + ?Sized>(
    rng: &mut R,
    m: usize,
    r_az: f64,
    r_el: f64,
) -> Vec<JitterOffset> {
    (0..m)
        .map(|_| JitterOffset {
            d_az: uniform(rng, r_az),
            d_el: uniform(rng, r_el),
        })
        .collect()
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, radius: f64) -> f64 {
    if radius > 0.0 {
        rng.gen_range(-radius..=radius)
    } else {
        0.0
    }
}
