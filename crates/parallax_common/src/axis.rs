//! Axis and sign primitives.
//!
//! Every table in the belief engine is a fixed-size array indexed by these
//! two enums, so a missing axis or an unknown sign is a compile error, not a
//! silent miss on a string key.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// One of the three spatial comparison axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes, in canonical order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(Axis::X),
            "Y" => Ok(Axis::Y),
            "Z" => Ok(Axis::Z),
            _ => Err(()),
        }
    }
}

/// Relative-direction label assigned to one axis by one observation.
///
/// The three categories are mutually exclusive and exhaustive: the target's
/// center is either in the positive direction, the negative direction, or
/// approximately aligned with the central object's center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "-")]
    Minus,
}

impl Sign {
    /// All signs, in the order ties are broken (first maximum wins).
    pub const ALL: [Sign; 3] = [Sign::Plus, Sign::Zero, Sign::Minus];

    pub const fn index(self) -> usize {
        match self {
            Sign::Plus => 0,
            Sign::Zero => 1,
            Sign::Minus => 2,
        }
    }

    pub fn glyph(&self) -> char {
        match self {
            Sign::Plus => '+',
            Sign::Zero => '0',
            Sign::Minus => '-',
        }
    }

    pub fn from_char(c: char) -> Option<Sign> {
        match c {
            '+' => Some(Sign::Plus),
            '0' => Some(Sign::Zero),
            '-' => Some(Sign::Minus),
            _ => None,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// Fixed-size table keyed by [`Axis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisMap<T>([T; 3]);

impl<T> AxisMap<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self([x, y, z])
    }

    /// Build a table by evaluating `f` once per axis.
    pub fn from_fn(mut f: impl FnMut(Axis) -> T) -> Self {
        Self([f(Axis::X), f(Axis::Y), f(Axis::Z)])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, &T)> {
        Axis::ALL.iter().map(move |&a| (a, &self.0[a.index()]))
    }
}

impl<T> Index<Axis> for AxisMap<T> {
    type Output = T;

    fn index(&self, axis: Axis) -> &T {
        &self.0[axis.index()]
    }
}

impl<T> IndexMut<Axis> for AxisMap<T> {
    fn index_mut(&mut self, axis: Axis) -> &mut T {
        &mut self.0[axis.index()]
    }
}

impl<T: Serialize> Serialize for AxisMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        for (axis, value) in self.iter() {
            map.serialize_entry(axis.as_str(), value)?;
        }
        map.end()
    }
}

/// Fixed-size table keyed by [`Sign`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignMap<T>([T; 3]);

impl<T> SignMap<T> {
    pub fn new(plus: T, zero: T, minus: T) -> Self {
        Self([plus, zero, minus])
    }

    pub fn from_fn(mut f: impl FnMut(Sign) -> T) -> Self {
        Self([f(Sign::Plus), f(Sign::Zero), f(Sign::Minus)])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Sign, &T)> {
        Sign::ALL.iter().map(move |&s| (s, &self.0[s.index()]))
    }
}

impl<T> Index<Sign> for SignMap<T> {
    type Output = T;

    fn index(&self, sign: Sign) -> &T {
        &self.0[sign.index()]
    }
}

impl<T> IndexMut<Sign> for SignMap<T> {
    fn index_mut(&mut self, sign: Sign) -> &mut T {
        &mut self.0[sign.index()]
    }
}

impl<T: Serialize> Serialize for SignMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        for (sign, value) in self.iter() {
            map.serialize_entry(&sign.glyph().to_string(), value)?;
        }
        map.end()
    }
}

/// Vote counts over the three signs for one axis, within one decision step.
pub type SignCounts = SignMap<u32>;

impl SignCounts {
    /// Total number of votes recorded for this axis.
    pub fn total(&self) -> u32 {
        Sign::ALL.iter().map(|&s| self[s]).sum()
    }

    /// Size of the largest sign bucket.
    pub fn majority(&self) -> u32 {
        Sign::ALL.iter().map(|&s| self[s]).max().unwrap_or(0)
    }
}

/// Per-axis, per-sign vote counts accumulated over one decision step.
pub type VoteTally = AxisMap<SignCounts>;

impl VoteTally {
    /// Fold one decoded per-view reading into the tally. Axes the reading
    /// omits receive no vote.
    pub fn record(&mut self, reading: &SignReading) {
        for (axis, sign) in reading.iter() {
            self[axis][sign] += 1;
        }
    }
}

/// A partial per-axis judgment: one sign per axis actually present in a
/// decoded perception answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignReading(AxisMap<Option<Sign>>);

impl SignReading {
    pub fn set(&mut self, axis: Axis, sign: Sign) {
        self.0[axis] = Some(sign);
    }

    pub fn get(&self, axis: Axis) -> Option<Sign> {
        self.0[axis]
    }

    pub fn is_empty(&self) -> bool {
        Axis::ALL.iter().all(|&a| self.0[a].is_none())
    }

    /// Present (axis, sign) pairs in canonical axis order.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, Sign)> + '_ {
        Axis::ALL
            .iter()
            .filter_map(move |&a| self.0[a].map(|s| (a, s)))
    }
}

impl From<AxisMap<Sign>> for SignReading {
    fn from(full: AxisMap<Sign>) -> Self {
        let mut reading = SignReading::default();
        for (axis, &sign) in full.iter() {
            reading.set(axis, sign);
        }
        reading
    }
}
