use crate::geometry::{KeyboardGeometry, PlacedKey};
use crate::protocol::RankingEntry;
use fnv::FnvHashMap;
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);

    /// Fill used when the distribution has no spread.
    pub const NEUTRAL: Rgb = Rgb::WHITE;

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// White→red ramp over `[min, max]`.
///
/// Red stays at 255 while green and blue fall together from 255 to 0.
/// Counts outside the range (e.g. an unranked key, implicitly 0, below a
/// non-zero minimum) are clamped to the nearest end.
pub fn color_for(count: u64, min: u64, max: u64) -> Rgb {
    if max == min {
        return Rgb::NEUTRAL;
    }
    let ratio = (count as f64 - min as f64) / (max as f64 - min as f64);
    let level = (255.0 * (1.0 - ratio.clamp(0.0, 1.0))).round() as u8;
    Rgb::new(255, level, level)
}

/// Key code → count, folded from a ranking. Absent keys count as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageMap {
    counts: FnvHashMap<String, u64>,
}

impl UsageMap {
    /// Later duplicates overwrite earlier ones; empty codes are dropped.
    pub fn from_ranking(ranking: &[RankingEntry]) -> Self {
        let mut counts = FnvHashMap::default();
        for entry in ranking {
            if entry.key_code.is_empty() {
                continue;
            }
            counts.insert(entry.key_code.clone(), entry.count);
        }
        Self { counts }
    }

    pub fn get(&self, code: &str) -> u64 {
        self.counts.get(code).copied().unwrap_or(0)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.counts.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// `(min, max)` over the recorded counts; `(0, 1)` for an empty map.
    pub fn extrema(&self) -> (u64, u64) {
        match self.counts.values().copied().minmax() {
            MinMaxResult::NoElements => (0, 1),
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatKey {
    pub key: PlacedKey,
    pub count: u64,
    pub color: Rgb,
}

/// A laid-out keyboard with a colour per real key.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub keys: Vec<HeatKey>,
    pub width: f32,
    pub height: f32,
    pub min: u64,
    pub max: u64,
}

impl Heatmap {
    pub fn build(geometry: &KeyboardGeometry, usage: &UsageMap) -> Self {
        let (min, max) = usage.extrema();
        let keys = geometry
            .keys
            .iter()
            .map(|key| {
                let count = usage.get(&key.code);
                HeatKey {
                    key: key.clone(),
                    count,
                    color: color_for(count, min, max),
                }
            })
            .collect();

        Self {
            keys,
            width: geometry.canvas_width,
            height: geometry.canvas_height,
            min,
            max,
        }
    }
}
