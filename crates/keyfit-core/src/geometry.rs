// Re-export data types so they appear to be part of this module for internal core use
pub use keyfit_protocol::geometry::*;

use crate::config::GeometryConfig;
use crate::error::{KeyFitError, KfResult};
use crate::keycodes::KeyNameRegistry;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub mod kle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A drawable key: its slot in the layout plus absolute pixel geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedKey {
    pub row: usize,
    pub col: usize,
    pub code: String,
    pub label: String,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyboardGeometry {
    /// Real keys only, row-major. Placeholders never appear here.
    pub keys: Vec<PlacedKey>,
    pub canvas_width: f32,
    pub canvas_height: f32,
}

impl KeyboardGeometry {
    pub fn key_rects(&self) -> BTreeMap<(usize, usize), Rect> {
        self.keys.iter().map(|k| ((k.row, k.col), k.rect)).collect()
    }

    pub fn rect_at(&self, row: usize, col: usize) -> Option<Rect> {
        self.keys
            .iter()
            .find(|k| k.row == row && k.col == col)
            .map(|k| k.rect)
    }

    pub fn find(&self, code: &str) -> Option<&PlacedKey> {
        self.keys.iter().find(|k| k.code == code)
    }
}

/// Pixel width of a key spanning `units` key widths, bridging the gaps it covers.
#[inline(always)]
pub fn span(units: f32, unit: f32, gap: f32) -> f32 {
    let units = if units.is_finite() && units > 0.0 { units } else { 1.0 };
    units * unit + (units - 1.0) * gap
}

/// Lays out every key of `layout`.
///
/// Column `i` of a row starts at `(i + offset) * (key_width + gap)`, where
/// `offset` is the running sum of the row's `x_offset`s up to and including
/// key `i`. Placeholders take part in that accounting exactly like real keys
/// (and count toward the canvas width) but produce no rectangle.
pub fn compute_geometry(layout: &LayoutDefinition, cfg: &GeometryConfig) -> KeyboardGeometry {
    let pitch = cfg.column_pitch();
    let mut keys = Vec::with_capacity(layout.slot_count());
    let mut max_extent = 0.0f32;

    for (row_idx, row) in layout.rows.iter().enumerate() {
        let y = cfg.padding + row_idx as f32 * cfg.row_pitch();
        let mut offset = 0.0f32;

        for (col_idx, key) in row.iter().enumerate() {
            offset += key.x_offset;
            let left = (col_idx as f32 + offset) * pitch;
            let width = span(key.width, cfg.key_width, cfg.key_gap);
            max_extent = max_extent.max(left + width);

            if key.is_placeholder() {
                continue;
            }

            let height = match key.height {
                Some(h) if h.is_finite() && h > 0.0 => (h + cfg.height_epsilon) * cfg.key_height,
                _ => cfg.key_height,
            };

            keys.push(PlacedKey {
                row: row_idx,
                col: col_idx,
                code: key.code.clone(),
                label: key.label.clone(),
                rect: Rect {
                    x: cfg.padding + left,
                    y,
                    width,
                    height,
                },
            });
        }
    }

    KeyboardGeometry {
        keys,
        canvas_width: max_extent + cfg.padding * 2.0,
        canvas_height: layout.rows.len() as f32 * cfg.row_pitch() + cfg.padding * 2.0,
    }
}

// Trait to extend the Protocol struct with IO logic
pub trait LayoutLoader {
    fn load_from_file<P: AsRef<Path>>(path: P, registry: &KeyNameRegistry) -> KfResult<LayoutDefinition>;
}

impl LayoutLoader for LayoutDefinition {
    fn load_from_file<P: AsRef<Path>>(path: P, registry: &KeyNameRegistry) -> KfResult<Self> {
        let content = fs::read_to_string(&path)?;

        // 1. Native row/offset format (always a JSON object; KLE is an array)
        if content.trim_start().starts_with('{') {
            return serde_json::from_str::<LayoutDefinition>(&content)
                .map_err(|e| KeyFitError::Layout(format!("Invalid layout definition: {}", e)));
        }

        // 2. Keyboard Layout Editor export
        let mut def = kle::parse_kle_json(&content, registry)
            .map_err(|e| KeyFitError::Layout(format!("Failed to parse layout JSON: {}", e)))?;

        def.meta.name = path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "imported".to_string());
        def.meta.notes = "Imported from KLE".to_string();
        Ok(def)
    }
}
