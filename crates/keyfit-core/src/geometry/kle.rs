use super::{KeyDefinition, LayoutDefinition, LayoutMeta};
use crate::keycodes::KeyNameRegistry;
use std::collections::BTreeMap;
use std::error::Error;

/// Parses raw KLE JSON into row/offset form using the kle-serial crate.
///
/// Keys are grouped into rows by their top edge and ordered by x. Absolute
/// KLE positions become per-row cumulative `x_offset`s, so a key at
/// `x = 1.5` in column 1 gets an offset of `0.5`.
pub fn parse_kle_json(
    content: &str,
    registry: &KeyNameRegistry,
) -> Result<LayoutDefinition, Box<dyn Error>> {
    let keyboard: kle_serial::Keyboard = serde_json::from_str(content)?;

    // Quarter-unit buckets absorb float noise in KLE y values.
    let mut by_row: BTreeMap<i64, Vec<(usize, kle_serial::Key)>> = BTreeMap::new();
    for (id, key) in keyboard.keys.into_iter().enumerate() {
        let bucket = (key.y * 4.0).round() as i64;
        by_row.entry(bucket).or_default().push((id, key));
    }

    let mut rows = Vec::with_capacity(by_row.len());
    for (_, mut keys) in by_row {
        keys.sort_by(|a, b| a.1.x.total_cmp(&b.1.x));

        let mut cumulative = 0.0f32;
        let mut row = Vec::with_capacity(keys.len());
        for (col, (id, key)) in keys.iter().enumerate() {
            let x_offset = key.x as f32 - (col as f32 + cumulative);
            cumulative += x_offset;

            let label = key
                .legends
                .iter()
                .flatten()
                .find(|l| !l.text.is_empty())
                .map(|l| l.text.clone())
                .unwrap_or_default();

            let code = if label.is_empty() {
                format!("k{}", id)
            } else {
                registry
                    .code_for_label(&label)
                    .map(str::to_string)
                    .unwrap_or_else(|| label.clone())
            };

            let height = key.height as f32;
            row.push(KeyDefinition {
                code,
                label,
                x_offset,
                width: key.width as f32,
                height: if height > 1.0 { Some(height) } else { None },
            });
        }
        rows.push(row);
    }

    Ok(LayoutDefinition {
        meta: LayoutMeta::default(),
        rows,
    })
}
