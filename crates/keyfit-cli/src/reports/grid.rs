use comfy_table::presets::ASCII_FULL;
use comfy_table::{Cell, CellAlignment, Color, Table};
use itertools::Itertools;
use keyfit_core::geometry::LayoutVariant;
use keyfit_core::heatmap::Heatmap;

/// Terminal rendition of the heatmap: one table row per layout row, each
/// key shaded with its heat colour. Keys spanning rows appear in the first.
pub fn grid_table(heatmap: &Heatmap) -> Table {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    let rows = heatmap.keys.iter().chunk_by(|hk| hk.key.row);
    for (_, keys) in &rows {
        let cells: Vec<Cell> = keys
            .map(|hk| {
                let label = if hk.key.label.is_empty() { &hk.key.code } else { &hk.key.label };
                Cell::new(format!("{}\n{}", label, hk.count))
                    .set_alignment(CellAlignment::Center)
                    .fg(Color::Black)
                    .bg(Color::Rgb {
                        r: hk.color.r,
                        g: hk.color.g,
                        b: hk.color.b,
                    })
            })
            .collect();
        table.add_row(cells);
    }
    table
}

pub fn print_heatmap(heatmap: &Heatmap, variant: LayoutVariant) {
    println!("\nLayout: {}  (min {} / max {})", variant, heatmap.min, heatmap.max);
    println!("{}", grid_table(heatmap));
}
