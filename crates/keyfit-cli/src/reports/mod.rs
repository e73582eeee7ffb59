mod export;
mod grid;
mod tables;

pub use self::export::export_ranking_csv;
pub use self::grid::print_heatmap as print_heatmap_grid;
pub use self::tables::{print_apps, print_ranking, print_scope};
