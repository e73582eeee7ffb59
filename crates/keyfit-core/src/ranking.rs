use crate::keycodes::KeyNameRegistry;
use crate::protocol::RankingEntry;
use serde::Serialize;

/// One bar of the ranking chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartRow {
    pub rank: usize,
    pub label: String,
    pub count: u64,
}

/// Maps the ranking 1:1 onto chart rows labelled `"<rank>: <name>"`.
/// Order is kept exactly as delivered; nothing is dropped or merged.
pub fn project(ranking: &[RankingEntry], names: &KeyNameRegistry) -> Vec<ChartRow> {
    ranking
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let rank = idx + 1;
            ChartRow {
                rank,
                label: format!("{}: {}", rank, names.display_name(&entry.key_code)),
                count: entry.count,
            }
        })
        .collect()
}
