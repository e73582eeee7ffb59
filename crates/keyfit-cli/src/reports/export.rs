use keyfit_core::keycodes::KeyNameRegistry;
use keyfit_core::protocol::RankingEntry;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct CsvRow<'a> {
    rank: usize,
    key_code: &'a str,
    key_name: &'a str,
    count: u64,
}

pub fn write_ranking<W: Write>(
    out: W,
    ranking: &[RankingEntry],
    names: &KeyNameRegistry,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    for (idx, entry) in ranking.iter().enumerate() {
        writer.serialize(CsvRow {
            rank: idx + 1,
            key_code: &entry.key_code,
            key_name: names.display_name(&entry.key_code),
            count: entry.count,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_ranking_csv<P: AsRef<Path>>(
    path: P,
    ranking: &[RankingEntry],
    names: &KeyNameRegistry,
) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_ranking(file, ranking, names)
}
