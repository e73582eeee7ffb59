use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use keyfit_core::controller::AppSummary;
use keyfit_core::query::{AppFilter, QueryState};
use keyfit_core::ranking::ChartRow;

fn count(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn date(value: Option<chrono::NaiveDate>) -> String {
    value.map_or_else(|| "…".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

pub fn scope_line(query: &QueryState, apps: &[AppSummary]) -> String {
    let app = match query.app {
        AppFilter::All => "All Apps".to_string(),
        AppFilter::App(id) => apps
            .iter()
            .find(|a| a.info.id == id)
            .map_or_else(|| format!("app #{}", id), |a| a.info.name.clone()),
    };
    format!(
        "{} → {}  [{}]  {}",
        date(query.start),
        date(query.end),
        query.preset,
        app
    )
}

pub fn print_scope(query: &QueryState, apps: &[AppSummary]) {
    println!("\n📅 {}", scope_line(query, apps));
}

pub fn ranking_table(chart: &[ChartRow]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Rank").add_attribute(Attribute::Bold),
        Cell::new("Key").add_attribute(Attribute::Bold),
        Cell::new("Count").fg(Color::Cyan),
    ]);
    if let Some(col) = table.column_mut(0) {
        col.set_cell_alignment(CellAlignment::Right);
    }
    if let Some(col) = table.column_mut(2) {
        col.set_cell_alignment(CellAlignment::Right);
    }

    for row in chart {
        // Labels are "<rank>: <name>"; the rank already has its own column.
        let name = row
            .label
            .split_once(": ")
            .map_or(row.label.as_str(), |(_, name)| name);
        table.add_row(vec![
            Cell::new(row.rank),
            Cell::new(name),
            Cell::new(row.count).fg(Color::Cyan),
        ]);
    }
    table
}

pub fn total_line(total: Option<u64>, all_apps_total: Option<u64>) -> String {
    format!("Total Typed: {} / {}", count(total), count(all_apps_total))
}

pub fn print_ranking(chart: &[ChartRow], total: Option<u64>, all_apps_total: Option<u64>) {
    if chart.is_empty() {
        println!("No keystrokes recorded in this range.");
    } else {
        println!("\n{}", ranking_table(chart));
    }
    println!("{}", total_line(total, all_apps_total));
}

pub fn apps_table(apps: &[AppSummary], all_apps_total: Option<u64>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("ID").add_attribute(Attribute::Bold),
        Cell::new("Application").add_attribute(Attribute::Bold),
        Cell::new("Bundle"),
        Cell::new("Total").fg(Color::Cyan),
    ]);
    for i in [0, 3] {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    table.add_row(vec![
        Cell::new(""),
        Cell::new("All Apps").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(count(all_apps_total)).fg(Color::Cyan),
    ]);
    for app in apps {
        table.add_row(vec![
            Cell::new(app.info.id),
            Cell::new(&app.info.name),
            Cell::new(&app.info.bundle_id),
            Cell::new(count(app.total_count)).fg(Color::Cyan),
        ]);
    }
    table
}

pub fn print_apps(apps: &[AppSummary], all_apps_total: Option<u64>) {
    println!("\n{}", apps_table(apps, all_apps_total));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use keyfit_core::protocol::AppInfo;
    use keyfit_core::query::Preset;

    fn summary(id: i64, name: &str, total: Option<u64>) -> AppSummary {
        AppSummary {
            info: AppInfo {
                id,
                name: name.to_string(),
                bundle_id: format!("com.example.{}", id),
            },
            total_count: total,
        }
    }

    #[test]
    fn test_total_line_marks_missing() {
        assert_eq!(total_line(Some(12), Some(340)), "Total Typed: 12 / 340");
        assert_eq!(total_line(Some(12), None), "Total Typed: 12 / -");
    }

    #[test]
    fn test_ranking_table_strips_rank_prefix() {
        let chart = vec![
            ChartRow { rank: 1, label: "1: Space".into(), count: 40 },
            ChartRow { rank: 2, label: "2: E".into(), count: 30 },
        ];
        let rendered = ranking_table(&chart).to_string();
        assert!(rendered.contains("Space"));
        assert!(!rendered.contains("1: Space"));
        assert!(rendered.contains("40"));
    }

    #[test]
    fn test_apps_table_lists_all_apps_first() {
        let apps = vec![summary(1, "Editor", Some(10)), summary(2, "Browser", None)];
        let rendered = apps_table(&apps, Some(99)).to_string();
        let all = rendered.find("All Apps").unwrap();
        let editor = rendered.find("Editor").unwrap();
        assert!(all < editor);
        assert!(rendered.contains("99"));
    }

    #[test]
    fn test_scope_line_names_app() {
        let query = QueryState {
            start: NaiveDate::from_ymd_opt(2024, 6, 8),
            end: NaiveDate::from_ymd_opt(2024, 6, 15),
            app: AppFilter::App(2),
            preset: Preset::OneWeek,
        };
        let apps = vec![summary(2, "Browser", None)];
        assert_eq!(
            scope_line(&query, &apps),
            "2024-06-08 → 2024-06-15  [1 Week]  Browser"
        );
    }
}
