use super::{load_view, CmdError, Session, ViewArgs};
use crate::reports;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct RankingArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Also write the ranking to this CSV file.
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

pub async fn run(args: RankingArgs, session: Session) -> Result<(), CmdError> {
    let ctl = load_view(&args.view, session).await?;

    reports::print_scope(ctl.query(), ctl.apps());
    reports::print_ranking(ctl.chart(), ctl.total_count(), ctl.all_apps_total());

    if let Some(path) = &args.csv {
        reports::export_ranking_csv(path, ctl.ranking(), ctl.key_names())?;
        info!("💾 Ranking written to {}", path.display());
    }
    Ok(())
}
