use super::{load_view, CmdError, Session, ViewArgs};
use crate::reports;
use clap::Args;
use keyfit_core::render::render_svg;
use keyfit_core::util::atomic_write;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct HeatmapArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Write the heatmap as an SVG document.
    #[arg(long)]
    pub svg: Option<PathBuf>,
}

pub async fn run(args: HeatmapArgs, session: Session) -> Result<(), CmdError> {
    let ctl = load_view(&args.view, session).await?;
    let heatmap = ctl.heatmap();

    reports::print_scope(ctl.query(), ctl.apps());
    reports::print_heatmap_grid(&heatmap, ctl.layout());

    if let Some(path) = &args.svg {
        atomic_write(path, render_svg(&heatmap, &ctl.config().geometry))?;
        info!("🖼  Heatmap written to {}", path.display());
    }
    Ok(())
}
