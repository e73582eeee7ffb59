use super::CmdError;
use clap::Args;
use keyfit_core::geometry::LayoutVariant;
use keyfit_core::prefs::{self, JsonFileStore};
use std::path::Path;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    /// JP or US. Prints the stored layout when omitted.
    pub variant: Option<LayoutVariant>,
}

pub fn run(args: &LayoutArgs, prefs_path: &Path) -> Result<(), CmdError> {
    let mut store = JsonFileStore::new(prefs_path);
    if let Some(variant) = args.variant {
        prefs::save_layout(&mut store, variant)?;
        info!("⌨️  Layout set to {} in {}", variant, prefs_path.display());
    }
    println!("{}", prefs::load_layout(&store));
    Ok(())
}
