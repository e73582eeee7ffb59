pub mod heatmap;
pub mod layout;
pub mod monitor;
pub mod ranking;

use crate::gateway::HttpGateway;
use chrono::NaiveDate;
use clap::Args;
use keyfit_core::config::Config;
use keyfit_core::controller::{Action, Controller, ControllerOptions, FetchState, Slot};
use keyfit_core::error::{KeyFitError, PreferenceError};
use keyfit_core::geometry::LayoutDefinition;
use keyfit_core::keycodes::KeyNameRegistry;
use keyfit_core::prefs::JsonFileStore;
use keyfit_core::query::{AppFilter, Preset};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CmdError {
    #[error(transparent)]
    Core(#[from] KeyFitError),

    #[error(transparent)]
    Preference(#[from] PreferenceError),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Backend did not deliver {0} data")]
    Unavailable(Slot),
}

/// Everything resolved from the global flags before a command runs.
pub struct Session {
    pub backend: String,
    pub poll_interval: Duration,
    pub prefs: PathBuf,
    pub config: Config,
    pub key_names: KeyNameRegistry,
    pub custom_layout: Option<LayoutDefinition>,
}

impl Session {
    pub fn controller(self) -> Controller<HttpGateway> {
        let gateway = Arc::new(HttpGateway::new(&self.backend, self.poll_interval));
        let mut options = ControllerOptions::builder()
            .config(self.config)
            .preferences(Box::new(JsonFileStore::new(&self.prefs)))
            .key_names(self.key_names)
            .build();
        options.custom_layout = self.custom_layout;
        Controller::new(gateway, options)
    }
}

/// Scope selection shared by the ranking and heatmap views.
#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    #[command(flatten)]
    pub config: Config,

    /// Restrict to one application id (see `keyfit apps`).
    #[arg(short, long)]
    pub app: Option<i64>,

    /// All, 1y, 6m, 3m, 1m, 1w.
    #[arg(short, long, conflicts_with_all = ["start", "end"])]
    pub preset: Option<Preset>,

    #[arg(long)]
    pub start: Option<NaiveDate>,

    #[arg(long)]
    pub end: Option<NaiveDate>,
}

impl ViewArgs {
    pub fn actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(preset) = self.preset {
            actions.push(Action::SelectPreset(preset));
        }
        if let Some(start) = self.start {
            actions.push(Action::EditStartDate(Some(start)));
        }
        if let Some(end) = self.end {
            actions.push(Action::EditEndDate(Some(end)));
        }
        if let Some(id) = self.app {
            actions.push(Action::SelectApp(AppFilter::App(id)));
        }
        actions
    }
}

/// Starts a controller, applies the scope, and waits until every fetch
/// has settled.
pub async fn load_view(
    args: &ViewArgs,
    session: Session,
) -> Result<Controller<HttpGateway>, CmdError> {
    let mut ctl = session.controller();
    ctl.start();
    for action in args.actions() {
        ctl.dispatch(action);
    }
    ctl.settle_all().await;
    ctl.shutdown();

    require(&ctl, Slot::Ranking)?;
    if args.preset == Some(Preset::All) {
        require(&ctl, Slot::DateBounds)?;
    }
    Ok(ctl)
}

pub fn require(ctl: &Controller<HttpGateway>, slot: Slot) -> Result<(), CmdError> {
    match ctl.fetch_state(slot) {
        FetchState::Failed => Err(CmdError::Unavailable(slot)),
        _ => Ok(()),
    }
}
