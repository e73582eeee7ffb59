use super::{require, CmdError, Session};
use crate::reports;
use chrono::Local;
use clap::Args;
use keyfit_core::controller::{Action, Slot};
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::warn;

pub async fn apps(session: Session) -> Result<(), CmdError> {
    let mut ctl = session.controller();
    ctl.start();
    ctl.settle_all().await;
    ctl.shutdown();

    require(&ctl, Slot::Apps)?;
    reports::print_apps(ctl.apps(), ctl.all_apps_total());
    Ok(())
}

pub async fn status(session: Session) -> Result<(), CmdError> {
    let mut ctl = session.controller();
    ctl.start();
    ctl.settle_all().await;
    ctl.shutdown();

    require(&ctl, Slot::Monitoring)?;
    println!("{}", ctl.status_label());
    Ok(())
}

pub async fn toggle(session: Session) -> Result<(), CmdError> {
    let mut ctl = session.controller();
    ctl.start();
    ctl.settle_all().await;
    ctl.dispatch(Action::ToggleMonitoring);
    ctl.settle_all().await;
    ctl.shutdown();

    require(&ctl, Slot::Monitoring)?;
    println!("{}", ctl.status_label());
    Ok(())
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Re-fetch the scope's totals every N seconds (0 disables).
    #[arg(long, default_value_t = 0)]
    pub refresh_secs: u64,
}

/// Prints the status on every change until Ctrl-C.
pub async fn watch(args: WatchArgs, session: Session) -> Result<(), CmdError> {
    let mut ctl = session.controller();
    ctl.start();
    ctl.settle_all().await;
    if !ctl.is_subscribed() {
        warn!("no monitoring subscription; status changes will not be shown");
    }

    let mut label = ctl.status_label();
    let mut total = ctl.total_count();
    print_line(label, total);

    let mut refresh = (args.refresh_secs > 0).then(|| {
        let mut ticker = interval(Duration::from_secs(args.refresh_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = tick(&mut refresh) => ctl.dispatch(Action::Refresh),
            _ = ctl.step() => {}
        }
        if ctl.status_label() != label || ctl.total_count() != total {
            label = ctl.status_label();
            total = ctl.total_count();
            print_line(label, total);
        }
    }

    ctl.shutdown();
    Ok(())
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn print_line(label: &str, total: Option<u64>) {
    let total = total.map_or_else(|| "-".to_string(), |t| t.to_string());
    println!("[{}] {}  typed: {}", Local::now().format("%H:%M:%S"), label, total);
}
