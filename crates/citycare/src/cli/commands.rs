use super::render::{render_favorite_state, render_feed, render_records, render_sync_report};
use super::setup::{
    AddReport, Cli, Commands, FavCommands, NotifyAction, OutboxCommands, ReportCommands,
};
use anyhow::{Context, Result};
use citycareapp::api::{CityCareApi, SubmitOutcome};
use citycareapp::config::CityCareConfig;
use citycareapp::init::initialize;
use citycareapp::model::Record;
use citycareapp::remote::http::HttpRemote;
use citycareapp::store::fs::FileStore;
use clap::Parser;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct AppContext {
    api: CityCareApi<FileStore, HttpRemote>,
    config: CityCareConfig,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = initialize(cli.data.clone(), cli.token.clone())
        .context("could not open the citycare data directory")?;
    info!(data_dir = %ctx.data_dir.display(), "citycare ready");
    let mut ctx = AppContext {
        api: ctx.api,
        config: ctx.config,
    };

    match cli.command {
        Commands::Report(cmd) => match cmd {
            ReportCommands::Add(add) => handle_add(&mut ctx, add).await,
            ReportCommands::List => handle_report_list(&mut ctx),
            ReportCommands::Remove { id } => handle_report_remove(&mut ctx, &id),
        },
        Commands::Outbox(OutboxCommands::List) => handle_outbox_list(&mut ctx),
        Commands::Sync { every } => handle_sync(&mut ctx, every).await,
        Commands::Feed { search } => handle_feed(&mut ctx, search).await,
        Commands::Fav(cmd) => match cmd {
            FavCommands::Toggle { id } => handle_fav_toggle(&mut ctx, &id),
            FavCommands::List => handle_fav_list(&mut ctx),
        },
        Commands::Notify { action } => handle_notify(&mut ctx, action),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "citycare=debug,citycareapp=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn favorite_ids(ctx: &mut AppContext) -> Result<HashSet<String>> {
    Ok(ctx.api.favorite_ids()?.into_iter().collect())
}

async fn handle_add(ctx: &mut AppContext, add: AddReport) -> Result<()> {
    let mut record = Record::new(add.description);
    if let Some(photo) = add.photo {
        record = record.with_photo(photo);
    }
    if let (Some(lat), Some(lon)) = (add.lat, add.lon) {
        record = record.with_location(lat, lon);
    }

    if add.offline {
        ctx.api.enqueue(&record)?;
        println!("Queued {} for sync.", record.id);
        return Ok(());
    }

    match ctx.api.submit_report(&record).await? {
        SubmitOutcome::Sent => println!("Sent {}.", record.id),
        SubmitOutcome::Queued { reason } => {
            println!("Queued {} for sync ({}).", record.id, reason)
        }
    }
    Ok(())
}

fn handle_report_list(ctx: &mut AppContext) -> Result<()> {
    let favorites = favorite_ids(ctx)?;
    let reports = ctx.api.reports()?;
    print!("{}", render_records(&reports, &favorites, "No reports cached."));
    Ok(())
}

fn handle_report_remove(ctx: &mut AppContext, id: &str) -> Result<()> {
    if ctx.api.delete_report(id)? {
        println!("Removed {}.", id);
    } else {
        println!("No cached report {}.", id);
    }
    Ok(())
}

fn handle_outbox_list(ctx: &mut AppContext) -> Result<()> {
    let pending = ctx.api.pending()?;
    print!(
        "{}",
        render_records(&pending, &HashSet::new(), "Outbox is empty.")
    );
    Ok(())
}

async fn handle_sync(ctx: &mut AppContext, every: Option<u64>) -> Result<()> {
    let period = every
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .or_else(|| ctx.config.sync_interval());

    match period {
        None => {
            let report = ctx.api.sync().await?;
            print!("{}", render_sync_report(&report));
        }
        Some(period) => {
            println!(
                "Syncing every {}s, press Ctrl-C to stop.",
                period.as_secs()
            );
            let stop = wait_for_stop(tokio::signal::ctrl_c());
            ctx.api.sync_every(period, stop).await?;
            println!("Stopped.");
        }
    }
    Ok(())
}

/// Resolve once `signal` fires. If the handler cannot be installed, log it and
/// never resolve, so periodic sync keeps running until the process is killed.
async fn wait_for_stop<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!(error = %e, "cannot listen for Ctrl-C, periodic sync will not stop on its own");
        std::future::pending::<()>().await;
    }
}

async fn handle_feed(ctx: &mut AppContext, search: Option<String>) -> Result<()> {
    let favorites = favorite_ids(ctx)?;
    let term = search.unwrap_or_default();
    let feed = ctx.api.load_feed().await?;
    let shown = feed.search(&term);
    print!("{}", render_feed(feed, &shown, &favorites));
    Ok(())
}

fn handle_fav_toggle(ctx: &mut AppContext, id: &str) -> Result<()> {
    let state = ctx.api.toggle_favorite(id)?;
    print!("{}", render_favorite_state(id, state));
    Ok(())
}

fn handle_fav_list(ctx: &mut AppContext) -> Result<()> {
    let favorites = favorite_ids(ctx)?;
    let records = ctx.api.favorites()?;
    print!("{}", render_records(&records, &favorites, "No favorites yet."));
    Ok(())
}

fn handle_notify(ctx: &mut AppContext, action: NotifyAction) -> Result<()> {
    match action {
        NotifyAction::Status => {}
        NotifyAction::On => ctx.api.set_notifications(true)?,
        NotifyAction::Off => ctx.api.set_notifications(false)?,
    }
    let enabled = ctx.api.notifications_enabled()?;
    println!(
        "Notifications are {}.",
        if enabled { "on" } else { "off" }
    );
    Ok(())
}
