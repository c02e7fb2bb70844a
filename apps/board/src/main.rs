mod config;
mod render;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    unix_now, BoardEvent, BoardSnapshot, CoordinationController, HistoryClient, HttpStore,
    StoreTransport, SyncClient,
};
use schedule::{
    effective_now,
    history::{DEFAULT_APRIORI_DURATION_SECS, DEFAULT_SIGNIFICANT_CORRECTIONS},
};
use shared::{
    domain::{Table, TableName, TeamId},
    protocol::CorrectionFilter,
};
use tokio::{sync::broadcast::error::RecvError, time::MissedTickBehavior};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(name = "board", about = "Live board and admin console for coordination tables")]
struct Cli {
    /// Config file, `board.toml` by default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides `store_url` from the config.
    #[arg(long, global = true)]
    store_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every table once.
    Status,
    /// Keep printing the board as the store changes.
    Watch,
    /// Print one table, re-read from the store.
    Table { table: String },
    /// Start correcting `team`, the head of the queue when omitted.
    Start { table: String, team: Option<String> },
    Finish {
        table: String,
        /// Leave the table busy instead of calling the next team.
        #[arg(long)]
        no_call_next: bool,
    },
    Pause { table: String },
    Calling { table: String },
    Busy { table: String },
    /// Call `team`, the head of the queue when omitted.
    Call { table: String, team: Option<String> },
    Skip { table: String },
    Add {
        table: String,
        team: String,
        #[arg(long)]
        pos: Option<usize>,
    },
    Remove { table: String, team: String },
    Swap {
        table: String,
        first: String,
        second: String,
    },
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    List {
        #[arg(long)]
        table: Option<String>,
        #[arg(long)]
        team: Option<String>,
    },
    Add {
        table: String,
        team: String,
        start_time: i64,
        end_time: i64,
    },
    Delete { id: String },
    /// Expected duration of the next correction at `table`.
    Expected { table: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(store_url) = cli.store_url {
        settings.store_url = store_url;
    }
    debug!(?settings, "loaded settings");

    let transport: Arc<dyn StoreTransport> = Arc::new(
        HttpStore::new(&settings.store_url)
            .with_context(|| format!("invalid store url '{}'", settings.store_url))?,
    );
    let sync = SyncClient::new(Arc::clone(&transport));

    match cli.command {
        Command::Status => {
            sync.refresh().await.context("failed to load the board")?;
            print_board(&sync.snapshot().await, &settings);
        }
        Command::Watch => watch(&sync, &settings).await?,
        Command::Table { table } => {
            let table = sync.refresh_table(&TableName::new(table)).await?;
            print_table(&table, &settings);
        }
        Command::History(command) => history(HistoryClient::new(transport), command).await?,
        command => admin(CoordinationController::new(sync), command, &settings).await?,
    }

    Ok(())
}

async fn watch(sync: &Arc<SyncClient>, settings: &Settings) -> Result<()> {
    let mut events = sync.subscribe_events();
    let poller = sync.spawn_polling(settings.update_interval());
    info!(store_url = %settings.store_url, "watching board");

    // Projected starts move with the clock, so redraw between store changes.
    let mut redraw = tokio::time::interval(settings.update_interval());
    redraw.set_missed_tick_behavior(MissedTickBehavior::Delay);
    redraw.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = redraw.tick() => {
                let snapshot = sync.snapshot().await;
                if !snapshot.is_empty() {
                    print_board(&snapshot, settings);
                }
            }
            event = events.recv() => match event {
                Ok(BoardEvent::SnapshotUpdated { .. }) => {
                    print_board(&sync.snapshot().await, settings);
                    redraw.reset();
                }
                Ok(BoardEvent::RefreshFailed(reason)) => {
                    eprintln!("store unreachable, showing last known board: {reason}");
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
        }
    }

    poller.abort();
    Ok(())
}

async fn admin(
    controller: CoordinationController,
    command: Command,
    settings: &Settings,
) -> Result<()> {
    // The controller validates against the snapshot, so load it first.
    controller
        .sync()
        .refresh()
        .await
        .context("failed to load the board")?;

    let table = match &command {
        Command::Start { table, .. }
        | Command::Finish { table, .. }
        | Command::Pause { table }
        | Command::Calling { table }
        | Command::Busy { table }
        | Command::Call { table, .. }
        | Command::Skip { table }
        | Command::Add { table, .. }
        | Command::Remove { table, .. }
        | Command::Swap { table, .. } => TableName::new(table.as_str()),
        Command::Status | Command::Watch | Command::Table { .. } | Command::History(_) => {
            return Ok(())
        }
    };

    match command {
        Command::Start { team, .. } => {
            let team = team_or_head(&controller, &table, team).await?;
            controller.start_coordination(&table, team).await?;
        }
        Command::Finish { no_call_next, .. } => {
            controller
                .finish_coordination(&table, settings.call_next && !no_call_next)
                .await?;
        }
        Command::Pause { .. } => controller.pause_coordination(&table).await?,
        Command::Calling { .. } => controller.switch_to_calling(&table).await?,
        Command::Busy { .. } => controller.switch_to_busy(&table).await?,
        Command::Call { team, .. } => {
            let team = team_or_head(&controller, &table, team).await?;
            controller.call_team(&table, team).await?;
        }
        Command::Skip { .. } => controller.skip_to_next(&table).await?,
        Command::Add { team, pos, .. } => {
            controller
                .add_to_queue(&table, TeamId::new(team), pos)
                .await?;
        }
        Command::Remove { team, .. } => {
            controller
                .remove_from_queue(&table, TeamId::new(team))
                .await?;
        }
        Command::Swap { first, second, .. } => {
            controller
                .swap_teams_in_queue(&table, TeamId::new(first), TeamId::new(second))
                .await?;
        }
        Command::Status | Command::Watch | Command::Table { .. } | Command::History(_) => {}
    }

    match controller.sync().snapshot().await.table(&table) {
        Some(updated) => print_table(updated, settings),
        None => println!("{table}: ok"),
    }
    Ok(())
}

async fn team_or_head(
    controller: &CoordinationController,
    table: &TableName,
    team: Option<String>,
) -> Result<TeamId> {
    if let Some(team) = team {
        return Ok(TeamId::new(team));
    }
    let snapshot = controller.sync().snapshot().await;
    match snapshot.table(table).and_then(Table::head) {
        Some(head) => Ok(head.clone()),
        None => bail!("table {table} has no team queued"),
    }
}

async fn history(history: HistoryClient, command: HistoryCommand) -> Result<()> {
    match command {
        HistoryCommand::List { table, team } => {
            let filter = CorrectionFilter {
                table,
                team: team.map(TeamId::new),
                ..CorrectionFilter::default()
            };
            for correction in history.corrections(&filter).await? {
                println!(
                    "{:>6}  {:<8} {:<6} {:>5} min",
                    correction.id,
                    correction.table,
                    correction.team,
                    correction.duration() / 60
                );
            }
        }
        HistoryCommand::Add {
            table,
            team,
            start_time,
            end_time,
        } => {
            history
                .add(TeamId::new(team), &TableName::new(table), start_time, end_time)
                .await?;
        }
        HistoryCommand::Delete { id } => history.delete(&id).await?,
        HistoryCommand::Expected { table } => {
            let secs = history
                .expected_duration(
                    &TableName::new(table.as_str()),
                    DEFAULT_SIGNIFICANT_CORRECTIONS,
                    DEFAULT_APRIORI_DURATION_SECS,
                )
                .await?;
            println!("{table}: {} min", secs / 60);
        }
    }
    Ok(())
}

/// Board clock: wall time, never earlier than the competition start.
fn board_now(settings: &Settings) -> i64 {
    effective_now(unix_now(), settings.start_time)
}

fn print_board(snapshot: &BoardSnapshot, settings: &Settings) {
    print!("{}", render::board(snapshot, settings, board_now(settings)));
}

fn print_table(table: &Table, settings: &Settings) {
    print!("{}", render::table(table, settings, board_now(settings)));
}
