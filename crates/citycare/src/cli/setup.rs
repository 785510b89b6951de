use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "citycare", bin_name = "citycare", version)]
#[command(about = "Report city problems, online or off", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (defaults to $CITYCARE_DATA, then the OS data dir)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data: Option<PathBuf>,

    /// Session token for the story API
    #[arg(
        long,
        global = true,
        env = "CITYCARE_TOKEN",
        hide_env_values = true,
        help_heading = "Options"
    )]
    pub token: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write, list and remove reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Inspect reports waiting for the network
    #[command(subcommand)]
    Outbox(OutboxCommands),

    /// Deliver queued reports
    Sync {
        /// Keep running and sync every SECS seconds
        #[arg(long, value_name = "SECS")]
        every: Option<u64>,
    },

    /// Show the live feed (favorites when offline)
    Feed {
        /// Only show reports whose reporter or description contains TERM
        #[arg(long, short, value_name = "TERM")]
        search: Option<String>,
    },

    /// Like, unlike and list liked reports
    #[command(subcommand)]
    Fav(FavCommands),

    /// Push notification subscription for the current session
    Notify {
        #[arg(value_enum, default_value = "status")]
        action: NotifyAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Write a new report and send it (queued when offline)
    Add(AddReport),

    /// List cached reports
    #[command(alias = "ls")]
    List,

    /// Remove a cached report
    #[command(alias = "rm")]
    Remove {
        /// Report id
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct AddReport {
    /// What is wrong, and where
    #[arg(long, short)]
    pub description: String,

    /// URL of a photo of the problem
    #[arg(long)]
    pub photo: Option<String>,

    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Queue without trying the network
    #[arg(long)]
    pub offline: bool,
}

#[derive(Subcommand, Debug)]
pub enum OutboxCommands {
    /// List queued reports
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand, Debug)]
pub enum FavCommands {
    /// Like a report, or unlike it if already liked
    Toggle {
        /// Report id
        id: String,
    },

    /// List liked reports
    #[command(alias = "ls")]
    List,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyAction {
    Status,
    On,
    Off,
}
