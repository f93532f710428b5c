use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "rifa")]
#[command(about = "Track raffle ticket sales from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the JSON config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reserve a ticket number for a buyer
    Reserve {
        /// Group (class) the ticket belongs to
        group: String,
        /// Ticket number
        number: u32,
        /// Buyer name
        #[arg(long)]
        name: Option<String>,
        /// Buyer phone
        #[arg(long)]
        phone: Option<String>,
    },
    /// Record a sale by hand (admin only)
    Add {
        /// Group (class) the ticket belongs to
        group: String,
        /// Ticket number
        number: u32,
        /// Buyer name
        #[arg(long)]
        name: Option<String>,
        /// Buyer phone
        #[arg(long)]
        phone: Option<String>,
        /// Initial status (defaults to pago)
        #[arg(long, value_name = "STATUS")]
        status: Option<String>,
    },
    /// List recorded sales
    List {
        /// Only show sales of this group
        #[arg(long)]
        group: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show ticket numbers still free in a group
    Available {
        /// Group (class) to inspect
        group: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a sale locally (admin only)
    Remove {
        /// Sale ID
        id: String,
    },
    /// Change the status of a sale (admin only)
    Status {
        /// Sale ID
        id: String,
        /// New status: reservado, pago or cancelado
        status: String,
    },
    /// Show sale totals per status and group
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export sales
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Push unsynced sales to the remote endpoint
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
    },
    /// Load the remote sheet and merge it into the local ledger
    Pull,
    /// Keep syncing and follow sales from other sessions until Ctrl-C
    Watch,
    /// Manage the admin session
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl From<ExportFormat> for rifa_core::export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Csv => Self::Csv,
            ExportFormat::Json => Self::Json,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// List ticket numbers held by more than one active sale
    Conflicts {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Start an admin session
    Login {
        /// Admin password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show whether an admin session is active
    Status,
    /// End the admin session
    Logout,
}
