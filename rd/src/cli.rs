//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// rootdash - Root Network portfolio, explorer and swap client
#[derive(Parser)]
#[command(
    name = "rd",
    about = "Rate-limited Rootscan explorer and ChangeNOW swap client for The Root Network",
    version,
    after_help = "Logs are written to: ~/.local/share/rootdash/logs/rootdash.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Fetch balances, transfers and extrinsics for an address
    Portfolio {
        address: String,

        /// Write the snapshot and raw responses to a JSON file
        #[arg(short, long)]
        export: bool,
    },

    /// Show the latest EVM transactions and blocks
    Overview {
        /// Number of items per list
        #[arg(short = 'n', long, default_value = "10")]
        per_page: u32,

        /// Write the overview and raw responses to a JSON file
        #[arg(short, long)]
        export: bool,
    },

    /// Show account details for an address
    Address { address: String },

    /// Show token balances for an address
    Tokens { address: String },

    /// Show NFT balances for an address
    Nfts {
        address: String,

        #[arg(short, long, default_value = "0")]
        page: u32,
    },

    /// Show native (or EVM) transfers for an address
    Transfers {
        address: String,

        /// EVM transfers instead of native ones
        #[arg(long)]
        evm: bool,

        #[arg(short, long)]
        page: Option<u32>,
    },

    /// Show latest EVM transactions, optionally for one address
    Transactions {
        #[arg(short, long)]
        address: Option<String>,

        #[arg(short = 'n', long, default_value = "100")]
        per_page: u32,
    },

    /// Show one EVM transaction
    Transaction { hash: String },

    /// Show extrinsics signed by an address
    Extrinsics {
        address: String,

        #[arg(short, long)]
        page: Option<u32>,
    },

    /// Show one extrinsic
    Extrinsic { hash: String },

    /// Show latest blocks
    Blocks {
        #[arg(short = 'n', long, default_value = "10")]
        per_page: u32,
    },

    /// Show one block
    Block { number: u64 },

    /// Show the events of a block
    Events { block: u64 },

    /// Show one event (`<block>-<index>`)
    Event { id: String },

    /// Token swaps through ChangeNOW
    Swap {
        #[command(subcommand)]
        command: SwapCommand,
    },

    /// Print the effective configuration as YAML
    Config,
}

/// Swap subcommands
#[derive(Subcommand)]
pub enum SwapCommand {
    /// List supported tokens
    Tokens,

    /// Minimum amount accepted for a pair
    MinAmount { from: String, to: String },

    /// Create a swap transaction
    Create {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long)]
        amount: String,

        /// Recipient address for the swapped funds
        #[arg(long)]
        address: String,

        /// Write the transaction and raw responses to a JSON file
        #[arg(short, long)]
        export: bool,
    },

    /// Check the status of a swap transaction
    Status { id: String },
}

/// Output format for command results
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Path of the log file
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rootdash")
        .join("logs")
        .join("rootdash.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_portfolio() {
        let cli = Cli::parse_from(["rd", "portfolio", "0xabc"]);
        assert!(matches!(
            cli.command,
            Command::Portfolio { ref address, export: false } if address == "0xabc"
        ));
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn test_cli_parse_portfolio_export() {
        let cli = Cli::parse_from(["rd", "portfolio", "0xabc", "--export"]);
        assert!(matches!(cli.command, Command::Portfolio { export: true, .. }));
    }

    #[test]
    fn test_cli_parse_transfers_evm() {
        let cli = Cli::parse_from(["rd", "transfers", "0xabc", "--evm", "--page", "2"]);
        if let Command::Transfers { address, evm, page } = cli.command {
            assert_eq!(address, "0xabc");
            assert!(evm);
            assert_eq!(page, Some(2));
        } else {
            panic!("Expected Transfers command");
        }
    }

    #[test]
    fn test_cli_parse_block() {
        let cli = Cli::parse_from(["rd", "block", "20959992"]);
        assert!(matches!(cli.command, Command::Block { number: 20959992 }));
        assert!(Cli::try_parse_from(["rd", "block", "latest"]).is_err());
    }

    #[test]
    fn test_cli_parse_swap_create() {
        let cli = Cli::parse_from([
            "rd", "swap", "create", "--from", "btc", "--to", "root", "--amount", "0.1", "--address", "rAddr",
        ]);
        if let Command::Swap {
            command: SwapCommand::Create { from, to, amount, address, export },
        } = cli.command
        {
            assert_eq!(from, "btc");
            assert_eq!(to, "root");
            assert_eq!(amount, "0.1");
            assert_eq!(address, "rAddr");
            assert!(!export);
        } else {
            panic!("Expected Swap Create command");
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["rd", "blocks", "--format", "json", "-v", "-c", "/path/to/config.yml"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.yml")));
    }

    #[test]
    fn test_output_format_from_str() {
        assert!(matches!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text)));
        assert!(matches!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_log_path() {
        assert!(get_log_path().ends_with("rootdash/logs/rootdash.log"));
    }
}
