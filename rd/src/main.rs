//! rd - Root Network portfolio, explorer and swap client
//!
//! CLI entry point.

use std::fs;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use rootdash::cli::{Cli, Command, OutputFormat, SwapCommand, get_log_path};
use rootdash::config::Config;
use rootdash::explorer::{ExplorerClient, Pagination, PortfolioSnapshot, data_of};
use rootdash::export::{self, EXPLORER_PREFIX, PORTFOLIO_PREFIX, SWAP_PREFIX};
use rootdash::swap::{SUPPORTED_TOKENS, SwapClient, SwapRequest, Token, find_token};

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Write to the log file so command output stays clean
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        "rootdash loaded config: explorer={}, swap={}, min-delay-ms={}",
        config.explorer.base_url, config.swap.base_url, config.scheduler.min_delay_ms
    );

    let format = cli.format;
    match cli.command {
        Command::Portfolio { address, export } => cmd_portfolio(&config, &format, &address, export).await,
        Command::Overview { per_page, export } => cmd_overview(&config, &format, per_page, export).await,
        Command::Address { address } => {
            let client = explorer(&config)?;
            print_response(&format, "Address", &client.address(&address).await?)
        }
        Command::Tokens { address } => {
            let client = explorer(&config)?;
            print_response(&format, "Token balances", &client.token_balances(&address).await?)
        }
        Command::Nfts { address, page } => {
            let client = explorer(&config)?;
            print_response(&format, "NFT balances", &client.nft_balances(&address, Pagination::page(page)).await?)
        }
        Command::Transfers { address, evm, page } => {
            let client = explorer(&config)?;
            let page = Pagination { page, per_page: None };
            if evm {
                print_response(&format, "EVM transfers", &client.evm_transfers(&address, page).await?)
            } else {
                print_response(&format, "Native transfers", &client.native_transfers(&address, page).await?)
            }
        }
        Command::Transactions { address, per_page } => {
            let client = explorer(&config)?;
            let body = client
                .evm_transactions(address.as_deref(), Pagination::per_page(per_page))
                .await?;
            print_response(&format, "EVM transactions", &body)
        }
        Command::Transaction { hash } => {
            let client = explorer(&config)?;
            print_response(&format, "EVM transaction", &client.evm_transaction(&hash).await?)
        }
        Command::Extrinsics { address, page } => {
            let client = explorer(&config)?;
            let page = Pagination { page, per_page: None };
            print_response(&format, "Extrinsics", &client.extrinsics(&address, page).await?)
        }
        Command::Extrinsic { hash } => {
            let client = explorer(&config)?;
            print_response(&format, "Extrinsic", &client.extrinsic(&hash).await?)
        }
        Command::Blocks { per_page } => {
            let client = explorer(&config)?;
            print_response(&format, "Blocks", &client.blocks(Pagination::per_page(per_page)).await?)
        }
        Command::Block { number } => {
            let client = explorer(&config)?;
            print_response(&format, "Block", &client.block(number).await?)
        }
        Command::Events { block } => {
            let client = explorer(&config)?;
            print_response(&format, "Events", &client.events(block).await?)
        }
        Command::Event { id } => {
            let client = explorer(&config)?;
            print_response(&format, "Event", &client.event(&id).await?)
        }
        Command::Swap { command } => cmd_swap(&config, &format, command).await,
        Command::Config => cmd_config(&config),
    }
}

fn explorer(config: &Config) -> Result<ExplorerClient> {
    ExplorerClient::from_config(&config.explorer, config.scheduler.clone())
}

/// Print a raw explorer response, unwrapping its `data` member for text output
fn print_response(format: &OutputFormat, title: &str, body: &Value) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(body)?),
        OutputFormat::Text => {
            println!("{}", title.bright_cyan().bold());
            println!("{}", serde_json::to_string_pretty(&data_of(body))?);
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Fetch and show a portfolio
async fn cmd_portfolio(config: &Config, format: &OutputFormat, address: &str, export: bool) -> Result<()> {
    let client = explorer(config)?;
    let snapshot = client.fetch_portfolio(address).await?;

    match format {
        OutputFormat::Json => print_json(&snapshot)?,
        OutputFormat::Text => print_portfolio(&snapshot),
    }

    if export {
        let path = export::write_export(&config.export.dir, PORTFOLIO_PREFIX, &snapshot, client.journal()).await?;
        println!("{} Exported to {}", "✓".green(), path.display());
    }
    Ok(())
}

fn print_portfolio(snapshot: &PortfolioSnapshot) {
    println!("{} {}", "Portfolio".bright_cyan().bold(), snapshot.address);
    if let Some(free) = snapshot.address_data["balance"]["freeFormatted"].as_str() {
        println!("  ROOT balance:     {}", free);
    }
    println!("  Tokens:           {}", PortfolioSnapshot::count(&snapshot.token_balances));
    println!("  NFTs:             {}", PortfolioSnapshot::count(&snapshot.nft_balances));
    println!("  Native transfers: {}", PortfolioSnapshot::count(&snapshot.native_transfers));
    println!("  EVM transfers:    {}", PortfolioSnapshot::count(&snapshot.evm_transfers));
    println!("  Extrinsics:       {}", PortfolioSnapshot::count(&snapshot.extrinsics));
    println!("  Fetched at:       {}", snapshot.fetched_at.to_rfc3339());
}

/// Fetch and show the latest chain activity
async fn cmd_overview(config: &Config, format: &OutputFormat, per_page: u32, export: bool) -> Result<()> {
    let client = explorer(config)?;
    let overview = client.fetch_overview(per_page).await?;

    match format {
        OutputFormat::Json => print_json(&overview)?,
        OutputFormat::Text => {
            println!("{}", "Latest EVM transactions".bright_cyan().bold());
            for tx in overview.evm_transactions.as_array().into_iter().flatten() {
                println!("  {}", tx["hash"].as_str().unwrap_or("-"));
            }
            println!("{}", "Latest blocks".bright_cyan().bold());
            for block in overview.blocks.as_array().into_iter().flatten() {
                println!("  #{}", block["number"]);
            }
        }
    }

    if export {
        let path = export::write_export(&config.export.dir, EXPLORER_PREFIX, &overview, client.journal()).await?;
        println!("{} Exported to {}", "✓".green(), path.display());
    }
    Ok(())
}

async fn cmd_swap(config: &Config, format: &OutputFormat, command: SwapCommand) -> Result<()> {
    if let SwapCommand::Tokens = command {
        return match format {
            OutputFormat::Json => print_json(&SUPPORTED_TOKENS),
            OutputFormat::Text => {
                println!("{}", "Supported tokens".bright_cyan().bold());
                for token in SUPPORTED_TOKENS {
                    println!(
                        "  {:<6} {:<14} {:<14} {} decimals",
                        token.symbol.to_uppercase(),
                        token.name,
                        token.network,
                        token.decimals
                    );
                }
                Ok(())
            }
        };
    }

    match &command {
        SwapCommand::MinAmount { from, to } | SwapCommand::Create { from, to, .. } => {
            supported_token(from)?;
            supported_token(to)?;
        }
        SwapCommand::Tokens | SwapCommand::Status { .. } => {}
    }

    let client = SwapClient::from_config(&config.swap, config.scheduler.clone())?;
    match command {
        SwapCommand::Tokens => Ok(()),
        SwapCommand::MinAmount { from, to } => {
            let min = client.min_amount(&from, &to).await?;
            match format {
                OutputFormat::Json => print_json(&min),
                OutputFormat::Text => {
                    println!("Minimum amount: {} {}", min.min_amount, from.to_uppercase());
                    Ok(())
                }
            }
        }
        SwapCommand::Create {
            from,
            to,
            amount,
            address,
            export,
        } => {
            let tx = client
                .create_transaction(&SwapRequest::new(&from, &to, amount, address))
                .await?;
            match format {
                OutputFormat::Json => print_json(&tx)?,
                OutputFormat::Text => {
                    println!("{} Swap created: {}", "✓".green(), tx.id.cyan());
                    println!("  Send {} {} to {}", tx.amount, tx.from_currency.to_uppercase(), tx.payin_address);
                    if let Some(extra) = &tx.payin_extra_id {
                        let name = tx.payin_extra_id_name.as_deref().unwrap_or("Extra ID");
                        println!("  {}: {}", name, extra);
                    }
                    println!(
                        "  Receive ~{} {} at {}",
                        tx.directed_amount,
                        tx.to_currency.to_uppercase(),
                        tx.payout_address
                    );
                }
            }
            if export {
                let path = export::write_export(&config.export.dir, SWAP_PREFIX, &tx, client.journal()).await?;
                println!("{} Exported to {}", "✓".green(), path.display());
            }
            Ok(())
        }
        SwapCommand::Status { id } => {
            let status = client.transaction_status(&id).await?;
            match format {
                OutputFormat::Json => print_json(&status),
                OutputFormat::Text => {
                    println!("{} {}", "Swap".bright_cyan().bold(), status.id);
                    println!("  Status:  {}", status.status);
                    println!(
                        "  Pair:    {} -> {}",
                        status.from_currency.to_uppercase(),
                        status.to_currency.to_uppercase()
                    );
                    if let Some(send) = status.expected_send_amount {
                        println!("  Send:    {}", send);
                    }
                    if let Some(receive) = status.expected_receive_amount {
                        println!("  Receive: {}", receive);
                    }
                    println!("  Updated: {}", status.updated_at);
                    Ok(())
                }
            }
        }
    }
}

/// Only tokens from the catalog can be swapped from the CLI
fn supported_token(symbol: &str) -> Result<&'static Token> {
    find_token(symbol).ok_or_else(|| eyre!("Unsupported token: {}. Run `rd swap tokens` to list them", symbol))
}

/// Print the effective configuration
fn cmd_config(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}
