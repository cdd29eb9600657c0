mod app;
mod ui;

use std::io::{self, stdout};
use std::process;
use std::time::Duration;

use candy_mint::constants::{DEFAULT_COMPUTE_UNIT_LIMIT, DEFAULT_GROUP_LABEL};
use candy_mint::{Cluster, MintConfig, MintError, MintSession, SubmitOptions};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use serde::Serialize;
use solana_sdk::signature::{read_keypair_file, Keypair};
use tracing_subscriber::EnvFilter;

use app::lamports_to_sol;

#[derive(Parser)]
#[command(name = "candy-mint-tui")]
#[command(about = "Terminal client for Candy Machine v3 sales")]
struct Cli {
    /// Candy Machine account address
    #[arg(long, env = "CANDY_MACHINE_ID")]
    candy_machine: Option<String>,

    /// Path to the keypair JSON file (omit to browse read-only)
    #[arg(long, env = "KEYPAIR")]
    keypair: Option<String>,

    /// Solana cluster (localnet, devnet, testnet, mainnet-beta)
    #[arg(long, env = "CLUSTER", default_value = "mainnet-beta")]
    cluster: Cluster,

    /// Custom RPC endpoint; overrides the cluster default
    #[arg(long, env = "RPC_URL")]
    rpc_url: Option<String>,

    /// Candy Guard group to mint through
    #[arg(long, env = "MINT_GROUP", default_value = DEFAULT_GROUP_LABEL)]
    group: String,

    #[arg(long, env = "COMPUTE_UNIT_LIMIT", default_value_t = DEFAULT_COMPUTE_UNIT_LIMIT)]
    compute_unit_limit: u32,

    /// Seconds to wait for a mint to finalize
    #[arg(long, default_value_t = 90)]
    confirm_timeout: u64,

    /// Print progress/debug info to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Subcommand)]
enum Action {
    /// Read-only sale state dump
    Status,
    /// List displayable items
    Items,
    /// Mint one item through the configured group
    Mint,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Status => "status",
            Action::Items => "items",
            Action::Mint => "mint",
        }
    }
}

// ---------------------------------------------------------------------------
// JSON output types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(tag = "type")]
enum CliOutput {
    #[serde(rename = "success")]
    Success {
        action: String,
        signature: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<serde_json::Value>,
    },
    #[serde(rename = "error")]
    Error { action: String, error: String },
    #[serde(rename = "status")]
    Status(SaleStatus),
    #[serde(rename = "items")]
    Items(ItemList),
}

#[derive(Serialize)]
struct TokenRuleInfo {
    mint: String,
    amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<String>,
}

#[derive(Serialize)]
struct SaleStatus {
    candy_machine: String,
    candy_guard: Option<String>,
    group: String,
    group_found: bool,
    available_groups: Vec<String>,
    total_items: u64,
    redeemed_items: u64,
    remaining_items: u64,
    price: String,
    price_lamports: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_gate: Option<TokenRuleInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_payment: Option<TokenRuleInfo>,
    wallet: Option<String>,
    balance: Option<String>,
    can_mint: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocked: Option<String>,
}

#[derive(Serialize)]
struct ItemInfo {
    index: u32,
    name: String,
    image: String,
    uri: String,
}

#[derive(Serialize)]
struct ItemList {
    count: usize,
    items: Vec<ItemInfo>,
}

fn print_json(output: &CliOutput) {
    match serde_json::to_string(output) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

fn fail(action: &Action, err: &MintError) -> ! {
    print_json(&CliOutput::Error {
        action: action.name().into(),
        error: err.to_string(),
    });
    process::exit(1);
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

fn build_config(cli: &Cli) -> Result<MintConfig, MintError> {
    Ok(MintConfig {
        candy_machine: MintConfig::parse_candy_machine(cli.candy_machine.as_deref())?,
        cluster: cli.cluster,
        rpc_url: cli.rpc_url.clone(),
        group_label: cli.group.clone(),
        compute_unit_limit: cli.compute_unit_limit,
        submit: SubmitOptions {
            confirm_timeout: Duration::from_secs(cli.confirm_timeout),
            ..Default::default()
        },
        ..Default::default()
    })
}

fn load_keypair(path: &str) -> Result<Keypair, MintError> {
    read_keypair_file(path)
        .map_err(|e| MintError::Config(format!("failed to read keypair from {}: {}", path, e)))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "candy_mint=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let (config, keypair) = build_config(&cli)
        .and_then(|config| Ok((config, cli.keypair.as_deref().map(load_keypair).transpose()?)))
        .unwrap_or_else(|e| {
            eprintln!("{}", e);
            process::exit(1);
        });
    let session = MintSession::connect(config, keypair);

    match cli.action {
        Some(action) => {
            init_tracing(cli.verbose);
            run_oneshot(session, action);
            Ok(())
        }
        None => run_interactive(session, cli.verbose),
    }
}

fn run_interactive(session: MintSession, verbose: bool) -> io::Result<()> {
    // Panic hook: always restore terminal.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = app::App::new(session, verbose);
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    result
}

fn run_oneshot(session: MintSession, action: Action) {
    if let Err(e) = session.refresh_sale() {
        fail(&action, &e);
    }
    if let Err(e) = session.refresh_identity() {
        fail(&action, &e);
    }

    match action {
        Action::Status => print_json(&build_status_output(&session)),
        Action::Items => print_json(&build_items_output(&session)),
        Action::Mint => match session.purchase() {
            Ok(result) => print_json(&CliOutput::Success {
                action: action.name().into(),
                signature: result.signature.to_string(),
                details: Some(serde_json::json!({
                    "asset": result.minted_asset_id.to_string(),
                    "name": result.name,
                    "image": result.image,
                    "metadata_uri": result.metadata_uri,
                })),
            }),
            Err(e) => fail(&action, &e),
        },
    }
}

fn build_status_output(session: &MintSession) -> CliOutput {
    let Some(snapshot) = session.snapshot() else {
        return CliOutput::Error {
            action: "status".into(),
            error: "sale configuration not loaded".into(),
        };
    };
    let config = &snapshot.config;
    let identity = session.identity();
    let decision = candy_mint::evaluate(config, identity.map(|i| i.lamports));

    CliOutput::Status(SaleStatus {
        candy_machine: config.candy_machine.to_string(),
        candy_guard: config.candy_guard.map(|g| g.to_string()),
        group: session.config().group_label.clone(),
        group_found: config.cohort.is_some(),
        available_groups: config.cohort_labels.clone(),
        total_items: config.total_items,
        redeemed_items: config.redeemed_items,
        remaining_items: config.remaining_items(),
        price: format!("{} SOL", lamports_to_sol(decision.price_lamports)),
        price_lamports: decision.price_lamports,
        token_gate: decision.token_gate.map(|(mint, amount)| TokenRuleInfo {
            mint: mint.to_string(),
            amount,
            destination: None,
        }),
        token_payment: decision.token_payment.map(|(mint, amount, destination)| TokenRuleInfo {
            mint: mint.to_string(),
            amount,
            destination: Some(destination.to_string()),
        }),
        wallet: identity.map(|i| i.address.to_string()),
        balance: identity.map(|i| format!("{} SOL", lamports_to_sol(i.lamports))),
        can_mint: decision.allowed,
        blocked: decision
            .blocking_error(identity.map(|i| i.lamports))
            .map(|e| e.to_string()),
    })
}

fn build_items_output(session: &MintSession) -> CliOutput {
    let items: Vec<ItemInfo> = session
        .snapshot()
        .map(|s| {
            s.items
                .iter()
                .map(|item| ItemInfo {
                    index: item.index,
                    name: item.name.clone(),
                    image: item.image.clone(),
                    uri: item.uri.clone(),
                })
                .collect()
        })
        .unwrap_or_default();
    CliOutput::Items(ItemList {
        count: items.len(),
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_keypair_is_a_config_error() {
        let path = "/nonexistent/candy-mint/id.json";
        match load_keypair(path) {
            Err(MintError::Config(msg)) => assert!(msg.contains(path)),
            other => panic!("expected config error, got ok = {}", other.is_ok()),
        }
    }

    #[test]
    fn test_build_config_from_flags() {
        let cli = Cli::parse_from([
            "candy-mint-tui",
            "--candy-machine",
            "11111111111111111111111111111111",
            "--group",
            "OG",
            "status",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.group_label, "OG");
        assert!(config.candy_machine.is_some());
        assert!(matches!(cli.action, Some(Action::Status)));
    }
}
