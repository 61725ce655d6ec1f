//! Command Line Interface for the concentrated-liquidity yield vault.
//!
//! Every command runs against an in-process pool: `deploy` bootstraps a
//! vault, `quote` estimates the yield of a commitment after simulated
//! trading, and `demo` walks a depositor through the full lifecycle.
mod deploy;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clmm_vault_domain::U256;
use clmm_vault_domain::entities::YieldRecord;
use clmm_vault_domain::fees::FeeTier;
use clmm_vault_domain::math::price_tick::token1_for_token0;
use clmm_vault_domain::token::Address;
use clmm_vault_execution::config::VaultConfig;
use clmm_vault_execution::quote::SingleQuote;
use clmm_vault_protocols::{PoolClient, TokenClient};
use clmm_vault_simulation::prelude::{
    LogNormalVolume, SimulationConfig, SwapSimulator, UniformVolume, VolumeModel,
};
use deploy::{DECIMALS, LocalDeployment, units};
use dotenv::dotenv;
use prettytable::{Table, row};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const TRADER: u64 = 0x7100;
const DEPOSITOR: u64 = 0xD100;
const SECS_PER_DAY: u64 = 86_400;

#[derive(Parser)]
#[command(name = "clmm-vault")]
#[command(about = "Concentrated liquidity yield vault CLI", long_about = None)]
struct Cli {
    /// JSON vault configuration file
    #[arg(long, global = true, env = "VAULT_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    pool: PoolArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct PoolArgs {
    /// Initial price of token0 in token1
    #[arg(long, global = true, env = "VAULT_PRICE", default_value = "1")]
    price: Decimal,

    /// Pool fee in hundredths of a basis point
    #[arg(long, global = true, env = "VAULT_FEE", default_value_t = 500)]
    fee: u32,

    /// Whole token0 units the manager is seeded with
    #[arg(long, global = true, env = "VAULT_SEED_UNITS", default_value_t = 100_000)]
    seed_units: u64,
}

#[derive(clap::Args)]
struct FlowArgs {
    /// Fee collection rounds to simulate
    #[arg(long, default_value_t = 7)]
    rounds: usize,

    /// Random trades per round
    #[arg(long, default_value_t = 100)]
    swaps_per_round: usize,

    /// Trade size distribution
    #[arg(long, value_enum, default_value_t = Volume::Uniform)]
    volume: Volume,

    /// Largest trade in whole token0 units
    #[arg(long, default_value_t = 1000)]
    max_swap_units: u64,

    /// Random seed
    #[arg(long, env = "VAULT_SIM_SEED", default_value_t = 42)]
    seed: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum Volume {
    /// Uniform whole-unit sizes from 1 to the maximum
    Uniform,
    /// Log-normal sizes capped at the maximum
    LogNormal,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a vault and show its initial range
    Deploy,
    /// Quote a single-sided commitment after simulated trading
    Quote {
        /// Whole token0 units to commit
        #[arg(long, default_value_t = 10)]
        amount0: u64,

        /// Commitment in days
        #[arg(long, default_value_t = 30)]
        duration_days: u64,

        #[command(flatten)]
        flow: FlowArgs,
    },
    /// Deposit, trade, collect and close in one run
    Demo {
        /// Whole token0 units to deposit, paired with token1 at the current price
        #[arg(long, default_value_t = 1000)]
        deposit: u64,

        /// Commitment in days
        #[arg(long, default_value_t = 7)]
        duration_days: u64,

        #[command(flatten)]
        flow: FlowArgs,
    },
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => VaultConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => VaultConfig::default(),
    };
    let fee = FeeTier::from_pips(cli.pool.fee).context("unsupported fee tier")?;
    let mut vault = LocalDeployment::deploy(config, cli.pool.price, fee, cli.pool.seed_units)?;

    match &cli.command {
        Commands::Deploy => print_deployment(&vault),
        Commands::Quote {
            amount0,
            duration_days,
            flow,
        } => {
            let records = simulate(&mut vault, flow)?;
            print_history(&records);

            let quote = vault
                .registry
                .quote_single(
                    vault.key.token0,
                    vault.key.token1,
                    units(*amount0),
                    duration_days * SECS_PER_DAY,
                )
                .context("quote failed")?;
            print_quote(units(*amount0), &quote);
        }
        Commands::Demo {
            deposit,
            duration_days,
            flow,
        } => run_demo(&mut vault, *deposit, *duration_days, flow)?,
    }

    Ok(())
}

fn simulate(vault: &mut LocalDeployment, flow: &FlowArgs) -> Result<Vec<YieldRecord>> {
    let config = SimulationConfig::default()
        .with_swaps(flow.swaps_per_round)
        .with_seed(flow.seed);
    match flow.volume {
        Volume::Uniform => {
            let volume = UniformVolume::new(1, flow.max_swap_units, DECIMALS)?;
            run_with(vault, volume, config, flow)
        }
        Volume::LogNormal => {
            let volume = LogNormalVolume::new(2.0, 1.5, flow.max_swap_units, DECIMALS)?;
            run_with(vault, volume, config, flow)
        }
    }
}

fn run_with<V: VolumeModel>(
    vault: &mut LocalDeployment,
    volume: V,
    config: SimulationConfig,
    flow: &FlowArgs,
) -> Result<Vec<YieldRecord>> {
    let mut simulator = SwapSimulator::new(
        vault.pool.clone(),
        Address::from_low_u64_be(TRADER),
        volume,
        config,
    )?;
    simulator.fund_trader(units(1_000_000_000), units(1_000_000_000));

    println!(
        "🚀 Simulating {} rounds of {} swaps...",
        flow.rounds, flow.swaps_per_round
    );
    vault.run_rounds(&mut simulator, flow.rounds, flow.swaps_per_round)
}

fn run_demo(
    vault: &mut LocalDeployment,
    deposit: u64,
    duration_days: u64,
    flow: &FlowArgs,
) -> Result<()> {
    print_deployment(vault);

    let depositor = Address::from_low_u64_be(DEPOSITOR);
    let amount0 = units(deposit);
    let amount1 = token1_for_token0(amount0, vault.pool.slot0().sqrt_price_x96)?;
    let spender = vault.registry.address();
    let token0 = vault.pool.local_token0();
    let token1 = vault.pool.local_token1();
    token0.mint(depositor, amount0);
    token1.mint(depositor, amount1);
    token0.approve(depositor, spender, amount0)?;
    token1.approve(depositor, spender, amount1)?;

    let position = vault
        .registry
        .deposit(
            depositor,
            vault.key.token0,
            vault.key.token1,
            amount0,
            amount1,
            depositor,
            duration_days * SECS_PER_DAY,
        )
        .context("deposit failed")?;
    println!(
        "✅ Deposited {} / {} for {} days ({} shares)",
        format_units(position.amount0),
        format_units(position.amount1),
        duration_days,
        position.shares
    );

    let records = simulate(vault, flow)?;
    print_history(&records);

    let quote = vault
        .registry
        .quote_single(
            vault.key.token0,
            vault.key.token1,
            amount0,
            duration_days * SECS_PER_DAY,
        )
        .context("quote failed")?;
    print_quote(amount0, &quote);

    let closed = vault.registry.close(depositor).context("close failed")?;
    let mut table = Table::new();
    table.add_row(row!["Payout", "Token0", "Token1"]);
    table.add_row(row![
        "Principal",
        format_units(closed.withdrawal.amount0),
        format_units(closed.withdrawal.amount1)
    ]);
    table.add_row(row![
        "Fees",
        format_units(closed.withdrawal.fees0),
        format_units(closed.withdrawal.fees1)
    ]);
    println!("\n📊 Position closed after {} s", closed.elapsed_secs);
    table.printstd();
    println!(
        "Commitment {}",
        if closed.commitment_met { "met" } else { "not met" }
    );

    let stats = vault.registry.lifecycle().aggregate_stats();
    println!(
        "Lifecycle: {} pools, {} rounds, {} open / {} closed positions",
        stats.pools, stats.rounds, stats.open_positions, stats.closed_positions
    );
    Ok(())
}

fn print_deployment(vault: &LocalDeployment) {
    let slot0 = vault.pool.slot0();
    let mut table = Table::new();
    table.add_row(row!["Pool", vault.key.to_string()]);
    table.add_row(row!["Pool address", format!("{:?}", vault.pool.address())]);
    table.add_row(row!["Registry", vault.registry.id().to_string()]);
    table.add_row(row!["Tick", slot0.tick.to_string()]);
    if let Some(manager) = vault.registry.manager(&vault.key) {
        table.add_row(row!["Manager", format!("{:?}", manager.address())]);
        table.add_row(row![
            "Range",
            format!(
                "[{}, {})",
                manager.tick_lower().unwrap_or_default(),
                manager.tick_upper().unwrap_or_default()
            )
        ]);
        table.add_row(row!["Liquidity", manager.current_liquidity().to_string()]);
    }
    println!("\n📡 Vault deployed");
    table.printstd();
}

fn print_history(records: &[YieldRecord]) {
    let mut table = Table::new();
    table.add_row(row!["Round", "Fees0", "Fees1", "Liquidity", "Time"]);
    for record in records {
        let time = chrono::DateTime::from_timestamp(i64::try_from(record.timestamp).unwrap_or_default(), 0)
            .unwrap_or_default();
        table.add_row(row![
            record.round_index,
            format_units(record.fees0),
            format_units(record.fees1),
            record.liquidity_snapshot,
            time.format("%Y-%m-%d %H:%M")
        ]);
    }
    println!("\n📊 Yield history");
    table.printstd();
}

fn print_quote(amount0: U256, quote: &SingleQuote) {
    let (amount1, fees0, fees1) = quote.amounts();
    let mut table = Table::new();
    table.add_row(row!["Amount0", format_units(amount0)]);
    table.add_row(row!["Amount1", format_units(amount1)]);
    table.add_row(row!["Periods", quote.quote.periods]);
    table.add_row(row!["Rounds used", quote.quote.rounds_used]);
    table.add_row(row!["Expected fees0", format_units(fees0)]);
    table.add_row(row!["Expected fees1", format_units(fees1)]);
    match &quote.apy {
        Some(apy) => table.add_row(row![
            "APY",
            format!("{:.2}%", apy.estimated_annual_return * Decimal::from(100))
        ]),
        None => table.add_row(row!["APY", "insufficient history"]),
    };
    println!("\n📈 Quote");
    table.printstd();
}

/// Raw amount as whole units, falling back to the raw value when too large.
fn format_units(value: U256) -> String {
    if value > U256::from(i128::MAX as u128) {
        return value.to_string();
    }
    Decimal::try_from_i128_with_scale(value.low_u128() as i128, u32::from(DECIMALS))
        .map(|d| d.normalize().to_string())
        .unwrap_or_else(|_| value.to_string())
}
