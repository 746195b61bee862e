use clap::Parser;
use signal_sentry::cli::{Cli, Commands};
use signal_sentry::config::Config;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // An invalid configuration is fatal before anything runs
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}: {}", cli.config, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = signal_sentry::telemetry::init_telemetry(&config.telemetry) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match execute(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Run(args) => {
            tracing::info!("Starting signal pipeline");
            args.execute(config).await?;
        }
        Commands::Analyze(args) => args.execute(config).await?,
        Commands::Scan(args) => args.execute(config).await?,
        Commands::Status => signal_sentry::cli::status::execute(config).await?,
        Commands::Config => {
            println!("Current configuration:");
            println!("  Symbols: {}", config.symbols.join(", "));
            println!(
                "  Indicators: RSI({}) {}/{}, MACD({},{},{}), BB({}, {}σ)",
                config.indicators.rsi_period,
                config.indicators.rsi_oversold,
                config.indicators.rsi_overbought,
                config.indicators.macd_fast,
                config.indicators.macd_slow,
                config.indicators.macd_signal,
                config.indicators.bb_period,
                config.indicators.bb_std_dev
            );
            println!(
                "  Consensus: rule={} model={} bonus={} penalty={}",
                config.consensus.rule_weight,
                config.consensus.model_weight,
                config.consensus.agreement_bonus,
                config.consensus.disagreement_penalty
            );
            println!(
                "  Pump: {}% in 15m, {}x volume, cooldown {}s",
                config.pump.price_threshold * rust_decimal_macros::dec!(100),
                config.pump.volume_threshold,
                config.pump.scan_cooldown_secs
            );
            println!(
                "  Risk: {} trades/day, loss limit {}%, RR >= {}, confidence >= {}",
                config.risk.max_daily_trades,
                config.risk.max_daily_loss * rust_decimal_macros::dec!(100),
                config.risk.min_risk_reward_ratio,
                config.risk.min_confidence
            );
            println!(
                "  Runtime: analysis every {}s, exits every {}s, stream={}",
                config.runtime.analysis_interval_secs,
                config.runtime.exit_check_interval_secs,
                config.runtime.stream_ticks
            );
        }
    }

    Ok(())
}
