use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use liftstats::api::{self, state::AppState};
use liftstats::calculate;
use liftstats::config::AppConfig;
use liftstats::models::{parse_rows, DemographicFilter, Gender, LifterId};
use liftstats::rank::{percentile_label, percentile_rank};
use liftstats::sample::PopulationSampler;
use liftstats::store::{RestResultStore, ResultStore};

#[derive(Parser)]
#[command(name = "liftstats")]
#[command(about = "Weightlifting competition analytics")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print one athlete's derived metrics as JSON
    Profile {
        /// Athlete identifier in the results database
        lifter_id: String,

        /// Federation to query (usaw or iwf)
        #[arg(long, default_value = "usaw")]
        federation: String,
    },

    /// Sample a population and print its statistics as JSON
    Population {
        /// Filter by gender (M or F)
        #[arg(long)]
        gender: Option<String>,

        /// Filter by age category, e.g. "Junior"
        #[arg(long)]
        age_category: Option<String>,

        /// Filter by competition level, e.g. "National"
        #[arg(long)]
        level: Option<String>,

        /// Federation to query (usaw or iwf)
        #[arg(long, default_value = "usaw")]
        federation: String,

        /// Also rank this value within the named metric's distribution
        #[arg(long, requires = "value")]
        metric: Option<String>,

        #[arg(long, requires = "metric")]
        value: Option<f64>,
    },
}

fn parse_federation(raw: &str) -> Result<liftstats::models::Federation> {
    match raw {
        "usaw" => Ok(liftstats::models::Federation::Usaw),
        "iwf" => Ok(liftstats::models::Federation::Iwf),
        other => anyhow::bail!("unknown federation: {other}"),
    }
}

fn load_config(path: &str) -> Result<AppConfig> {
    let path_buf = PathBuf::from(path);
    if path_buf.exists() {
        AppConfig::from_file(&path_buf).with_context(|| format!("loading config from {path}"))
    } else {
        tracing::debug!("no config file at {path}, using defaults");
        Ok(AppConfig::default())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = load_config(&cli.config)?;
    let store: Arc<dyn ResultStore> =
        Arc::new(RestResultStore::new(&config.store).context("building result store")?);
    let sampler = PopulationSampler::new(store.clone(), config.sampler.settings());

    match cli.command {
        Commands::Serve { host, port } => {
            let mut server = config.server.clone();
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }

            tracing::info!("Starting liftstats v{}", env!("CARGO_PKG_VERSION"));
            let state = AppState::new(store, sampler);
            api::serve(&server, state).await?;
        }

        Commands::Profile {
            lifter_id,
            federation,
        } => {
            let federation = parse_federation(&federation)?;
            let rows = store
                .fetch_athlete_results(&LifterId::from(lifter_id.as_str()), federation)
                .await?;
            anyhow::ensure!(!rows.is_empty(), "no results for athlete {lifter_id}");

            let (results, report) = parse_rows(&rows);
            let metrics = calculate::extract_metrics(&results)
                .context("no parseable results for athlete")?;

            if report.skipped_rows > 0 {
                tracing::warn!(skipped = report.skipped_rows, "some rows could not be parsed");
            }
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }

        Commands::Population {
            gender,
            age_category,
            level,
            federation,
            metric,
            value,
        } => {
            let gender = gender
                .map(|g| {
                    Gender::parse(&g).ok_or_else(|| anyhow::anyhow!("unknown gender: {g}"))
                })
                .transpose()?;
            let filter = DemographicFilter {
                gender,
                age_category,
                competition_level: level,
                federation: parse_federation(&federation)?,
            };

            let stats = sampler.population_stats(&filter).await;
            println!("{}", serde_json::to_string_pretty(&stats)?);

            if let (Some(metric), Some(value)) = (metric, value) {
                let distribution = match metric.as_str() {
                    "success_rate" => &stats.success_rate.distribution,
                    "snatch_success_rate" => &stats.snatch_success_rate.distribution,
                    "clean_jerk_success_rate" => &stats.clean_jerk_success_rate.distribution,
                    "consistency_score" => &stats.consistency_score.distribution,
                    "clutch_rate" => &stats.clutch_rate.distribution,
                    "bounce_back_rate" => &stats.bounce_back_rate.distribution,
                    "q_score" => &stats.q_score.distribution,
                    other => anyhow::bail!("unknown metric: {other}"),
                };
                match percentile_rank(value, distribution) {
                    0 => println!("{metric} = {value}: no percentile available"),
                    p => println!("{metric} = {value}: {}", percentile_label(p)),
                }
            }
        }
    }

    Ok(())
}
