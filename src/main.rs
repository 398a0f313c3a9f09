use anyhow::Context;
use clap::Parser;
use simocollector::collector::SysinfoCollector;
use simocollector::config::{Config, DEFAULT_CONFIG_PATH};
use simocollector::dispatcher::Registry;
use simocollector::error::LOGGING_SETUP_EXIT_CODE;
use simocollector::models::Delivered;
use simocollector::transport::HttpTransport;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[derive(Parser, Debug)]
#[command(
    name = "simo-collection-publish",
    about = "Sample one metric family and publish it to the SIMO server",
    version
)]
struct Cli {
    /// Metric family: memory, loadavg, cpu, diskusage, diskio, networktraffic
    #[arg(short = 't', long = "type")]
    family: String,

    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Print the server response (or rejection body) to stdout
    #[arg(short, long)]
    output: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("log level {:?}", level))?,
    };
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("init logging: {}", e))
}

/// Shell-quoted values sometimes reach us with their quotes intact (cron files).
fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"').trim_matches('\'')
}

async fn publish(cli: &Cli) -> simocollector::Result<Delivered> {
    let config = Config::load(strip_quotes(&cli.config))?;
    let sender = Registry::builtin().build_sender(strip_quotes(&cli.family))?;
    let collector = SysinfoCollector::new();
    let transport = HttpTransport::new();
    sender.send(&config, &collector, &transport).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("{:#}", e);
        return ExitCode::from(LOGGING_SETUP_EXIT_CODE);
    }

    match publish(&cli).await {
        Ok(delivered) => {
            if cli.output {
                for body in delivered.bodies() {
                    println!("{}", body);
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(family = %cli.family, error = %e, "publish failed");
            if cli.output {
                match e.response_body() {
                    Some(body) => println!("{}", body),
                    None => println!("{}", e),
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}
