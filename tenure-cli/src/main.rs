mod handlers;
mod server;
mod sweep;

use clap::{Parser, Subcommand};
use tenure_core::types::DEFAULT_DURATION_IN_SECS;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tenure",
    about = "Tenure — lease-based service registry with automatic eviction",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP registry and the eviction sweep
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8761", env = "TENURE_PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0", env = "TENURE_HOST")]
        host: String,

        /// Lease duration for instances that do not request one
        #[arg(
            long,
            default_value_t = DEFAULT_DURATION_IN_SECS,
            value_parser = clap::value_parser!(u32).range(1..),
            env = "TENURE_LEASE_DURATION_SECS"
        )]
        lease_duration_secs: u32,

        /// How often expired leases are swept, in milliseconds
        #[arg(
            long,
            default_value = "60000",
            value_parser = clap::value_parser!(u64).range(1..),
            env = "TENURE_EVICTION_INTERVAL_MS"
        )]
        eviction_interval_ms: u64,

        /// Bearer token required on every route but /health
        #[arg(long, env = "TENURE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            host,
            lease_duration_secs,
            eviction_interval_ms,
            api_key,
        } => {
            server::run(server::ServerConfig {
                host,
                port,
                lease_duration_secs,
                eviction_interval_ms,
                api_key,
            })
            .await?;
        }
        Commands::Version => {
            println!("tenure {}", env!("CARGO_PKG_VERSION"));
            println!("Lease-based service registry");
        }
    }

    Ok(())
}
