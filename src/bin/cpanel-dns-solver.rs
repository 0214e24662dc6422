use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cpanel_dns_solver::{ClientConfig, CpanelClient, Credentials};
use tokio::signal;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, rename_all = "kebab-case")]
struct Cli {
    /// cPanel base URL without a trailing slash (e.g. https://cpanel.example.com:2083)
    #[arg(long, env = "CPANEL_URL", value_name = "URL")]
    cpanel_url: String,
    /// Zone managed by cPanel (e.g. example.com.)
    #[arg(long, env = "CPANEL_ZONE", value_name = "ZONE")]
    zone: String,
    /// cPanel account name
    #[arg(long, env = "CPANEL_USERNAME", value_name = "USER")]
    username: Option<String>,
    /// cPanel account password
    #[arg(long, env = "CPANEL_PASSWORD", value_name = "PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// cPanel API token; preferred over the password when both are given
    #[arg(long, env = "CPANEL_API_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    api_token: Option<String>,
    /// Directory holding `username`, `password` and/or `apiToken` files
    #[arg(long, env = "CPANEL_SECRET_DIR", value_name = "PATH", conflicts_with_all = ["username", "password", "api_token"])]
    secret_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the TXT record unless one with the same value exists
    Present {
        /// Fully-qualified record name (e.g. _acme-challenge.example.com.)
        fqdn: String,
        /// Challenge value
        value: String,
    },
    /// Delete the TXT record carrying exactly this value, if present
    CleanUp {
        /// Fully-qualified record name (e.g. _acme-challenge.example.com.)
        fqdn: String,
        /// Challenge value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let credentials = build_credentials(&cli)?;
    let config = ClientConfig::new(&cli.cpanel_url, &cli.zone, credentials)
        .context("invalid client configuration")?;
    let client = CpanelClient::new(config);

    let run = async {
        match &cli.command {
            Command::Present { fqdn, value } => client
                .present(fqdn, value)
                .await
                .with_context(|| format!("failed to present TXT record for {fqdn}")),
            Command::CleanUp { fqdn, value } => client
                .clean_up(fqdn, value)
                .await
                .with_context(|| format!("failed to clean up TXT record for {fqdn}")),
        }
    };

    tokio::select! {
        res = run => res?,
        _ = interrupted() => bail!("interrupted before the operation finished"),
    }

    info!("done");
    Ok(())
}

fn build_credentials(cli: &Cli) -> Result<Credentials> {
    if let Some(dir) = &cli.secret_dir {
        return Credentials::from_secret_dir(dir)
            .with_context(|| format!("failed to load credentials from {}", dir.display()));
    }

    let Some(username) = cli.username.clone() else {
        bail!("--username or --secret-dir is required");
    };
    let credentials = Credentials {
        username,
        password: cli.password.clone().unwrap_or_default(),
        api_token: cli.api_token.clone().unwrap_or_default(),
    };
    if credentials.password.is_empty() && !credentials.uses_api_token() {
        bail!("--password or --api-token is required");
    }
    Ok(credentials)
}

async fn interrupted() {
    if let Err(err) = signal::ctrl_c().await {
        error!("failed to install CTRL+C handler: {err}");
        std::future::pending::<()>().await;
    }
    info!("interrupt signal received");
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
