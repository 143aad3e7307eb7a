pub mod client;
pub mod error;
pub mod reconcile;
mod settings;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser};
use libece::{ApiUrl, Credentials, Secret, Service, State};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use client::Client;
use error::{Error, Result};
use reconcile::{CertificateParams, InstanceParams, Outcome, Report};
use settings::Settings;

use shadow_rs::shadow;

shadow!(build);

/// Declaratively manage ECE certificates and instances
#[derive(clap::Parser)]
#[command(name = "ece")]
struct Arguments {
    /// Base URL of the API, overrides api.url from the settings
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    mail: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long, short = 'N', action=ArgAction::SetTrue)]
    no_config_file: Option<bool>,
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Clone)]
enum Command {
    /// Upload a certificate or delete it by name
    Certificate {
        #[arg(long)]
        state: State,
        #[arg(long)]
        name: String,
        /// PEM encoded private key
        #[arg(long)]
        key: Option<PathBuf>,
        /// PEM encoded certificate
        #[arg(long)]
        cert: Option<PathBuf>,
        /// PEM encoded certificate chain
        #[arg(long)]
        chain: Option<PathBuf>,
    },
    /// Create, update or delete an instance and its services
    Instance {
        #[arg(long)]
        state: State,
        #[arg(long)]
        name: String,
        /// YAML or JSON file with the list of services
        #[arg(long)]
        services: Option<PathBuf>,
    },
    Version,
}

enum Params {
    Certificate(CertificateParams),
    Instance(InstanceParams),
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::ReadFile(path.to_path_buf(), e))
}

fn read_optional(path: Option<&Path>) -> Result<Option<String>> {
    path.map(read_file).transpose()
}

fn read_services(path: &Path) -> Result<Vec<Service>> {
    let content = read_file(path)?;
    serde_yaml::from_str(&content).map_err(|e| Error::Services(path.to_path_buf(), e))
}

impl Params {
    fn from_command(command: Command) -> Result<Option<Self>> {
        let params = match command {
            Command::Certificate {
                state,
                name,
                key,
                cert,
                chain,
            } => Params::Certificate(CertificateParams {
                state,
                name,
                key: read_optional(key.as_deref())?,
                cert: read_optional(cert.as_deref())?,
                chain: read_optional(chain.as_deref())?,
            }),
            Command::Instance {
                state,
                name,
                services,
            } => Params::Instance(InstanceParams {
                state,
                name,
                services: services.as_deref().map(read_services).transpose()?,
            }),
            Command::Version => return Ok(None),
        };
        Ok(Some(params))
    }

    async fn reconcile(
        &self,
        api: &dyn client::Api,
        credentials: &Credentials,
    ) -> Result<Outcome> {
        match self {
            Params::Certificate(params) => {
                reconcile::certificate::reconcile(api, credentials, params).await
            }
            Params::Instance(params) => {
                reconcile::instance::reconcile(api, credentials, params).await
            }
        }
    }
}

/// Where and as whom to connect, CLI flags taking precedence over settings
struct Connection {
    url: ApiUrl,
    credentials: Credentials,
    timeout: Duration,
}

impl Connection {
    fn client(&self) -> Result<Client> {
        Client::new(self.url.clone(), self.timeout)
    }
}

fn connection(args: &Arguments, settings: Settings) -> Result<Connection> {
    let url = args
        .api_url
        .clone()
        .or(settings.api.url)
        .ok_or(Error::MissingSetting("api.url"))?;
    let mail = args
        .mail
        .clone()
        .or(settings.api.mail)
        .ok_or(Error::MissingSetting("api.mail"))?;
    let password = args
        .password
        .clone()
        .map(Secret::from)
        .or(settings.api.password)
        .ok_or(Error::MissingSetting("api.password"))?;

    let url = ApiUrl::parse(&url)?;
    tracing::debug!(api = %url, mail, timeout = settings.api.timeout, "API client");
    Ok(Connection {
        url,
        credentials: Credentials::new(&mail, password),
        timeout: Duration::from_secs(settings.api.timeout),
    })
}

const EXIT_LOCAL_ERROR: u8 = 2;

fn exit_code(report: &Report) -> ExitCode {
    if report.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_report(report: &Report) -> Result<()> {
    let encoded = serde_json::to_string(report).map_err(libece::Error::from)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{encoded}")?;
    Ok(())
}

fn print_version() {
    let commit_suffix = if build::GIT_CLEAN { "" } else { "-dirty" };
    println!(
        "ece {} ({}{}) built on {} with {} {}",
        build::PKG_VERSION,
        build::SHORT_COMMIT,
        commit_suffix,
        build::BUILD_TIME,
        build::RUST_VERSION,
        build::RUST_CHANNEL
    );
}

pub async fn run() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Arguments::parse();

    let params = match Params::from_command(args.command.clone()) {
        Ok(Some(params)) => params,
        Ok(None) => {
            print_version();
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            tracing::error!(error=?error, "reading parameters");
            return ExitCode::from(EXIT_LOCAL_ERROR);
        }
    };

    let use_config_file = !args.no_config_file.unwrap_or_default();
    let settings = match Settings::new(use_config_file) {
        Ok(settings) => settings,
        Err(error) => {
            tracing::error!(error=?error, "parsing configuration");
            return ExitCode::from(EXIT_LOCAL_ERROR);
        }
    };
    let strict_auth = settings.auth.strict;

    let (client, credentials) = match connection(&args, settings)
        .and_then(|connection| Ok((connection.client()?, connection.credentials)))
    {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!(error=?error, "configuring API client");
            return ExitCode::from(EXIT_LOCAL_ERROR);
        }
    };

    let result = params.reconcile(&client, &credentials).await;
    if let Err(error) = &result {
        tracing::debug!(error=?error, "reconciliation failed");
    }
    let report = Report::new(result, strict_auth);

    if let Err(error) = print_report(&report) {
        tracing::error!(error=?error, "writing result");
        return ExitCode::from(EXIT_LOCAL_ERROR);
    }
    exit_code(&report)
}
