//! `wmls` - talk to a WITSML store from the shell
//!
//! ```text
//! wmls -r https://witsml.example.com/store -u driller -p s3cret get query.xml
//! wmls cap --json
//! cat well.xml | wmls add -
//! ```
//!
//! Missing connection settings are read from the `store` section of the
//! configuration file (`~/.wmls/config.yaml`, or `--config DIR`).

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use wmlsclient::{ClientBuilder, SoapVersion, StoreOperation, StoreRequest, StoreResponse};
use wmlsconfig::{Config, get_config};

/// Exit code when the store reports a failure (`Result <= 0`)
const EXIT_STORE_FAILURE: u8 = 1;
/// Exit code when the request could not be made at all
const EXIT_CLIENT_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "wmls", version, about = "Command-line client for WITSML stores")]
struct Cli {
    /// Store operation: add, delete, update, get or cap
    action: StoreOperation,

    /// WITSML template file ('-' or absent reads stdin). Not used by 'cap'.
    file: Option<PathBuf>,

    /// URL of the store service
    #[arg(short = 'r', long)]
    url: Option<String>,

    /// User name for HTTP Basic authentication
    #[arg(short, long)]
    user: Option<String>,

    /// Password for HTTP Basic authentication
    #[arg(short, long)]
    password: Option<String>,

    /// Read timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Limit on the response body download in seconds (0: no limit)
    #[arg(long)]
    body_timeout: Option<u64>,

    /// OptionsIn sent with the request (e.g. returnElements=all)
    #[arg(short, long)]
    options_in: Option<String>,

    /// CapabilitiesIn sent with add/delete/update/get
    #[arg(long)]
    capabilities_in: Option<String>,

    /// Use SOAP 1.2 framing (action in the content type)
    #[arg(long)]
    soap12: bool,

    /// Do not verify the server TLS certificate
    #[arg(long)]
    insecure: bool,

    /// Extra HTTP header, as NAME:VALUE (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Configuration directory
    #[arg(long)]
    config: Option<String>,

    /// Print the whole response as JSON
    #[arg(long)]
    json: bool,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{}'", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn init_logging(config: &Config) {
    if !config.get_log_enable_console().unwrap_or(true) {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config
            .get_log_min_level()
            .unwrap_or_else(|_| "info".to_string());
        EnvFilter::new(level.to_lowercase())
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Builder from the configuration, with command-line values on top
fn client_builder(cli: &Cli, config: &Config) -> Result<ClientBuilder> {
    let mut builder = ClientBuilder::from_config(config)?;

    if let Some(url) = &cli.url {
        builder = builder.url(url);
    }
    if let Some(user) = &cli.user {
        builder = builder.username(user);
    }
    if let Some(password) = &cli.password {
        builder = builder.password(password);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = cli.body_timeout {
        builder = builder.body_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }
    if let Some(capabilities_in) = &cli.capabilities_in {
        builder = builder.capabilities_in(capabilities_in);
    }
    if cli.soap12 {
        builder = builder.soap_version(SoapVersion::Soap12);
    }
    if cli.insecure {
        builder = builder.accept_invalid_certs(true);
    }
    Ok(builder)
}

fn read_template(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("cannot read template {}", path.display())),
        _ => {
            let mut template = String::new();
            io::stdin()
                .read_to_string(&mut template)
                .context("cannot read template from stdin")?;
            Ok(template)
        }
    }
}

fn run(cli: &Cli, config: &Config) -> Result<StoreResponse> {
    let client = client_builder(cli, config)?.build()?;

    let template = if cli.action.requires_payload() {
        Some(read_template(cli.file.as_ref())?)
    } else {
        None
    };

    let request = StoreRequest::new(cli.action, template.as_deref())?
        .with_options_in(cli.options_in.as_deref());
    debug!(operation = %cli.action, url = %client.url(), "Running store operation");

    let headers: Vec<(&str, &str)> = cli
        .headers
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();

    Ok(client.call(&request, &headers)?)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(dir) => Arc::new(Config::load_or_default(dir)),
        None => get_config(),
    };
    init_logging(&config);

    match run(&cli, &config) {
        Ok(response) => {
            if cli.json {
                match serde_json::to_string_pretty(&response) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!(error = %e, "Cannot serialise response");
                        return ExitCode::from(EXIT_CLIENT_ERROR);
                    }
                }
            } else {
                if !response.xml_out.is_empty() {
                    println!("{}", response.xml_out);
                }
                if !response.supp_msg.is_empty() {
                    eprintln!("{}", response.supp_msg);
                }
            }

            if response.is_success() {
                ExitCode::SUCCESS
            } else {
                eprintln!("wmls: store returned {}", response.result);
                ExitCode::from(EXIT_STORE_FAILURE)
            }
        }
        Err(e) => {
            error!(error = %e, "Store operation failed");
            eprintln!("wmls: {:#}", e);
            ExitCode::from(EXIT_CLIENT_ERROR)
        }
    }
}
