//! Inspector CLI binary.
//!
//! Command-line client for the bare-metal hardware introspection service.
//!
//! # Commands
//!
//! - `start` - Start introspection on one or more nodes
//! - `status` - Get introspection status of a node
//! - `data` - Get data collected by the last introspection
//! - `rule` - Import, list, show and delete introspection rules
//! - `api-versions` - Show API versions supported by the server

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use inspector_client::{
    client::rule_documents, known_api_versions, server_api_versions, Client, ClientBuilder,
    ClientConfig, ConfigOverrides, HttpTransport, IntrospectionData, MAX_API_VERSION, VERSION,
};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "inspector")]
#[command(version = VERSION)]
#[command(about = "Bare-metal hardware introspection client", long_about = None)]
struct Cli {
    /// Inspector URL, defaults to localhost
    #[arg(long, env = "INSPECTOR_URL", global = true)]
    inspector_url: Option<String>,

    /// Inspector API version (1, 1.3, ...), defaults to the latest the server supports
    #[arg(long, env = "INSPECTOR_VERSION", global = true)]
    inspector_api_version: Option<String>,

    /// Authentication token
    #[arg(long, env = "OS_AUTH_TOKEN", global = true, hide_env_values = true)]
    os_auth_token: Option<String>,

    /// Config file path (default: ~/.config/inspector-client/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, env = "INSPECTOR_TIMEOUT", global = true)]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the introspection
    Start {
        /// Baremetal node UUID(s)
        #[arg(required = true)]
        uuid: Vec<String>,

        /// If set, the inspector will update IPMI user name to this value
        #[arg(long)]
        new_ipmi_username: Option<String>,

        /// If set, the inspector will update IPMI password to this value
        #[arg(long)]
        new_ipmi_password: Option<String>,
    },

    /// Get introspection status
    Status {
        /// Baremetal node UUID
        uuid: String,
    },

    /// Get introspection data
    Data {
        /// Baremetal node UUID
        uuid: String,

        /// Print the data exactly as stored by the server
        #[arg(long)]
        raw: bool,
    },

    /// Manage introspection rules
    Rule {
        #[command(subcommand)]
        action: RuleAction,
    },

    /// Show API versions supported by the server and this client
    ApiVersions,
}

#[derive(Subcommand)]
enum RuleAction {
    /// Import one or several introspection rules from a JSON file
    Import {
        /// JSON file to import, may contain one or several rules
        file: PathBuf,
    },

    /// List all introspection rules
    List,

    /// Show an introspection rule
    Show {
        /// Rule UUID
        uuid: String,
    },

    /// Delete an introspection rule
    Delete {
        /// Rule UUID
        uuid: String,
    },

    /// Drop all introspection rules
    Purge,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Start {
            uuid,
            new_ipmi_username,
            new_ipmi_password,
        } => cmd_start(
            &config,
            &uuid,
            new_ipmi_username.as_deref(),
            new_ipmi_password.as_deref(),
        ),

        Commands::Status { uuid } => cmd_status(&config, &uuid),

        Commands::Data { uuid, raw } => cmd_data(&config, &uuid, raw),

        Commands::Rule { action } => cmd_rule(&config, action),

        Commands::ApiVersions => cmd_api_versions(&config),
    }
}

/// Config file first, then environment, then flags.
fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let file_config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => match ClientConfig::default_path().filter(|p| p.exists()) {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        },
    };

    let config = file_config.merge(overrides(cli));

    let known = known_api_versions(MAX_API_VERSION);
    if let Some(requested) = config.api_version.as_deref() {
        if !known.iter().any(|v| v == requested.trim()) {
            tracing::warn!(
                "API version {} is not known to this client (known: {})",
                requested,
                known.join(", ")
            );
        }
    }

    Ok(config)
}

/// Values given on the command line. Clap falls back to the environment
/// for each of them, so a flag beats its variable.
fn overrides(cli: &Cli) -> ConfigOverrides {
    ConfigOverrides {
        inspector_url: cli.inspector_url.clone(),
        api_version: cli.inspector_api_version.clone(),
        auth_token: cli.os_auth_token.clone(),
        timeout_secs: cli.timeout,
    }
}

fn connect(config: &ClientConfig) -> anyhow::Result<Client> {
    Ok(ClientBuilder::from_config(config).build()?)
}

fn cmd_start(
    config: &ClientConfig,
    uuids: &[String],
    new_ipmi_username: Option<&str>,
    new_ipmi_password: Option<&str>,
) -> anyhow::Result<()> {
    let client = connect(config)?;
    for uuid in uuids {
        client.introspect(uuid, new_ipmi_username, new_ipmi_password)?;
    }

    if new_ipmi_password.is_some() {
        println!("Setting IPMI credentials requested, please power on the machine manually");
    }

    Ok(())
}

fn cmd_status(config: &ClientConfig, uuid: &str) -> anyhow::Result<()> {
    let client = connect(config)?;
    let status: BTreeMap<String, Value> = client.get_status(uuid)?.into_iter().collect();

    for (key, value) in &status {
        println!("{key}: {}", display_value(value));
    }

    Ok(())
}

fn cmd_data(config: &ClientConfig, uuid: &str, raw: bool) -> anyhow::Result<()> {
    let client = connect(config)?;

    match client.get_data(uuid, raw)? {
        IntrospectionData::Raw(bytes) => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        },
        IntrospectionData::Json(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        },
    }

    Ok(())
}

fn cmd_rule(config: &ClientConfig, action: RuleAction) -> anyhow::Result<()> {
    let client = connect(config)?;
    let rules = client.rules();

    match action {
        RuleAction::Import { file } => {
            let content = std::fs::read_to_string(&file)?;
            let document: Value = serde_json::from_str(&content)?;
            for rule in rule_documents(document) {
                let created = rules.from_json(rule)?;
                tracing::info!("Imported rule {}", display_value(&created["uuid"]));
            }
        },

        RuleAction::List => {
            let rows: Vec<(String, String)> = rules
                .get_all()?
                .iter()
                .map(|rule| {
                    (
                        display_value(&rule["uuid"]),
                        display_value(&rule["description"]),
                    )
                })
                .collect();

            let width = rows
                .iter()
                .map(|(uuid, _)| uuid.len())
                .max()
                .unwrap_or(0)
                .max("UUID".len());
            println!("{:<width$}  Description", "UUID");
            for (uuid, description) in rows {
                println!("{uuid:<width$}  {description}");
            }
        },

        RuleAction::Show { uuid } => {
            let mut rule = rules.get(&uuid)?;
            if let Some(fields) = rule.as_object_mut() {
                fields.remove("links");
            }
            println!("{}", serde_json::to_string_pretty(&rule)?);
        },

        RuleAction::Delete { uuid } => rules.delete(&uuid)?,

        RuleAction::Purge => rules.delete_all()?,
    }

    Ok(())
}

fn cmd_api_versions(config: &ClientConfig) -> anyhow::Result<()> {
    let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))?;
    let range = server_api_versions(&transport, &config.inspector_url)?;

    println!("Server minimum: {}", range.min);
    println!("Server maximum: {}", range.max);
    println!(
        "Client known:   {}",
        known_api_versions(MAX_API_VERSION).join(", ")
    );

    Ok(())
}

/// Render JSON scalars without quotes, everything else as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
