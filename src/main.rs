use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use drupal_services::channel::ChannelEvent;
use drupal_services::resources::{
    DelVariable, GetVariable, Login, SelectNodes, SetVariable, TermIndex, TermRef, UpdateTerm, UserRef,
    ViewQuery,
};
use drupal_services::{ApiConfig, PendingResult, Services};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Call a Drupal Services endpoint from the command line
#[derive(Parser, Debug)]
#[command(name = "drupal-services", version, about, long_about = None)]
struct Args {
    /// Site root, e.g. http://localhost/drupal
    #[arg(long)]
    instance: Option<String>,

    /// Services endpoint path, e.g. /api/v1
    #[arg(long)]
    endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Store the effective connection settings as the new defaults
    #[arg(long)]
    save_config: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Logged in state of the current session
    Connect,
    /// Read a system variable
    GetVariable {
        name: String,
        #[arg(long)]
        default: Option<String>,
    },
    /// Set a system variable (value parsed as JSON, else taken as text)
    SetVariable { name: String, value: String },
    /// Delete a system variable
    DelVariable { name: String },
    /// Fetch a user by uid
    User { uid: u64 },
    Login { username: String, password: String },
    Logout,
    /// CSRF token of the current session
    Token,
    /// Fetch a taxonomy term
    Term { tid: u64 },
    /// Create a term from a JSON object, e.g. '{"vid":1,"name":"Fruit"}'
    CreateTerm { term: String },
    /// Update a term with a JSON object
    UpdateTerm { tid: u64, data: String },
    DeleteTerm { tid: u64 },
    /// List taxonomy terms
    Terms {
        #[arg(long)]
        page: Option<u64>,
        #[arg(long)]
        pagesize: Option<u64>,
        #[arg(long)]
        fields: Option<String>,
        /// Property condition, repeatable: --param vid=1
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
    /// Nodes tagged with the given comma separated term ids
    SelectNodes {
        tid: String,
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long)]
        pager: bool,
    },
    /// Retrieve a view
    View {
        name: String,
        #[arg(long)]
        display_id: Option<String>,
        /// Contextual argument, repeatable
        #[arg(long = "arg")]
        args: Vec<String>,
        #[arg(long)]
        offset: Option<u64>,
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long)]
        format_output: bool,
        /// Exposed filter, repeatable: --filter nid=12
        #[arg(long = "filter", value_parser = parse_key_value)]
        filters: Vec<(String, String)>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

/// JSON if it parses, otherwise the raw text
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn to_map(pairs: Vec<(String, String)>) -> Option<Map<String, Value>> {
    if pairs.is_empty() {
        return None;
    }
    Some(pairs.into_iter().map(|(k, v)| (k, parse_value(&v))).collect())
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        },
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("drupal-services started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("drupal-services").join("drupal-services.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".drupal-services").join("drupal-services.log");
    }
    PathBuf::from("drupal-services.log")
}

/// Effective settings (CLI > config file > defaults)
fn effective_config(args: &Args) -> ApiConfig {
    let mut config = ApiConfig::load();
    if let Some(instance) = &args.instance {
        config.drupal_instance = instance.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        config.api_endpoint = endpoint.clone();
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    config
}

fn log_event(event: &ChannelEvent) {
    tracing::info!(topic = %event.topic, at = %event.emitted_at, "outcome published");
}

fn observe(services: &Services) {
    services.system.channel().subscribe_all(log_event);
    services.user.channel().subscribe_all(log_event);
    services.taxonomy_terms.channel().subscribe_all(log_event);
    services.views.channel().subscribe_all(log_event);
}

fn dispatch(services: &Services, command: Command) -> PendingResult {
    match command {
        Command::Connect => services.system.connect(),
        Command::GetVariable { name, default } => services.system.get_variable(&GetVariable {
            name: Some(name),
            default: default.map(|d| parse_value(&d)),
        }),
        Command::SetVariable { name, value } => services.system.set_variable(&SetVariable {
            name: Some(name),
            value: Some(parse_value(&value)),
        }),
        Command::DelVariable { name } => services.system.del_variable(&DelVariable { name: Some(name) }),
        Command::User { uid } => services.user.retrieve(&UserRef { uid: Some(uid) }),
        Command::Login { username, password } => services.user.login(&Login {
            username: Some(username),
            password: Some(password),
        }),
        Command::Logout => services.user.logout(),
        Command::Token => services.user.token(),
        Command::Term { tid } => services.taxonomy_terms.retrieve(&TermRef { tid: Some(tid) }),
        Command::CreateTerm { term } => services.taxonomy_terms.create(&parse_value(&term)),
        Command::UpdateTerm { tid, data } => services.taxonomy_terms.update(&UpdateTerm {
            tid: Some(tid),
            data: Some(parse_value(&data)),
        }),
        Command::DeleteTerm { tid } => services.taxonomy_terms.delete(&TermRef { tid: Some(tid) }),
        Command::Terms {
            page,
            pagesize,
            fields,
            params,
        } => services.taxonomy_terms.index(&TermIndex {
            page,
            pagesize,
            fields,
            parameters: to_map(params),
        }),
        Command::SelectNodes { tid, limit, pager } => services.taxonomy_terms.select_nodes(&SelectNodes {
            tid: Some(tid),
            limit,
            pager: pager.then_some(true),
            order: None,
        }),
        Command::View {
            name,
            display_id,
            args,
            offset,
            limit,
            format_output,
            filters,
        } => services.views.retrieve(&ViewQuery {
            view_name: Some(name),
            display_id,
            args: (!args.is_empty()).then(|| args.into_iter().map(Value::String).collect()),
            offset,
            limit,
            format_output: format_output.then_some(true),
            exposed_filters: to_map(filters),
            extra: Map::new(),
        }),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let config = effective_config(&args);
    if args.save_config {
        config.save()?;
        tracing::info!("Saved configuration to {:?}", ApiConfig::config_path());
    }

    let services = Services::new(&config)?;
    observe(&services);

    tracing::info!("Using endpoint: {}", config.base_url());

    match dispatch(&services, args.command).await {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(ExitCode::SUCCESS)
        },
        Err(err) => {
            tracing::error!("Request failed: {}", err);
            eprintln!("Error: {}", err.user_message());
            Ok(ExitCode::FAILURE)
        },
    }
}
