use std::path::PathBuf;

use anyhow::{Context, Result};
use apibench::config::{load_config, resolve_relative};
use apibench::model::RecordId;
use apibench::store::{FileStore, DEFAULT_STORE_FILE};
use apibench::workbench::Workbench;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "apibench",
    version,
    about = "API-testing workbench",
    disable_help_subcommand = true
)]
struct Cli {
    /// Directory or file containing apibench.json
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data file to use instead of the configured one
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log more (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute an ad-hoc request
    Send {
        #[command(flatten)]
        request: RequestArgs,
        #[command(flatten)]
        exec: ExecArgs,
    },
    /// Execute a stored request
    Run {
        /// Stored request id
        id: RecordId,
        #[command(flatten)]
        exec: ExecArgs,
    },
    /// Manage stored requests
    #[command(subcommand)]
    Request(RequestCommand),
    /// Manage collections
    #[command(subcommand)]
    Collection(CollectionCommand),
    /// Manage environments
    #[command(subcommand)]
    Env(EnvCommand),
    /// Inspect execution history
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// HTTP method
    method: String,
    /// URL, may contain {{placeholders}}
    url: String,
    /// Header as 'Name: value' (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,
    /// Query parameter as key=value (repeatable)
    #[arg(short = 'q', long = "param")]
    params: Vec<String>,
    /// Request body; JSON text is sent as JSON
    #[arg(short = 'd', long = "data")]
    data: Option<String>,
}

#[derive(Args, Debug)]
struct ExecArgs {
    /// Environment name or id
    #[arg(short, long)]
    env: Option<String>,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum RequestCommand {
    /// Store a request
    Add {
        #[arg(long)]
        name: Option<String>,
        /// Collection id to file the request under
        #[arg(long)]
        collection: Option<RecordId>,
        #[command(flatten)]
        request: RequestArgs,
    },
    /// List stored requests
    List,
    /// Show a stored request
    Show { id: RecordId },
    /// Delete a stored request
    Rm { id: RecordId },
}

#[derive(Subcommand, Debug)]
enum CollectionCommand {
    /// Create a collection
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List collections
    List,
    /// Show a collection and its requests
    Show { id: RecordId },
    /// Delete a collection; its requests are kept
    Rm { id: RecordId },
}

#[derive(Subcommand, Debug)]
enum EnvCommand {
    /// Create an environment
    Add {
        name: String,
        /// Variable as KEY=VALUE (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,
        /// Import variables from a dotenv file
        #[arg(long)]
        from_file: Option<PathBuf>,
    },
    /// List environments
    List,
    /// Show an environment
    Show { env: String },
    /// Set variables on an environment
    Set {
        env: String,
        /// Variable as KEY=VALUE
        #[arg(required = true)]
        vars: Vec<String>,
    },
    /// Delete an environment
    Rm { env: String },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// List history, newest first
    List,
    /// Show one history entry
    Show { id: RecordId },
    /// Delete one history entry
    Rm { id: RecordId },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let base_dir = std::env::current_dir()?;
    let config_target = cli
        .config
        .as_ref()
        .map(|p| resolve_relative(&base_dir, p))
        .unwrap_or_else(|| base_dir.clone());
    let cfg = load_config(&config_target).context("loading configuration")?;

    let store_path = match (&cli.store, &cfg) {
        (Some(path), _) => resolve_relative(&base_dir, path),
        (None, Some(loaded)) => loaded.store_path(),
        (None, None) => base_dir.join(DEFAULT_STORE_FILE),
    };
    let store = FileStore::open(&store_path)?;
    let mut workbench = Workbench::new(store);

    let default_env = cfg.and_then(|loaded| loaded.config.default_environment);

    let succeeded = match cli.command {
        Commands::Send { request, exec } => {
            let template = commands::build_template(&request)?;
            commands::execute(&workbench, &template, exec, default_env).await?
        }
        Commands::Run { id, exec } => {
            commands::run_stored(&workbench, id, exec, default_env).await?
        }
        Commands::Request(command) => commands::request(workbench.store_mut(), command)?,
        Commands::Collection(command) => commands::collection(workbench.store_mut(), command)?,
        Commands::Env(command) => commands::env(workbench.store_mut(), command)?,
        Commands::History(command) => commands::history(workbench.store_mut(), command)?,
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

mod commands {
    use anyhow::{anyhow, bail, Context, Result};
    use colored::Colorize;
    use serde::Serialize;

    use apibench::env::{interpolate, load_env_file, parse_assignment, EnvMap};
    use apibench::executor::print_execution_result;
    use apibench::model::{Environment, NewRequest, RecordId, RequestBody, RequestTemplate};
    use apibench::store::DataStore;
    use apibench::workbench::Workbench;

    use super::{
        CollectionCommand, EnvCommand, ExecArgs, HistoryCommand, RequestArgs, RequestCommand,
    };

    pub fn build_template(args: &RequestArgs) -> Result<RequestTemplate> {
        let mut template = RequestTemplate::new(args.method.to_ascii_uppercase(), &args.url);
        for raw in &args.headers {
            let (name, value) = parse_header(raw)?;
            template.headers.insert(name, value);
        }
        for raw in &args.params {
            let (key, value) = parse_assignment(raw)?;
            template.params.insert(key, value);
        }
        template.body = args.data.clone().map(RequestBody::Text);
        Ok(template)
    }

    pub fn parse_header(raw: &str) -> Result<(String, String)> {
        match raw.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.trim().to_string()))
            }
            _ => bail!("Invalid header: {raw} (expected 'Name: value')"),
        }
    }

    /// Finds an environment by id first, then by name.
    pub fn find_environment<S: DataStore>(store: &S, selector: &str) -> Result<Environment> {
        if let Ok(id) = selector.parse::<RecordId>() {
            if let Some(environment) = store.environment(id)? {
                return Ok(environment);
            }
        }
        store
            .find_environment(selector)?
            .ok_or_else(|| anyhow!("environment {selector} not found"))
    }

    pub async fn execute<S: DataStore>(
        workbench: &Workbench<S>,
        template: &RequestTemplate,
        exec: ExecArgs,
        default_env: Option<String>,
    ) -> Result<bool> {
        let environment = match exec.env.or(default_env) {
            Some(selector) => Some(find_environment(&*workbench.store(), &selector)?),
            None => None,
        };
        let vars = environment
            .as_ref()
            .map(|e| e.variables.clone())
            .unwrap_or_default();

        let run = workbench
            .execute(template, environment.as_ref().map(|e| e.id))
            .await?;

        if exec.json {
            print_json(&run.result)?;
        } else {
            let url = interpolate(&template.url, &vars);
            print_execution_result(&template.method, &url, &run.result);
            if let Some(entry) = &run.history {
                println!("{}", format!("Saved to history as #{}", entry.id).dimmed());
            }
        }
        Ok(run.result.is_success())
    }

    pub async fn run_stored<S: DataStore>(
        workbench: &Workbench<S>,
        id: RecordId,
        exec: ExecArgs,
        default_env: Option<String>,
    ) -> Result<bool> {
        let stored = workbench
            .store()
            .request(id)?
            .ok_or_else(|| anyhow!("request {id} not found"))?;
        execute(workbench, &stored.template, exec, default_env).await
    }

    pub fn request<S: DataStore>(store: &mut S, command: RequestCommand) -> Result<bool> {
        match command {
            RequestCommand::Add {
                name,
                collection,
                request,
            } => {
                let stored = store.create_request(NewRequest {
                    name,
                    template: build_template(&request)?,
                    collection_id: collection,
                })?;
                println!("Stored request #{} {}", stored.id, stored.name.bold());
            }
            RequestCommand::List => {
                for stored in store.list_requests()? {
                    println!(
                        "{:>4}  {:<7} {}  {}",
                        stored.id,
                        stored.template.method.bold(),
                        stored.template.url.cyan(),
                        stored.name.dimmed()
                    );
                }
            }
            RequestCommand::Show { id } => {
                let stored = store
                    .request(id)?
                    .ok_or_else(|| anyhow!("request {id} not found"))?;
                print_json(&stored)?;
            }
            RequestCommand::Rm { id } => {
                store.delete_request(id)?;
                println!("Deleted request #{id}");
            }
        }
        Ok(true)
    }

    pub fn collection<S: DataStore>(store: &mut S, command: CollectionCommand) -> Result<bool> {
        match command {
            CollectionCommand::Add { name, description } => {
                let collection = store.create_collection(name, description)?;
                println!(
                    "Created collection #{} {}",
                    collection.id,
                    collection.name.bold()
                );
            }
            CollectionCommand::List => {
                for collection in store.list_collections()? {
                    println!(
                        "{:>4}  {}  {}",
                        collection.id,
                        collection.name.bold(),
                        collection.description.unwrap_or_default().dimmed()
                    );
                }
            }
            CollectionCommand::Show { id } => {
                let collection = store
                    .collection(id)?
                    .ok_or_else(|| anyhow!("collection {id} not found"))?;
                println!("{} {}", collection.name.bold(), format!("#{}", collection.id).dimmed());
                if let Some(description) = &collection.description {
                    println!("{}", description.dimmed());
                }
                for stored in store.collection_requests(id)? {
                    println!(
                        "  {:>4}  {:<7} {}  {}",
                        stored.id,
                        stored.template.method.bold(),
                        stored.template.url.cyan(),
                        stored.name.dimmed()
                    );
                }
            }
            CollectionCommand::Rm { id } => {
                store.delete_collection(id)?;
                println!("Deleted collection #{id}");
            }
        }
        Ok(true)
    }

    pub fn env<S: DataStore>(store: &mut S, command: EnvCommand) -> Result<bool> {
        match command {
            EnvCommand::Add {
                name,
                vars,
                from_file,
            } => {
                let mut variables = match from_file {
                    Some(path) => load_env_file(&path)?,
                    None => EnvMap::new(),
                };
                variables.extend(parse_assignments(&vars)?);
                let environment = store.create_environment(name, variables)?;
                println!(
                    "Created environment #{} {} ({} variables)",
                    environment.id,
                    environment.name.bold(),
                    environment.variables.len()
                );
            }
            EnvCommand::List => {
                for environment in store.list_environments()? {
                    println!(
                        "{:>4}  {}  {}",
                        environment.id,
                        environment.name.bold(),
                        format!("{} variables", environment.variables.len()).dimmed()
                    );
                }
            }
            EnvCommand::Show { env } => {
                let environment = find_environment(store, &env)?;
                print_json(&environment)?;
            }
            EnvCommand::Set { env, vars } => {
                let environment = find_environment(store, &env)?;
                let mut variables = environment.variables;
                variables.extend(parse_assignments(&vars)?);
                let updated = store.update_environment(
                    environment.id,
                    apibench::model::EnvironmentUpdate {
                        variables: Some(variables),
                        ..Default::default()
                    },
                )?;
                println!(
                    "Updated environment #{} {}",
                    updated.id,
                    updated.name.bold()
                );
            }
            EnvCommand::Rm { env } => {
                let environment = find_environment(store, &env)?;
                store.delete_environment(environment.id)?;
                println!("Deleted environment #{}", environment.id);
            }
        }
        Ok(true)
    }

    pub fn history<S: DataStore>(store: &mut S, command: HistoryCommand) -> Result<bool> {
        match command {
            HistoryCommand::List => {
                for entry in store.list_history()? {
                    println!(
                        "{:>4}  {}  {:<7} {}  {}",
                        entry.id,
                        entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
                        entry.request.method.bold(),
                        entry.request.url.cyan(),
                        entry.response.status
                    );
                }
            }
            HistoryCommand::Show { id } => {
                let entry = store
                    .history_entry(id)?
                    .ok_or_else(|| anyhow!("history entry {id} not found"))?;
                print_json(&entry)?;
            }
            HistoryCommand::Rm { id } => {
                store.delete_history(id)?;
                println!("Deleted history entry #{id}");
            }
        }
        Ok(true)
    }

    fn parse_assignments(raw: &[String]) -> Result<EnvMap> {
        raw.iter().map(|item| parse_assignment(item)).collect()
    }

    fn print_json<T: Serialize>(value: &T) -> Result<()> {
        let rendered = serde_json::to_string_pretty(value).context("serializing output")?;
        println!("{rendered}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apibench::model::RequestBody;
    use apibench::store::{DataStore, MemoryStore};

    fn request_args(headers: &[&str], params: &[&str], data: Option<&str>) -> RequestArgs {
        RequestArgs {
            method: "post".to_string(),
            url: "{{base}}/items".to_string(),
            headers: headers.iter().map(|s| s.to_string()).collect(),
            params: params.iter().map(|s| s.to_string()).collect(),
            data: data.map(|s| s.to_string()),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn build_template_collects_arguments() -> Result<()> {
        let args = request_args(
            &["Accept: application/json", "X-Token:{{token}}"],
            &["page=2"],
            Some("{\"name\": \"x\"}"),
        );
        let template = commands::build_template(&args)?;

        assert_eq!(template.method, "POST");
        assert_eq!(template.url, "{{base}}/items");
        assert_eq!(
            template.headers.get("X-Token").map(String::as_str),
            Some("{{token}}")
        );
        assert_eq!(template.params.get("page").map(String::as_str), Some("2"));
        assert_eq!(
            template.body,
            Some(RequestBody::Text("{\"name\": \"x\"}".to_string()))
        );
        Ok(())
    }

    #[test]
    fn build_template_rejects_malformed_headers() {
        let args = request_args(&["no colon here"], &[], None);
        let err = commands::build_template(&args).unwrap_err();
        assert!(err.to_string().contains("Invalid header"));
    }

    #[test]
    fn parse_header_keeps_colons_in_values() -> Result<()> {
        let (name, value) = commands::parse_header("Referer: https://example.com:8080/")?;
        assert_eq!(name, "Referer");
        assert_eq!(value, "https://example.com:8080/");
        Ok(())
    }

    #[test]
    fn find_environment_accepts_ids_and_names() -> Result<()> {
        let mut store = MemoryStore::new();
        let dev = store.create_environment("dev".to_string(), Default::default())?;
        let numeric = store.create_environment("2024".to_string(), Default::default())?;

        assert_eq!(commands::find_environment(&store, "1")?.id, dev.id);
        assert_eq!(commands::find_environment(&store, "dev")?.id, dev.id);
        assert_eq!(commands::find_environment(&store, "2024")?.id, numeric.id);
        assert!(commands::find_environment(&store, "qa").is_err());
        Ok(())
    }
}
