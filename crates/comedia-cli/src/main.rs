//! `comedia` command-line host.

mod repl;

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use comedia_client::{telemetry, ClientConfig, ClientError, HttpBackend, LogFormat};
use comedia_offline::{CacheStorage, FetchOutcome, MemoryCacheStorage, OfflineGateway, Request};
use comedia_wizard::{AnalysisBackend, AnalysisId, CategoryKind, ListFilter, WizardController};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

fn cli() -> Command {
    Command::new("comedia")
        .version(comedia_wizard::VERSION)
        .about("Método Comedia analysis wizard and offline gateway")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON on stderr"),
        )
        .subcommand(
            Command::new("wizard")
                .about("Fill in a joke analysis step by step")
                .arg(
                    Arg::new("edit")
                        .long("edit")
                        .value_name("ID")
                        .help("Load an existing analysis for editing"),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List stored analyses")
                .arg(
                    Arg::new("comediante")
                        .long("comediante")
                        .value_name("NAME")
                        .help("Only analyses of this comedian"),
                )
                .arg(
                    Arg::new("concepto")
                        .long("concepto")
                        .value_name("CATEGORY")
                        .help("Only this concept category"),
                )
                .arg(
                    Arg::new("perspectiva")
                        .long("perspectiva")
                        .value_name("CATEGORY")
                        .help("Only this perspective category"),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(u32))
                        .help("At most this many analyses"),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a stored analysis")
                .arg(Arg::new("id").required(true).help("Analysis id")),
        )
        .subcommand(
            Command::new("categories")
                .about("List the options of a selectable field")
                .arg(
                    Arg::new("kind")
                        .required(true)
                        .value_parser(["perspectiva", "actitud", "concepto", "formulacion"])
                        .help("Category kind"),
                ),
        )
        .subcommand(
            Command::new("fetch")
                .about("Install the offline gateway and fetch paths through it")
                .arg(
                    Arg::new("paths")
                        .required(true)
                        .num_args(1..)
                        .help("Paths relative to the configured origin"),
                )
                .arg(
                    Arg::new("navigate")
                        .long("navigate")
                        .action(ArgAction::SetTrue)
                        .help("Treat each path as a page navigation"),
                ),
        )
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    match run(&matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let (message, code) = failure(&err);
            eprintln!("{message}");
            ExitCode::from(code)
        }
    }
}

/// Message and exit code for a failed command
///
/// Bad settings exit with `2` and a one-line message; anything else exits
/// with `1` and the full error chain.
fn failure(err: &anyhow::Error) -> (String, u8) {
    match err.downcast_ref::<ClientError>() {
        Some(client) if client.is_user_facing() => (format!("error: {client}"), 2),
        _ => (format!("error: {err:#}"), 1),
    }
}

async fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let format = if matches.get_flag("log-json") {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    telemetry::init(format)?;

    let config = ClientConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .map_err(ClientError::from)?;
    tracing::debug!(api = %config.api_url, cache = %config.gateway.cache_name, "configuration loaded");

    match matches.subcommand() {
        Some(("wizard", args)) => wizard(&config, args).await,
        Some(("list", args)) => list(&config, args).await,
        Some(("delete", args)) => delete(&config, args).await,
        Some(("categories", args)) => categories(&config, args).await,
        Some(("fetch", args)) => fetch(&config, args).await,
        Some((other, _)) => bail!("unknown command {other}"),
        None => bail!("no command given"),
    }
}

async fn wizard(config: &ClientConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let backend = HttpBackend::from_config(config)?;
    let mut wizard = WizardController::new(backend);

    if let Some(id) = args.get_one::<String>("edit") {
        wizard
            .load_for_edit(AnalysisId::new(id.as_str()))
            .await
            .with_context(|| format!("loading analysis {id}"))?;
    }

    println!("{}", repl::HELP);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let saved = repl::run(&mut wizard, stdin, &mut stdout).await?;
    tracing::info!(saved, "wizard session finished");
    Ok(())
}

fn list_filter(args: &ArgMatches) -> ListFilter {
    ListFilter {
        comediante: args.get_one::<String>("comediante").cloned(),
        concepto_categoria: args.get_one::<String>("concepto").cloned(),
        perspectiva_categoria: args.get_one::<String>("perspectiva").cloned(),
        limit: args.get_one::<u32>("limit").copied(),
    }
}

async fn list(config: &ClientConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let backend = HttpBackend::from_config(config)?;
    let analyses = backend.list(&list_filter(args)).await?;
    println!("{}", repl::listing(&analyses));
    Ok(())
}

async fn delete(config: &ClientConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let id = args
        .get_one::<String>("id")
        .context("analysis id is required")?;
    let backend = HttpBackend::from_config(config)?;
    backend
        .delete(&AnalysisId::new(id.as_str()))
        .await
        .with_context(|| format!("deleting analysis {id}"))?;
    println!("deleted {id}");
    Ok(())
}

async fn categories(config: &ClientConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let raw = args
        .get_one::<String>("kind")
        .context("category kind is required")?;
    let Some(kind) = CategoryKind::parse(raw) else {
        bail!("unknown category kind {raw}");
    };

    let backend = HttpBackend::from_config(config)?;
    let mut options = backend.categories(kind).await?;
    options.sort_by_key(|c| c.orden);

    println!("{kind} ({} options)", options.len());
    for option in options {
        println!("  {:>3}  {}", option.orden, option.valor);
    }
    Ok(())
}

async fn fetch(config: &ClientConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let network = comedia_client::network(config)?;
    let storage = Arc::new(MemoryCacheStorage::new());
    let gateway = OfflineGateway::new(config.gateway.clone(), network, Arc::clone(&storage));

    let report = gateway.install().await?;
    match &report.error {
        Some(err) => println!("precache failed: {err}"),
        None => println!("precached {} assets into {}", report.cached, config.gateway.cache_name),
    }
    let purged = gateway.activate().await?;
    if !purged.is_empty() {
        println!("purged {}", purged.join(", "));
    }

    let navigate = args.get_flag("navigate");
    for path in args.get_many::<String>("paths").into_iter().flatten() {
        let url = config
            .gateway
            .resolve(path)
            .with_context(|| format!("resolving {path}"))?;
        let request = if navigate {
            Request::navigate(url)
        } else {
            Request::get(url)
        };

        let outcome = gateway.handle_fetch(&request).await;
        match &outcome {
            FetchOutcome::PassThrough | FetchOutcome::Unresolved => {
                println!("{path}: {}", outcome.source());
            }
            FetchOutcome::Network(response)
            | FetchOutcome::Cache(response)
            | FetchOutcome::Fallback(response) => {
                println!(
                    "{path}: {} {} ({} bytes)",
                    outcome.source(),
                    response.status,
                    response.body.len()
                );
            }
        }
    }

    let settled = gateway.settle().await;
    println!("cache writes: {} ok, {} failed", settled.written, settled.failed);

    let store = storage.open(&config.gateway.cache_name).await?;
    let keys = store.keys().await;
    println!("{} holds {} entries", store.name(), keys.len());
    for key in keys {
        println!("  {key}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn fetch_accepts_many_paths() {
        let matches = cli()
            .try_get_matches_from(["comedia", "--config", "c.toml", "fetch", "/", "/static/js/app.js"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "fetch");
        assert_eq!(args.get_many::<String>("paths").unwrap().count(), 2);
        assert_eq!(
            matches.get_one::<PathBuf>("config").unwrap(),
            &PathBuf::from("c.toml")
        );
    }

    #[test]
    fn list_filters_are_optional() {
        let matches = cli()
            .try_get_matches_from(["comedia", "list", "--comediante", "Gila", "--limit", "5"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let filter = list_filter(args);
        assert_eq!(filter.comediante.as_deref(), Some("Gila"));
        assert_eq!(filter.limit, Some(5));
        assert_eq!(filter.concepto_categoria, None);

        assert!(cli()
            .try_get_matches_from(["comedia", "list", "--limit", "many"])
            .is_err());
    }

    #[test]
    fn bad_settings_get_a_short_message() {
        let err = ClientError::from(comedia_client::ConfigError::InvalidValue {
            key: "COMEDIA_TIMEOUT_SECS",
            value: "soon".to_string(),
        });
        let (message, code) = failure(&anyhow::Error::from(err));
        assert_eq!(code, 2);
        assert!(message.starts_with("error: configuration error"));

        let (_, code) = failure(&anyhow::anyhow!("backend down"));
        assert_eq!(code, 1);
    }

    #[test]
    fn unknown_category_kind_is_rejected() {
        assert!(cli()
            .try_get_matches_from(["comedia", "categories", "chiste"])
            .is_err());
    }
}
