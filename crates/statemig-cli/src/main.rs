use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use statemig_core::MigratorConfig;
use statemig_schema::SchemaVersion;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("statemig")
        .version(statemig_cli::VERSION)
        .about("Upgrade persisted azuread_application state between schema versions")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("upgrade")
                .about("Upgrade a state record to the target schema version")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .short('i')
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("State file: envelope or bare attribute object"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the upgraded envelope here instead of stdout"),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .value_parser(value_parser!(u32))
                        .help("Schema version of a bare attribute object"),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_parser(value_parser!(u32))
                        .help("Target schema version (defaults to the newest)"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Migrator config (TOML, YAML or JSON)"),
                )
                .arg(
                    Arg::new("compact")
                        .long("compact")
                        .action(ArgAction::SetTrue)
                        .help("Emit single-line JSON"),
                ),
        )
        .subcommand(
            Command::new("describe")
                .about("Print the fields of a schema version")
                .arg(
                    Arg::new("version")
                        .long("version")
                        .required(true)
                        .value_parser(value_parser!(u32))
                        .help("Schema version to describe"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("List attributes a schema version does not declare")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .short('i')
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("State file: envelope or bare attribute object"),
                )
                .arg(
                    Arg::new("version")
                        .long("version")
                        .required(true)
                        .value_parser(value_parser!(u32))
                        .help("Schema version to check against"),
                ),
        )
}

fn version_arg(args: &ArgMatches, name: &str) -> Option<SchemaVersion> {
    args.get_one::<u32>(name).copied().map(SchemaVersion::new)
}

fn required_path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("--{name} is required"))
}

fn run_upgrade(args: &ArgMatches) -> Result<ExitCode> {
    let input = statemig_cli::read_input(required_path(args, "input")?, version_arg(args, "from"))?;
    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => statemig_cli::load_config(path)?,
        None => MigratorConfig::default(),
    };

    let upgraded = statemig_cli::upgrade(&input, config, version_arg(args, "to"))?;
    let text = statemig_cli::render(&upgraded, args.get_flag("compact"))?;

    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            fs::write(path, text + "\n")
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn run_describe(args: &ArgMatches) -> Result<ExitCode> {
    let version = version_arg(args, "version").context("--version is required")?;
    print!("{}", statemig_cli::describe(version, args.get_flag("json"))?);
    if args.get_flag("json") {
        println!();
    }
    Ok(ExitCode::SUCCESS)
}

fn run_check(args: &ArgMatches) -> Result<ExitCode> {
    let version = version_arg(args, "version").context("--version is required")?;
    let input = statemig_cli::read_input(required_path(args, "input")?, Some(version))?;
    let unknown = statemig_cli::check(&input.attributes, version)?;

    if unknown.is_empty() {
        println!("OK: every attribute is declared by {version}");
        return Ok(ExitCode::SUCCESS);
    }
    println!("{} attribute(s) unknown to {version}:", unknown.len());
    for key in &unknown {
        println!("  {key}");
    }
    Ok(ExitCode::FAILURE)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let result = match matches.subcommand() {
        Some(("upgrade", args)) => run_upgrade(args),
        Some(("describe", args)) => run_describe(args),
        Some(("check", args)) => run_check(args),
        _ => Ok(ExitCode::FAILURE),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
