//! cc-runner: run a plugin payload from the command line

mod actions;

use anyhow::Context;
use cc_model::Payload;
use cc_plugin::PluginManager;
use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::PathBuf;

fn cli() -> Command {
    let payload_arg = Arg::new("payload")
        .long("payload")
        .short('p')
        .value_parser(value_parser!(PathBuf))
        .help("Payload file (JSON, or YAML by extension); defaults to $CC_ROOT/$CC_MANIFEST_ID/payload");

    Command::new("cc-runner")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolve and run compute plugin payloads")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("resolve")
                .about("Connect stores, substitute templates and print the resolved payload")
                .arg(payload_arg.clone()),
        )
        .subcommand(
            Command::new("run")
                .about("Initialise the payload and dispatch its actions")
                .arg(payload_arg),
        )
        .subcommand(Command::new("stores").about("List registered store types"))
}

fn load(args: &ArgMatches) -> anyhow::Result<PluginManager> {
    match args.get_one::<PathBuf>("payload") {
        Some(path) => {
            let payload =
                Payload::from_path(path).with_context(|| format!("failed to load payload {}", path.display()))?;
            PluginManager::builder()
                .with_payload(payload)
                .build()
                .context("failed to initialise plugin manager")
        }
        None => PluginManager::from_env().context("failed to initialise plugin manager from environment"),
    }
}

fn resolve(args: &ArgMatches) -> anyhow::Result<()> {
    let manager = load(args)?;
    println!("{}", manager.payload().to_json_pretty()?);
    Ok(())
}

fn run(args: &ArgMatches) -> anyhow::Result<()> {
    actions::register_builtin_actions();
    let manager = load(args)?;
    let report = manager.run_actions()?;

    for outcome in report.outcomes() {
        match &outcome.error {
            Some(error) => tracing::warn!(action = %outcome.name, state = %outcome.state, %error, "action outcome"),
            None => tracing::info!(action = %outcome.name, state = %outcome.state, "action outcome"),
        }
    }
    report.ensure_success()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("resolve", args)) => resolve(args),
        Some(("run", args)) => run(args),
        Some(("stores", _)) => {
            for name in cc_store::global_store_types().names() {
                println!("{name}");
            }
            Ok(())
        }
        _ => unreachable!("subcommand is required"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn payload_flag_parses() {
        let matches = cli()
            .try_get_matches_from(["cc-runner", "resolve", "--payload", "job.yaml"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "resolve");
        assert_eq!(args.get_one::<PathBuf>("payload"), Some(&PathBuf::from("job.yaml")));
    }
}
