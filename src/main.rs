use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

mod cli;

use cli::Cli;
use cli::commands::{Commands, KitCommands};
use cli::render;
use kitcmd::KitcmdError;
use kitcmd::config::Config;
use kitcmd::discovery::{self, Discovery, DiscoveryOptions};
use kitcmd::dispatch::Dispatcher;
use kitcmd::registry::{ListFilter, Registry};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kitcmd")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("kitcmd.log");

    // Log to a file so tool output on the terminal stays clean
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<i32> {
    info!("Starting application");

    if let Some(Commands::Version) = &cli.command {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(0);
    }

    let root = discovery::resolve_root(cli.root.as_deref(), config)?;
    info!("Using project root {}", root.display());
    let options = DiscoveryOptions::from_config(root, config, &cli.enable_kits, &cli.disable_kits);
    let Discovery { registry, warnings } = discovery::discover(&options).context("Discovery failed")?;

    // A tool run only reports discovery problems when asked to
    let is_tool = matches!(cli.command, Some(Commands::External(_)));
    if !is_tool || cli.is_verbose() {
        for warning in &warnings {
            eprintln!("{}", render::warning(warning));
        }
    }

    match &cli.command {
        None => handle_list_command(&ListFilter::default(), &registry, config),
        Some(Commands::List {
            namespace,
            kit,
            tag,
            platform,
            all_platforms,
        }) => {
            let filter = ListFilter {
                namespace: namespace.clone(),
                kit: kit.clone(),
                tag: tag.clone(),
                platform: platform.clone(),
                include_incompatible: *all_platforms,
            };
            handle_list_command(&filter, &registry, config)
        }
        Some(Commands::Info { tool }) => handle_info_command(tool, &registry),
        Some(Commands::Kit { command }) => handle_kit_command(command, &registry),
        Some(Commands::Version) => Ok(0),
        Some(Commands::External(args)) => handle_tool(args, &registry, config),
    }
}

fn handle_list_command(filter: &ListFilter, registry: &Registry, config: &Config) -> Result<i32> {
    info!("Listing tools: {:?}", filter);
    let filter = filter.clone().include_incompatible(filter.include_incompatible || config.list.show_incompatible);
    let entries = registry.list(&filter);
    print!("{}", render::tool_list(&entries));
    Ok(0)
}

fn handle_info_command(tool: &str, registry: &Registry) -> Result<i32> {
    info!("Showing info for {}", tool);
    match registry.get(tool) {
        Some(entry) => {
            print!("{}", render::tool_info(entry));
            Ok(0)
        }
        None => {
            let err = KitcmdError::UnknownTool {
                name: tool.to_string(),
                suggestions: registry.suggestions(tool),
            };
            eprintln!("{} {}", "Error:".red().bold(), err);
            Ok(err.exit_code())
        }
    }
}

fn handle_kit_command(command: &KitCommands, registry: &Registry) -> Result<i32> {
    info!("Handling kit command: {:?}", command);
    match command {
        KitCommands::List { kit: None } => print!("{}", render::kit_list(&registry.all_kits())),
        KitCommands::List { kit: Some(name) } => match registry.kit_members(name) {
            Some(members) => print!("{}", render::kit_members(name, &members)),
            None => {
                let err = KitcmdError::UnknownKit(name.clone());
                eprintln!("{} {}", "Error:".red().bold(), err);
                return Ok(err.exit_code());
            }
        },
        KitCommands::Status => print!("{}", render::kit_status(registry)),
    }
    Ok(0)
}

fn handle_tool(args: &[OsString], registry: &Registry, config: &Config) -> Result<i32> {
    let Some((name, tool_args)) = args.split_first() else {
        eyre::bail!("no tool name given");
    };
    let name = name.to_string_lossy();
    info!("Running tool {} with {} arg(s)", name, tool_args.len());

    let dispatcher = Dispatcher::new(registry).with_python(config.python.clone());
    match dispatcher.dispatch(&name, tool_args) {
        Ok(code) => Ok(code),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            Ok(e.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(cli, &config).context("Application failed")
}

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            1
        }
    };
    std::process::exit(code);
}
