mod commands;
mod logging;
mod progress;

use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, OrganizeArgs};
use dotenv::dotenv;
use progress::CliReporter;
use roster_sort_core::archive::Capabilities;
use roster_sort_core::{AppConfig, MatchOptions, Matcher, OrganizeEngine, Roster, RunStatistics};
use tracing::{debug, error};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match roster_sort_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::Organize(organize_args)) => run_organize(config, organize_args),
        Some(Commands::Match { filename, roster }) => run_match(&config, &filename, roster),
        Some(Commands::CheckTools) => {
            run_check_tools(&config);
            Ok(())
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run_organize(mut config: AppConfig, args: OrganizeArgs) -> anyhow::Result<()> {
    if let Some(input) = args.input {
        config.input_dir = input;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if let Some(roster) = args.roster {
        config.roster_path = roster;
    }
    if args.manifest.is_some() {
        config.manifest_path = args.manifest;
    }
    if args.no_convert {
        config.convert = false;
    }

    let engine = OrganizeEngine::new(config).dry_run(args.dry_run);
    let reporter = CliReporter::new();
    let stats = engine.organize(&reporter)?;

    print_summary(&stats, args.dry_run);
    Ok(())
}

fn print_summary(stats: &RunStatistics, dry_run: bool) {
    println!();
    if dry_run {
        println!("{}", "=== DRY RUN SUMMARY ===".yellow());
    } else {
        println!("{}", "=== SUMMARY ===".bold());
    }
    println!("{}", stats);
    if stats.unmatched > 0 || stats.convert_failed > 0 || stats.placement_failed > 0 {
        println!("{}", "Some files need attention; see the log for details.".red());
    }
}

fn run_match(
    config: &AppConfig,
    filename: &str,
    roster_path: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    let roster_path = roster_path.unwrap_or_else(|| config.roster_path.clone());
    let roster = Roster::load(&roster_path)?;
    let matcher = Matcher::new(
        roster,
        MatchOptions {
            min_token_matches: config.min_token_matches,
            fuzzy_threshold: config.fuzzy_threshold,
        },
    );

    debug!("Matching against {} roster records", matcher.roster().len());
    match matcher.find_best(filename) {
        Some(found) => println!(
            "{} → {} ({}, match method: {})",
            filename,
            found.record.folder_name().green(),
            found.record.display_name(),
            found.method.to_string().cyan(),
        ),
        None => println!("{} → {}", filename, "no match".red()),
    }
    Ok(())
}

fn run_check_tools(config: &AppConfig) {
    match which::which(&config.converter_program) {
        Ok(path) => println!(
            "converter: {} ({})",
            "found".green(),
            path.display()
        ),
        Err(_) => println!(
            "converter: {} ('{}' not in PATH)",
            "missing".red(),
            config.converter_program
        ),
    }

    match Capabilities::detect().rar_tool {
        Some(path) => println!("unrar: {} ({})", "found".green(), path.display()),
        None => println!("unrar: {} (.rar archives will be skipped)", "missing".yellow()),
    }
}
