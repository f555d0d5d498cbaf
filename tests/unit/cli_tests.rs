//! Unit tests for CLI argument parsing and validation

use clap::Parser;
use querywatch::cli::{Cli, Commands, OutputFormat};
use std::path::PathBuf;

#[test]
fn test_cli_init_command() {
    let cli = Cli::try_parse_from(&["querywatch", "init"]).unwrap();
    match cli.command {
        Commands::Init { force } => {
            assert!(!force);
        }
        _ => panic!("Expected Init command"),
    }
    assert_eq!(cli.config, PathBuf::from("querywatch.json"));
}

#[test]
fn test_cli_init_command_with_force() {
    let cli = Cli::try_parse_from(&["querywatch", "init", "--force"]).unwrap();
    match cli.command {
        Commands::Init { force } => {
            assert!(force);
        }
        _ => panic!("Expected Init command"),
    }
}

#[test]
fn test_cli_validate_command() {
    let cli = Cli::try_parse_from(&["querywatch", "--config", "prod.json", "validate"]).unwrap();
    assert!(matches!(cli.command, Commands::Validate));
    assert_eq!(cli.config, PathBuf::from("prod.json"));
}

#[test]
fn test_cli_run_command_defaults() {
    let cli = Cli::try_parse_from(&["querywatch", "run"]).unwrap();
    match cli.command {
        Commands::Run { dry_run, quiet } => {
            assert!(!dry_run);
            assert!(!quiet);
        }
        _ => panic!("Expected Run command"),
    }
    assert!(!cli.verbose);
}

#[test]
fn test_cli_run_command_with_options() {
    let cli = Cli::try_parse_from(&["querywatch", "run", "--dry-run", "--quiet", "--verbose"]).unwrap();
    match cli.command {
        Commands::Run { dry_run, quiet } => {
            assert!(dry_run);
            assert!(quiet);
        }
        _ => panic!("Expected Run command"),
    }
    assert!(cli.verbose);
}

#[test]
fn test_cli_show_command() {
    let cli = Cli::try_parse_from(&["querywatch", "show", "--format", "json"]).unwrap();
    match cli.command {
        Commands::Show { format } => {
            assert_eq!(OutputFormat::parse(&format), Ok(OutputFormat::Json));
        }
        _ => panic!("Expected Show command"),
    }
}

#[test]
fn test_cli_rejects_unknown_command() {
    assert!(Cli::try_parse_from(&["querywatch", "watch"]).is_err());
    assert!(Cli::try_parse_from(&["querywatch"]).is_err());
}
