use clap::{CommandFactory, Parser};
use simrv_cli::{Cli, Commands};

#[test]
fn test_cli_definition() {
    Cli::command().debug_assert();
}

#[test]
fn test_parse_run() {
    let cli = Cli::try_parse_from([
        "simrv",
        "-vv",
        "run",
        "program.elf",
        "--max-steps",
        "42",
        "--memory-size",
        "65536",
        "--trace-regs",
    ])
    .unwrap();
    assert_eq!(cli.verbose, 2);
    let Commands::Run(cmd) = cli.command else { panic!("expected run") };
    assert_eq!(cmd.elf.to_str(), Some("program.elf"));
    assert_eq!(cmd.max_steps, 42);
    assert_eq!(cmd.memory_size, 65536);
    assert!(cmd.trace_regs);
}

#[test]
fn test_parse_dump() {
    let cli = Cli::try_parse_from(["simrv", "dump", "program.elf"]).unwrap();
    assert_eq!(cli.verbose, 0);
    assert!(!cli.log_json);
    assert!(matches!(cli.command, Commands::Dump(_)));
}

#[test]
fn test_log_json_is_global() {
    let cli = Cli::try_parse_from(["simrv", "dump", "program.elf", "--log-json"]).unwrap();
    assert!(cli.log_json);
}

#[test]
fn test_run_requires_elf() {
    assert!(Cli::try_parse_from(["simrv", "run"]).is_err());
}

#[test]
fn test_run_missing_file_fails() {
    let cli = Cli::try_parse_from(["simrv", "run", "/nonexistent/program.elf"]).unwrap();
    let err = cli.command.run().unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/program.elf"));
}
