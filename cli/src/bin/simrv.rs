use clap::Parser;
use simrv_cli::{init_tracing, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);
    cli.command.run()
}
