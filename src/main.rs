use anyhow::Result;
use ledgerlens::cli::{self, CommandContext};

fn main() -> Result<()> {
    let cli = cli::parse_args();
    cli::init_logging(cli.verbosity);

    let ctx = CommandContext::from_cli(&cli)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    cli::run(cli, &ctx, &mut out)
}
