use anyhow::Result;
use clap::Parser;

use kernel_settings::{cli, commands, logging};

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let name = args.command.name();
    logging::init_subscriber(args.verbose, name);
    let log = logging::Logger::new(name);

    match &args.command {
        cli::Command::Apply(opts) => commands::apply::run(&args.global, opts, &log),
        cli::Command::Validate(opts) => commands::validate::run(&args.global, opts, &log),
        cli::Command::Show(opts) => commands::show::run(opts, &log),
        cli::Command::Report(opts) => commands::report::run(opts, &log),
        cli::Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
