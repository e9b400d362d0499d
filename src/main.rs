use cellar::cli::{Cli, Commands};
use clap::Parser;
use env_logger::Env;
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    let level = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Init(args) => cellar::cli::commands::init::run(args),
        Commands::Import(args) => cellar::cli::commands::import::run(args, &global),
        Commands::Export(args) => cellar::cli::commands::export::run(args, &global),
        Commands::Item(cmd) => cellar::cli::commands::item::run(cmd, &global),
        Commands::Tin(cmd) => cellar::cli::commands::tin::run(cmd, &global),
        Commands::Stats(args) => cellar::cli::commands::stats::run(args, &global),
        Commands::Bulk(cmd) => cellar::cli::commands::bulk::run(cmd, &global),
        Commands::Config(cmd) => cellar::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => cellar::cli::commands::completions::run(args),
    }
}
