use clap::Parser;
use miette::Result;
use cotizador::cli::commands::{completions, eval, init, quote, validate};
use cotizador::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` terminates quietly instead of panicking.
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
    cotizador::init_tracing(global.verbose, global.quiet);

    match cli.command {
        Commands::Init(args) => init::run(args),
        Commands::Quote(args) => quote::run(args, &global),
        Commands::Eval(args) => eval::run(args, &global),
        Commands::Validate(args) => validate::run(args, &global),
        Commands::Completions(args) => completions::run(args),
    }
}
