use clap::Parser;
use taskmate::cli::commands::{Cli, Commands};
use taskmate::cli::handlers::{self, AppContext};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            // No subcommand → launch TUI
            AppContext::load(cli.data_dir.as_deref()).and_then(|ctx| taskmate::tui::run(&ctx))
        }
        Some(Commands::Init(args)) => {
            // Init is handled before data directory discovery
            handlers::cmd_init(args, cli.data_dir.as_deref())
        }
        Some(_) => handlers::dispatch(cli),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
