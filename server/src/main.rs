use clap::ArgAction;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use groupplan_server::cli;
use groupplan_server::cli_error::CliError;
use log::{error, warn};

fn main() {
    let args = CliArgs::parse();
    let dotenv_result = dotenv();

    let env = env_logger::Env::new().filter_or(
        "RUST_LOG",
        match args.global_opts.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        },
    );
    env_logger::Builder::from_env(env).init();
    if let Err(e) = dotenv_result {
        warn!("Could not read .env file: {}", e);
    }

    if let Err(e) = run(args.command) {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Serve => {
            cli::database_migration::check_migration_state()?;
            groupplan_server::web::serve()
        }
        Command::MigrateDb => cli::database_migration::run_migrations(),
        Command::ListEvents { group } => cli::manage_events::print_event_list(group),
        Command::CreateSessionToken { user_id } => {
            cli::manage_sessions::create_session_token(user_id)
        }
    }
}

/// Group scheduling server with event reservations
#[derive(Debug, Parser)]
#[clap(name = "groupplan", version)]
pub struct CliArgs {
    #[clap(flatten)]
    global_opts: GlobalOpts,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the group scheduling REST API
    Serve,
    /// Apply pending database schema migrations
    MigrateDb,
    /// List events with their reservation counts
    ListEvents {
        /// Only list the events of this group
        #[clap(long)]
        group: Option<i32>,
    },
    /// Issue a session token for an approved user
    CreateSessionToken {
        /// Id of the user
        user_id: i32,
    },
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Verbosity level (can be specified multiple times)
    #[clap(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,
}
