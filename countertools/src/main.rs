use clap::Parser;
use log::*;

mod counter;
mod formatting;

use crate::counter::{handle_counter_command, CounterCommand};

#[derive(Parser, Debug)]
#[command(version, about = "Operator tools for the walk-up counter")]
pub struct Arguments {
    /// The database to use. Overrides COUNTER_DATABASE_URL
    #[arg(short = 'd', long = "database", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: CounterCommand,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    if let Err(e) = handle_counter_command(cli.command, cli.database_url).await {
        error!("Command failed. {e:#}");
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
