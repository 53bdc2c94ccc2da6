use clap::{Parser, Subcommand};

use prople_scribed::errors::ScribeError;
use prople_scribed::svc::rpc::Rpc;

#[derive(Parser)]
#[command(name = "scribed")]
#[command(version = "1.0")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "rpc")]
    #[command(about = "Running JSON-RPC server")]
    Rpc {
        #[arg(short, long, value_name = "FILE")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), ScribeError> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Rpc { config } => {
            let rpc_server = Rpc::new(config.to_owned());
            let svc = rpc_server.svc().await?;
            svc.serve().await?;
        }
    }

    Ok(())
}
