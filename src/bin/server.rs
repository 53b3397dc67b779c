use std::path::PathBuf;

use clap::Parser;
use udb::{server, Error};

const DEFAULT_SOCKET_PATH: &str = "/tmp/udb.sock";

#[derive(Parser, Debug)]
struct Args {
    /// Path to file where the unix socket will be created
    #[arg(short = 'p', long, default_value = DEFAULT_SOCKET_PATH)]
    socket_path: PathBuf,

    /// Path to file where database state will be saved
    #[arg(short = 'f', long)]
    db_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    server::run(server::Options {
        socket_path: args.socket_path,
        db_file: args.db_file,
    })
    .await
}
