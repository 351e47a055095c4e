// sqlgate - ask your database in plain english, safely

use sqlgate::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}
