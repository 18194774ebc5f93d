use clap::Parser;
use token_broker::cli::{self, Cli};
use token_broker::utils::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level, cli.log_format);

    match cli::run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            std::process::exit(1);
        }
    }
}
