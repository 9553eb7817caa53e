use clap::Parser;

use urlshortener::config::{AppConfig, Args};
use urlshortener::runtime::modes::run_server;
use urlshortener::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if !args.no_dotenv {
        dotenvy::dotenv().ok();
    }

    let config = match AppConfig::load(&args.config).and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    let _guard = init_logging(&config.logging);

    run_server(&config).await
}
