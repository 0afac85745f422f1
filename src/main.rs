//! catalog-admin - Administer the product catalog API from the terminal
//!
//! Lists catalog resources and analytics through a throttled request cache
//! that is persisted between runs, and performs authenticated admin writes.

use std::io;
use std::process::ExitCode;

use clap::Parser;

use catalog_admin::app::App;
use catalog_admin::cli::{Cli, Settings};
use catalog_admin::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let action = cli.action()?;
    let settings = Settings::from_cli(cli);
    let app = App::new(&settings);

    let result = app.run(action, &mut io::stdout().lock()).await;

    // Failed requests never touch the cache, so saving is always safe
    app.persist();

    result?;
    Ok(())
}
