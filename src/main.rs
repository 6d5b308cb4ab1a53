use std::io;
use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use redeam_availability::{
    parse_availabilities, present, sanitize, AvailabilityApi, AvailabilityError, Cli,
    ConsolePrompt, RedeamClient, Settings,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    dotenv::dotenv().ok();
    init_tracing(cli.log_level());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<AvailabilityError>() {
                Some(AvailabilityError::Config(_)) | None => eprintln!("Error: {:#}", err),
                Some(user_facing) => println!("{}", user_facing),
            }
            ExitCode::FAILURE
        }
    }
}

// Diagnostics go to stderr so the console output stays readable
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(&cli.config)
        .with_context(|| format!("failed to load credentials from {}", cli.config.display()))?;

    let mut prompt = ConsolePrompt::stdin();
    let (start_raw, end_raw) = cli.raw_bounds(Utc::now());
    let range = sanitize(&start_raw, &end_raw, &mut prompt)?;

    let query = cli.query();
    info!(
        supplier_id = %query.supplier_id,
        product_id = %query.product_id,
        start = %range.start,
        end = %range.end,
        "searching availability"
    );

    let client = RedeamClient::new(&settings.redeam_api, &settings.api)?;
    let response = client
        .get_availabilities(&query.supplier_id, &query.product_id, &range.start, &range.end)
        .await?;
    let data = parse_availabilities(&response)?;

    let mut out = io::stdout();
    present(&client, &query, &data, &mut prompt, &mut out).await?;
    Ok(())
}
