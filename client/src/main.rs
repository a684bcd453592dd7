use clap::Parser;
use plasma_api_client::{
    cli::{self, CliArgs},
    config::ApiConfig,
    PlasmaApi,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let CliArgs { endpoint, command } = CliArgs::parse();
    let api = PlasmaApi::new(ApiConfig::new(endpoint));
    let mut out = std::io::stdout().lock();
    cli::execute(&api, command, &mut out).await
}
