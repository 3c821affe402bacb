use intake_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (state, router) = intake_api::setup::initialize_app(config).await?;

    intake_api::setup::server::start_server(&state.config, router).await?;

    Ok(())
}
