use anyhow::{Context, Result};
use weather_core::{Config, Mode};
use weather_sdk::WeatherRegistry;

/// Usage: weather [--polling] [CITY...]
#[tokio::main]
async fn main() -> Result<()> {
    weather_core::init()?;

    let (config, _) = Config::load_validated()?;
    let api_key = config.require_api_key()?.to_string();

    let mut mode = config.default_mode;
    let mut cities = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--polling" => mode = Mode::Polling,
            "--on-demand" => mode = Mode::OnDemand,
            _ => cities.push(arg),
        }
    }

    let registry = WeatherRegistry::from_config(&config)?;
    let sdk = registry.create("cli", &api_key, mode)?;

    match mode {
        Mode::OnDemand => {
            if cities.is_empty() {
                anyhow::bail!("Usage: weather [--polling] CITY...");
            }
            for city in &cities {
                let record = sdk
                    .weather_for(city)
                    .await
                    .with_context(|| format!("Failed to get weather for {}", city))?;
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        }
        Mode::Polling => {
            // Seed the shared cache, then poll it
            let seeder = registry.create("cli-seed", &api_key, Mode::OnDemand)?;
            for city in &cities {
                seeder.weather_for(city).await?;
            }
            seeder.delete()?;

            let all = sdk.poll().await?;
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
    }

    sdk.delete()?;
    tracing::info!("Done");
    Ok(())
}
