use catalog_harvest::utils::{logger, validation::Validate};
use catalog_harvest::{CsvIdSource, HarvestConfig, HarvestEngine, ProductExtractor};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = HarvestConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting catalog-harvest");
    if config.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let id_source = CsvIdSource::new(config.input_csv.clone());
    let engine = HarvestEngine::new(config, id_source, ProductExtractor);

    match engine.run().await {
        Ok(snapshot) => {
            tracing::info!(
                "Run finished: ok={}, not_found={}, failed={} in {:.2}s",
                snapshot.ok,
                snapshot.not_found,
                snapshot.failed,
                snapshot.total_elapsed.as_secs_f64()
            );
        }
        Err(e) => {
            tracing::error!("Harvest run failed: {}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
