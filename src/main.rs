use anyhow::Context;
use product_variations::config::AppConfig;
use product_variations::store::HttpBackend;
use product_variations::{LogNotifier, VariableSet, VariationSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("reqwest", LevelFilter::Warn)
        .filter_module("hyper", LevelFilter::Warn)
        .parse_default_env()
        .init();

    let config = AppConfig::load()?;
    log::info!("Combinations endpoint: {}", config.backend.combinations_url);

    let backend = HttpBackend::new(&config.backend)?;
    let mut session = VariationSession::load(
        backend,
        LogNotifier,
        config.variations.clone(),
        config.commit.clone(),
    )
    .await
    .context("failed to fetch persisted combinations")?;

    for variable in session.persisted().variables() {
        log::info!("{}: {}", variable.name, variable.values.join(", "));
    }
    log::info!("{} persisted combinations", session.identity().len());

    let Some(path) = std::env::args().nth(1) else {
        return Ok(());
    };

    let raw = std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path))?;
    let pending: VariableSet =
        serde_json::from_str(&raw).with_context(|| format!("invalid variable set in {}", path))?;
    session.replace_variables(pending)?;

    if !session.has_pending_changes() {
        log::info!("Nothing to do, {} matches the persisted combinations", path);
        return Ok(());
    }

    let diff = session.diff();
    log::info!(
        "Pending: {} to create, {} to delete",
        diff.to_create.len(),
        diff.to_delete.len()
    );
    for record in &diff.to_create {
        log::info!("  + {} ({})", record.combination, record.sku);
    }
    for combination in &diff.to_delete {
        log::info!("  - {}", combination);
    }

    session
        .commit(|progress| log::info!("Progress: {:.0}%", progress))
        .await?;

    log::info!(
        "Done, {} persisted combinations",
        session.identity().len()
    );
    Ok(())
}
