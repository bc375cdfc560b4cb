use std::time::Duration;

use datastore::{DataStore, HttpApi, JsonFileCache};

use crate::error::{AppError, Result};

mod commands;
mod config;
mod display;
mod error;

#[tokio::main]
async fn main() -> Result<()> {
    let invocation = config::load()?;
    let settings = invocation.config;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "kanakku={level},datastore={level},engine={level}",
            level = settings.level
        ))
        .with_writer(std::io::stderr)
        .init();

    if settings.user_id.trim().is_empty() {
        return Err(AppError::Usage(
            "no user configured: set user_id in the config file, KANAKKU_USER_ID or --user-id"
                .to_string(),
        ));
    }

    let ctx = commands::Context {
        tz: settings.tz()?,
        batch_size: settings.batch_size,
        offline: invocation.offline,
        now: chrono::Utc::now(),
    };

    let api = HttpApi::new(
        &settings.api_url,
        Duration::from_secs(settings.request_timeout_secs),
    )?;
    let cache = JsonFileCache::load(&settings.cache_path)?;
    tracing::debug!("using cache at {}", cache.path().display());
    let store = DataStore::new(api, cache, settings.user_id.as_str(), settings.refresh_policy);

    let mut out = std::io::stdout().lock();
    commands::run(&store, &ctx, invocation.command, &mut out).await
}
