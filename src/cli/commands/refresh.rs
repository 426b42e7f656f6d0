use crate::config::Config;
use crate::services::tasks::refresh::refresh_stale_sources;
use crate::state::SharedState;

pub async fn cmd_refresh_stale(config: &Config, failure_threshold: i32) -> anyhow::Result<()> {
    let shared = SharedState::new(config.clone()).await?;
    let refreshed = refresh_stale_sources(shared.task_context(), failure_threshold).await?;
    println!("Refreshed {refreshed} stale source(s) (failure threshold: {failure_threshold}).");
    Ok(())
}
