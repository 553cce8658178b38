use std::sync::Arc;

use wakeup_fitness_client::{
    FitnessAggregator, config::Config, http_client::ReqwestHealthDataSource,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example: expects GOOGLE_FIT_ACCESS_TOKEN in env
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(());
        }
    };
    let source = ReqwestHealthDataSource::from_config(&cfg);
    let aggregator = FitnessAggregator::new(Arc::new(source));
    if !aggregator.has_access() {
        eprintln!("no session: set GOOGLE_FIT_ACCESS_TOKEN");
        return Ok(());
    }

    let summary = aggregator.summary(cfg.window_days).await?;
    println!(
        "Last {} days: {} steps ({} per day), {:.1} h sleep ({:.1} h per night)",
        summary.days,
        summary.total_steps,
        summary.average_daily_steps,
        summary.total_sleep_hours,
        summary.average_sleep_hours
    );
    Ok(())
}
