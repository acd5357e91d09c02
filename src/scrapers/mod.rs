//! Ready-made scrapers and task assembly from configuration

mod selector;

pub use selector::{Field, SelectorScraper};

use crate::config::{EngineConfig, ScrapConfig};
use crate::crawler::Task;
use crate::middleware::{DelayMiddleware, LogMiddleware, ThrottleMiddleware};
use crate::output::open_writer;
use crate::Result;

/// Builds the task described by a scrap entry
///
/// Middlewares are registered in a fixed order: log, throttle, delay.
/// Outputs are opened here, so a file that cannot be created fails before
/// any request is sent.
pub fn task_from_config(scrap: &ScrapConfig, engine: &EngineConfig) -> Result<Task> {
    let scraper = SelectorScraper::from_config(scrap)?;
    let field_names: Vec<String> = scrap.fields.iter().map(|f| f.name.clone()).collect();

    let mut task = Task::new(scrap.name.clone(), scraper)
        .with_retry_limit(scrap.retry_limit.unwrap_or(engine.retry_limit));

    if scrap.log_requests {
        task = task.with_middleware(LogMiddleware::new());
    }
    if scrap.min_domain_interval_ms > 0 {
        task = task.with_middleware(ThrottleMiddleware::from_millis(scrap.min_domain_interval_ms));
    }
    if scrap.delay_ms > 0 {
        task = task.with_middleware(DelayMiddleware::from_millis(scrap.delay_ms));
    }

    for output in &scrap.outputs {
        task = task.with_boxed_writer(open_writer(output, &field_names, &scrap.unique_by)?);
    }

    for seed in &scrap.seeds {
        task.add_request(seed.as_str());
    }

    Ok(task)
}
