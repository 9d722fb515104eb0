use crate::utils::ServiceError;
use log::warn;
use std::thread;
use std::time::Duration;

/// Default attempt budget for external-service calls.
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Runs `op` up to `attempts` times, sleeping 2s, 4s, 8s (capped at
/// 10s) between tries. Only transient failures are retried; a permanent
/// failure or an exhausted budget is returned to the caller, which
/// degrades the affected field rather than aborting the document.
pub fn with_backoff<T, F>(label: &str, attempts: u32, op: F) -> Result<T, ServiceError>
where
    F: FnMut() -> Result<T, ServiceError>,
{
    with_backoff_after(label, attempts, Duration::from_secs(2), op)
}

pub fn with_backoff_after<T, F>(
    label: &str,
    attempts: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Result<T, ServiceError>,
{
    let mut delay = base_delay;
    let max_delay = Duration::from_secs(10);

    for attempt in 1..=attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < attempts => {
                warn!(
                    "{}: transient failure on attempt {}/{}: {}",
                    label, attempt, attempts, err
                );
                thread::sleep(delay);
                delay = (delay * 2).min(max_delay);
            }
            Err(err) => return Err(err),
        }
    }

    // attempts == 0; nothing was tried.
    Err(ServiceError::Permanent(format!(
        "{}: no attempts configured",
        label
    )))
}
