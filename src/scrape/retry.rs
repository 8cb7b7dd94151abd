use std::fmt::Display;
use std::future::Future;

#[derive(Debug, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    Success { value: T, attempts: u32 },
    Exhausted { attempts: u32 },
}

/// Why a single attempt did not produce a value.
pub enum AttemptFailure<'a, E> {
    Incomplete,
    Error(&'a E),
}

/// Runs `op` up to `max_attempts` times (1-based attempt number), stopping at the
/// first `Ok(Some(_))`. `Ok(None)` and `Err(_)` both count as a failed attempt and
/// are reported to `on_failure`; errors never end the loop early.
pub async fn retry<T, E, F, Fut, L>(max_attempts: u32, mut op: F, mut on_failure: L) -> RetryOutcome<T>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    L: FnMut(u32, AttemptFailure<'_, E>),
{
    for attempt in 1..=max_attempts {
        match op(attempt).await {
            Ok(Some(value)) => return RetryOutcome::Success { value, attempts: attempt },
            Ok(None) => on_failure(attempt, AttemptFailure::Incomplete),
            Err(e) => on_failure(attempt, AttemptFailure::Error(&e)),
        }
    }
    RetryOutcome::Exhausted { attempts: max_attempts }
}
