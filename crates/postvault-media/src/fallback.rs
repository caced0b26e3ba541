//! Ordered fallback over candidate URLs.
//!
//! Each candidate is tried in turn until one yields a value. A candidate that
//! answers with a non-success status moves on to the next; a transport error
//! ends the chain immediately, since the remaining candidates share the same
//! host and would fail the same way.

use std::future::Future;

use crate::error::MediaError;

/// Result of attempting a single candidate.
#[derive(Debug)]
pub enum Attempt<T> {
    /// The candidate produced a value; stop here.
    Done(T),
    /// The candidate was reachable but unusable; try the next one.
    Rejected { status: u16 },
}

/// Runs `attempt` over `candidates` in order and returns the first
/// [`Attempt::Done`] value, or `Ok(None)` if every candidate was rejected.
///
/// # Errors
///
/// Returns the first [`MediaError`] raised by `attempt`, without trying the
/// remaining candidates.
pub(crate) async fn first_success<T, F, Fut>(
    candidates: &[String],
    mut attempt: F,
) -> Result<Option<T>, MediaError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Attempt<T>, MediaError>>,
{
    for (position, candidate) in candidates.iter().enumerate() {
        match attempt(candidate.clone()).await? {
            Attempt::Done(value) => return Ok(Some(value)),
            Attempt::Rejected { status } => {
                tracing::debug!(
                    position,
                    status,
                    url = %candidate,
                    "media candidate rejected, trying next"
                );
            }
        }
    }
    Ok(None)
}
