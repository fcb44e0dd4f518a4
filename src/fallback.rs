//! Ordered "try each, keep the first success" evaluation.
//!
//! Encoding resolution, delimiter probing and dataset loading are all the
//! same shape: a fixed list of alternatives, evaluated in order, where the
//! first one that works wins and the failures are kept for reporting.

/// Outcome of walking a list of alternatives.
#[derive(Debug)]
pub struct Attempts<C, E> {
    /// Alternatives that failed before the winner (or all of them).
    pub failures: Vec<(C, E)>,
}

impl<C, E> Default for Attempts<C, E> {
    fn default() -> Self {
        Self { failures: Vec::new() }
    }
}

/// Evaluate `attempt` for each candidate in order and return the first
/// success together with the candidate that produced it. When every
/// candidate fails, all failures are returned in evaluation order.
pub fn first_success<C, T, E, I, F>(
    candidates: I,
    mut attempt: F,
) -> Result<(C, T, Attempts<C, E>), Attempts<C, E>>
where
    I: IntoIterator<Item = C>,
    F: FnMut(&C) -> Result<T, E>,
{
    let mut tried = Attempts::default();
    for candidate in candidates {
        match attempt(&candidate) {
            Ok(value) => return Ok((candidate, value, tried)),
            Err(e) => tried.failures.push((candidate, e)),
        }
    }
    Err(tried)
}
