//! "First success wins" evaluation of an ordered list of strategies.

use std::future::Future;

/// Result of evaluating a strategy chain
#[derive(Debug)]
pub enum ChainResult<T, E> {
    /// A strategy succeeded; earlier failures are kept for logging
    Success {
        index: usize,
        value: T,
        failures: Vec<E>,
    },
    /// Every strategy failed (or the chain was empty)
    Exhausted(Vec<E>),
}

impl<T, E> ChainResult<T, E> {
    /// Whether some strategy succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, ChainResult::Success { .. })
    }

    /// Convert into a `Result`, dropping the index and failure history
    pub fn into_result(self) -> Result<T, Vec<E>> {
        match self {
            ChainResult::Success { value, .. } => Ok(value),
            ChainResult::Exhausted(failures) => Err(failures),
        }
    }
}

/// Run `run` on each strategy in order and stop at the first `Ok`.
///
/// Strategies are attempted strictly one after another. Later strategies are
/// never started once one succeeds.
pub async fn first_success<S, T, E, F, Fut>(
    strategies: impl IntoIterator<Item = S>,
    mut run: F,
) -> ChainResult<T, E>
where
    F: FnMut(usize, S) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut failures = Vec::new();

    for (index, strategy) in strategies.into_iter().enumerate() {
        match run(index, strategy).await {
            Ok(value) => {
                return ChainResult::Success {
                    index,
                    value,
                    failures,
                }
            }
            Err(error) => failures.push(error),
        }
    }

    ChainResult::Exhausted(failures)
}
