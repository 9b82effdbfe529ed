//! Debounce and last-query-wins guard for remote catalog searches.
//!
//! Each search box gets one [`SearchLane`]. Every keystroke claims a new
//! generation; the remote fetch only runs once the debounce window settles
//! with no newer generation, and its results are discarded if a newer query
//! took over while the fetch was in flight. A slow early response can never
//! overwrite a fast later one.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Outcome of one debounced search attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome<T> {
    /// The query settled and the fetch ran to completion.
    Results(Vec<T>),
    /// The query was below the minimum length; no fetch was issued.
    TooShort,
    /// A newer query took over this lane; any result was discarded.
    Superseded,
}

/// One search lane: a debounce window plus a generation counter.
#[derive(Debug)]
pub struct SearchLane {
    generation: AtomicU64,
    debounce: Duration,
    min_chars: usize,
}

impl SearchLane {
    pub fn new(debounce: Duration, min_chars: usize) -> Self {
        Self {
            generation: AtomicU64::new(0),
            debounce,
            min_chars,
        }
    }

    /// Run `fetch` for `query` once the debounce window settles.
    ///
    /// The fetch is skipped entirely when the trimmed query is shorter than
    /// the lane's minimum, or when a newer call arrived during the debounce
    /// window. Fetch errors pass through untouched so the caller can apply
    /// its own failure policy.
    pub async fn run<T, E, F, Fut>(&self, query: &str, fetch: F) -> Result<SearchOutcome<T>, E>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let claimed = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let trimmed = query.trim();
        if trimmed.chars().count() < self.min_chars {
            return Ok(SearchOutcome::TooShort);
        }

        tokio::time::sleep(self.debounce).await;
        if self.generation.load(Ordering::SeqCst) != claimed {
            return Ok(SearchOutcome::Superseded);
        }

        let results = fetch(trimmed.to_string()).await?;
        if self.generation.load(Ordering::SeqCst) != claimed {
            return Ok(SearchOutcome::Superseded);
        }

        Ok(SearchOutcome::Results(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn lane() -> SearchLane {
        SearchLane::new(Duration::from_millis(350), 3)
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_issues_no_fetch() {
        let lane = lane();
        let calls = Arc::new(AtomicUsize::new(0));

        for query in ["", "a", "ab", "  ab  "] {
            let calls = calls.clone();
            let outcome: Result<SearchOutcome<String>, Infallible> = lane
                .run(query, move |_| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![])
                })
                .await;
            assert_eq!(outcome.unwrap(), SearchOutcome::TooShort);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_fetches_once() {
        let lane = lane();
        let calls = Arc::new(AtomicUsize::new(0));

        // "a", "ab", "abc" typed inside one debounce window.
        let first = lane.run("a", |_| async move {
            Ok::<_, Infallible>(vec!["x".to_string()])
        });
        let second = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            lane.run("ab", |_| async move {
                Ok::<_, Infallible>(vec!["x".to_string()])
            })
            .await
        };
        let third = {
            let calls = calls.clone();
            let lane = &lane;
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                lane.run("abc", move |query| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(vec![format!("hit for {query}")])
                })
                .await
            }
        };

        let (first, second, third) = tokio::join!(first, second, third);
        assert_eq!(first.unwrap(), SearchOutcome::TooShort);
        assert_eq!(second.unwrap(), SearchOutcome::TooShort);
        assert_eq!(
            third.unwrap(),
            SearchOutcome::Results(vec!["hit for abc".to_string()])
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_query_supersedes_during_debounce() {
        let lane = lane();
        let calls = Arc::new(AtomicUsize::new(0));

        let early = {
            let calls = calls.clone();
            lane.run("farm", move |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(vec!["early".to_string()])
            })
        };
        let late = {
            let calls = calls.clone();
            let lane = &lane;
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                lane.run("farmhouse", move |_| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(vec!["late".to_string()])
                })
                .await
            }
        };

        let (early, late) = tokio::join!(early, late);
        assert_eq!(early.unwrap(), SearchOutcome::Superseded);
        assert_eq!(late.unwrap(), SearchOutcome::Results(vec!["late".to_string()]));
        // The superseded attempt never reached the network.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_response_discarded_after_newer_query() {
        let lane = lane();

        // First query's fetch is slow; a newer query lands while it runs.
        let slow = lane.run("feed", |_| async move {
            tokio::time::sleep(Duration::from_millis(600)).await;
            Ok::<_, Infallible>(vec!["stale".to_string()])
        });
        let fast = async {
            // Arrives after the first fetch has started (350ms debounce).
            tokio::time::sleep(Duration::from_millis(400)).await;
            lane.run("feeder", |_| async move {
                Ok::<_, Infallible>(vec!["fresh".to_string()])
            })
            .await
        };

        let (slow, fast) = tokio::join!(slow, fast);
        assert_eq!(slow.unwrap(), SearchOutcome::Superseded);
        assert_eq!(fast.unwrap(), SearchOutcome::Results(vec!["fresh".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_passes_through() {
        let lane = lane();
        let outcome: Result<SearchOutcome<String>, &str> =
            lane.run("chicks", |_| async move { Err("boom") }).await;
        assert_eq!(outcome.unwrap_err(), "boom");
    }
}
