// Check-recheck guard for deferred work with one suspension point.

use std::future::Future;

/// Run `fetch` unless `blocked()` reports true, re-checking after the
/// await. The second check catches a condition that became true while
/// the fetch was suspended, which a single up-front check would miss.
pub async fn fetch_unless<T, B, Fut>(mut blocked: B, fetch: Fut) -> Option<T>
where
    B: FnMut() -> bool,
    Fut: Future<Output = T>,
{
    if blocked() {
        return None;
    }
    let value = fetch.await;
    if blocked() {
        return None;
    }
    Some(value)
}
