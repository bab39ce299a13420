//! Runtime Tests
//!
//! Validates the locality scheduler and the completion accounting.
//!
//! ## Test Scopes
//! - **Dispatch**: `execute_on_all` coherence, for-each fan-out coverage.
//! - **CompletionHandle**: state machine, drain accounting, error
//!   aggregation, reuse after reset.

#[cfg(test)]
mod tests {
    use crate::config::RuntimeConfig;
    use crate::error::MapError;
    use crate::runtime::{CompletionHandle, Locality, Runtime};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn runtime(localities: usize) -> Arc<Runtime> {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        Runtime::new(RuntimeConfig {
            localities,
            workers_per_locality: 4,
        })
    }

    #[tokio::test]
    async fn execute_on_all_runs_once_per_locality() {
        let rt = runtime(4);
        let hits = Arc::new(AtomicUsize::new(0));

        let seen = hits.clone();
        rt.execute_on_all(move |_ctx| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn execute_on_all_visits_every_locality() {
        let rt = runtime(3);
        let visited = Arc::new(Mutex::new(HashSet::new()));

        let seen = visited.clone();
        rt.execute_on_all(move |ctx| {
            seen.lock().unwrap().insert(ctx.locality);
            Ok(())
        })
        .await
        .unwrap();

        let visited = visited.lock().unwrap();
        assert_eq!(visited.len(), 3);
        for ordinal in 0..3 {
            assert!(visited.contains(&Locality(ordinal)));
        }
    }

    #[tokio::test]
    async fn for_each_at_invokes_count_times() {
        let rt = runtime(2);
        let handle = CompletionHandle::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let seen = hits.clone();
        rt.async_for_each_at(
            &handle,
            Locality(1),
            Arc::new(move |ctx: &crate::runtime::LocalityContext, _i| {
                assert_eq!(ctx.locality, Locality(1));
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            1000,
        )
        .unwrap();
        handle.wait().await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1000);
        assert_eq!(handle.issued(), 1000);
        assert_eq!(handle.completed(), 1000);
    }

    #[tokio::test]
    async fn for_each_on_all_covers_the_index_space() {
        let rt = runtime(4);
        let handle = CompletionHandle::new();
        let indices = Arc::new(Mutex::new(HashSet::new()));

        let seen = indices.clone();
        rt.async_for_each_on_all(
            &handle,
            Arc::new(move |_ctx: &crate::runtime::LocalityContext, i| {
                seen.lock().unwrap().insert(i);
                Ok(())
            }),
            103,
        )
        .unwrap();
        handle.wait().await.unwrap();

        let indices = indices.lock().unwrap();
        assert_eq!(indices.len(), 103, "each index visited exactly once");
        assert!(indices.iter().all(|&i| i < 103));
        assert_eq!(handle.issued(), 103);
        assert_eq!(handle.completed(), 103);
    }

    // ============================================================
    // COMPLETION HANDLE
    // ============================================================

    #[tokio::test]
    async fn wait_on_empty_handle_returns_immediately() {
        let handle = CompletionHandle::new();
        assert!(handle.is_drained());
        handle.wait().await.unwrap();
        assert_eq!(handle.issued(), 0);
    }

    #[tokio::test]
    async fn wait_returns_only_after_every_completion() {
        let rt = runtime(2);
        let handle = CompletionHandle::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let seen = hits.clone();
        rt.async_for_each_on_all(
            &handle,
            Arc::new(move |_ctx: &crate::runtime::LocalityContext, _i| {
                // Slow the completions down so an early return would be
                // observable.
                std::thread::sleep(std::time::Duration::from_millis(1));
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            64,
        )
        .unwrap();
        handle.wait().await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 64);
        assert_eq!(handle.completed(), handle.issued());
    }

    #[tokio::test]
    async fn first_error_wins_and_siblings_still_complete() {
        let rt = runtime(2);
        let handle = CompletionHandle::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let seen = hits.clone();
        rt.async_for_each_on_all(
            &handle,
            Arc::new(move |_ctx: &crate::runtime::LocalityContext, i| {
                seen.fetch_add(1, Ordering::SeqCst);
                if i % 10 == 3 {
                    Err(MapError::CapacityExceeded(format!("entry {i}")))
                } else {
                    Ok(())
                }
            }),
            50,
        )
        .unwrap();

        let outcome = handle.wait().await;
        assert!(matches!(outcome, Err(MapError::CapacityExceeded(_))));
        // Every sibling ran and was accounted for despite the failures.
        assert_eq!(hits.load(Ordering::SeqCst), 50);
        assert_eq!(handle.completed(), 50);
    }

    #[tokio::test]
    async fn handle_is_reusable_after_drain() {
        let rt = runtime(2);
        let handle = CompletionHandle::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for round in 1..=3usize {
            let seen = hits.clone();
            rt.async_for_each_on_all(
                &handle,
                Arc::new(move |_ctx: &crate::runtime::LocalityContext, _i| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
                10,
            )
            .unwrap();
            handle.wait().await.unwrap();

            assert_eq!(handle.issued(), 10);
            assert_eq!(hits.load(Ordering::SeqCst), round * 10);
            handle.reset();
            assert!(handle.is_drained());
        }
    }
}
