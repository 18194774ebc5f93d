#[cfg(test)]
mod test {
    use std::sync::atomic::Ordering;

    use crate::cache::token_cache::CachingTokenSource;
    use crate::errors::BrokerError;
    use crate::tests::common::{
        failing_source, in_one_hour, seed_cache_entry, static_source, token_with_expiry,
    };
    use chrono::Utc;

    #[tokio::test]
    async fn fresh_token_served_without_second_producer_call() {
        let dir = tempfile::tempdir().unwrap();
        let tok = token_with_expiry("val-1", Some(in_one_hour()));
        let (source, calls) = static_source("acct@example.com", tok);
        let ts = CachingTokenSource::new(source, dir.path().to_owned()).unwrap();

        let first = ts.token().await.unwrap();
        let second = ts.token().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disk_entry_served_in_fresh_process_without_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let tok = token_with_expiry("val-disk", Some(in_one_hour()));
        seed_cache_entry(dir.path(), "acct@example.com", &tok);

        // fresh instance, empty memory: must load from disk, no producer call
        let (source, calls) = static_source("acct@example.com", token_with_expiry("other", None));
        let ts = CachingTokenSource::new(source, dir.path().to_owned()).unwrap();
        let got = ts.token().await.unwrap();

        assert_eq!(got.access_token, "val-disk");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_disk_entry_triggers_exactly_one_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let stale = token_with_expiry("stale", Some(Utc::now()));
        seed_cache_entry(dir.path(), "acct@example.com", &stale);

        let (source, calls) =
            static_source("acct@example.com", token_with_expiry("fresh", Some(in_one_hour())));
        let ts = CachingTokenSource::new(source, dir.path().to_owned()).unwrap();
        let got = ts.token().await.unwrap();

        assert_eq!(got.access_token, "fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn token_without_expiry_is_never_refreshed() {
        let dir = tempfile::tempdir().unwrap();
        let eternal = token_with_expiry("no-expiry", None);
        seed_cache_entry(dir.path(), "acct@example.com", &eternal);

        let (source, calls) = static_source("acct@example.com", token_with_expiry("other", None));
        let ts = CachingTokenSource::new(source, dir.path().to_owned()).unwrap();
        let got = ts.token().await.unwrap();

        assert_eq!(got.access_token, "no-expiry");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn producer_failure_propagates_without_cache_write() {
        let dir = tempfile::tempdir().unwrap();
        let (source, calls) = failing_source("acct@example.com");
        let ts = CachingTokenSource::new(source, dir.path().to_owned()).unwrap();

        let err = ts.token().await.unwrap_err();
        assert!(matches!(err, BrokerError::Refresh(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!dir.path().join("acct@example.com.json").exists());
    }

    #[tokio::test]
    async fn stale_entry_is_not_substituted_for_a_refresh_error() {
        let dir = tempfile::tempdir().unwrap();
        let stale = token_with_expiry("stale", Some(Utc::now() - chrono::Duration::hours(1)));
        seed_cache_entry(dir.path(), "acct@example.com", &stale);

        let (source, _) = failing_source("acct@example.com");
        let ts = CachingTokenSource::new(source, dir.path().to_owned()).unwrap();

        let err = ts.token().await.unwrap_err();
        assert!(matches!(err, BrokerError::Refresh(_)));

        // previous entry is still intact on disk, it was just not served
        let raw = std::fs::read(dir.path().join("acct@example.com.json")).unwrap();
        let on_disk: crate::cache::AccessToken = serde_json::from_slice(&raw).unwrap();
        assert_eq!(on_disk.access_token, "stale");
    }

    #[tokio::test]
    async fn identity_view_shares_state_and_renders_id_token() {
        let dir = tempfile::tempdir().unwrap();
        let mut tok = token_with_expiry("access-val", Some(in_one_hour()));
        tok.id_token = Some("identity-val".to_owned());
        let (source, calls) = static_source("acct@example.com", tok);
        let ts = CachingTokenSource::new(source, dir.path().to_owned()).unwrap();

        let base = ts.token().await.unwrap();
        assert_eq!(base.access_token, "access-val");

        let view = ts.identity_view();
        let id = view.token().await.unwrap();
        assert_eq!(id.access_token, "identity-val");

        // the view reads the shared in-memory token, no extra producer call
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // the original still renders the plain access token
        let again = ts.token().await.unwrap();
        assert_eq!(again.access_token, "access-val");
    }
}
