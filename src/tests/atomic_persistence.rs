#[cfg(test)]
mod test {
    use std::sync::atomic::Ordering;

    use crate::cache::token_cache::CachingTokenSource;
    use crate::helpers::fs::write_atomic;
    use crate::tests::common::{in_one_hour, seed_cache_entry, static_source, token_with_expiry};

    #[tokio::test]
    async fn interrupted_write_leaves_previous_entry_observable() {
        let dir = tempfile::tempdir().unwrap();
        let old = token_with_expiry("old-valid", Some(in_one_hour()));
        seed_cache_entry(dir.path(), "acct@example.com", &old);

        // crash before rename: an orphaned temp file next to the entry
        std::fs::write(dir.path().join(".tmpAbC123"), b"{\"acce").unwrap();

        let (source, calls) = static_source("acct@example.com", token_with_expiry("new", None));
        let ts = CachingTokenSource::new(source, dir.path().to_owned()).unwrap();
        let got = ts.token().await.unwrap();

        assert_eq!(got.access_token, "old-valid");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn persists_json_entry_and_raw_bearer_file() {
        let dir = tempfile::tempdir().unwrap();
        let tok = token_with_expiry("bearer-xyz", Some(in_one_hour()));
        let (source, _) = static_source("acct@example.com", tok);
        let ts = CachingTokenSource::new(source, dir.path().to_owned()).unwrap();

        let _ = ts.token().await.unwrap();

        let json_raw = std::fs::read(dir.path().join("acct@example.com.json")).unwrap();
        let on_disk: crate::cache::AccessToken = serde_json::from_slice(&json_raw).unwrap();
        assert_eq!(on_disk.access_token, "bearer-xyz");

        // raw bearer file: exact token string, no trailing newline
        let raw = std::fs::read_to_string(ts.access_token_path()).unwrap();
        assert_eq!(raw, "bearer-xyz");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cache_files_are_private_to_the_user() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tok = token_with_expiry("secret", Some(in_one_hour()));
        let (source, _) = static_source("acct@example.com", tok);
        let ts = CachingTokenSource::new(source, dir.path().to_owned()).unwrap();
        let _ = ts.token().await.unwrap();

        for path in [
            dir.path().join("acct@example.com.json"),
            ts.access_token_path(),
        ] {
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600, "permissions mismatch for {}", path.display());
        }
    }

    #[tokio::test]
    async fn url_audience_key_persists_under_an_encoded_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let key = "https://svc.example.com-compute-metadata";
        let tok = token_with_expiry("aud-bearer", Some(in_one_hour()));
        let (source, _) = static_source(key, tok);
        let ts = CachingTokenSource::new(source, dir.path().to_owned()).unwrap();

        let got = ts.token().await.unwrap();
        assert_eq!(got.access_token, "aud-bearer");

        // both files live directly in the cache dir, slashes encoded away
        let raw_path = ts.access_token_path();
        assert_eq!(raw_path.parent().unwrap(), dir.path());
        assert_eq!(std::fs::read_to_string(&raw_path).unwrap(), "aud-bearer");
        let json_name = format!("{}.json", crate::cache::token_cache::cache_file_name(key));
        assert!(dir.path().join(json_name).exists());

        // a second instance over the same dir resolves to the same entry
        let (source2, calls2) = static_source(key, token_with_expiry("other", None));
        let ts2 = CachingTokenSource::new(source2, dir.path().to_owned()).unwrap();
        let again = ts2.token().await.unwrap();
        assert_eq!(again.access_token, "aud-bearer");
        assert_eq!(calls2.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cache_file_names_stay_injective_and_path_free() {
        use crate::cache::token_cache::cache_file_name;

        assert_eq!(cache_file_name("acct@example.com"), "acct@example.com");
        assert_eq!(
            cache_file_name("https://svc.example.com-compute-metadata"),
            "https%3A%2F%2Fsvc.example.com-compute-metadata"
        );
        // pre-encoded input never collides with its decoded form
        assert_ne!(cache_file_name("a/b"), cache_file_name("a%2Fb"));
        for key in ["https://a/b?c=d", "..", "a\\b", "a b"] {
            let name = cache_file_name(key);
            assert!(!name.contains('/') && !name.contains('\\'), "{name}");
            assert_ne!(name, "..");
        }
    }

    #[tokio::test]
    async fn atomic_write_replaces_content_completely() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entry");

        write_atomic(&path, b"first-and-longer-content").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
