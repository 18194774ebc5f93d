#[cfg(test)]
mod test {
    use chrono::{Duration, Timelike, Utc};

    use crate::cache::token::AccessToken;
    use crate::tests::common::token_with_expiry;

    #[test]
    fn round_trips_all_freshness_relevant_fields() {
        let expiry = (Utc::now() + Duration::hours(1)).with_nanosecond(0).unwrap();
        let tok = AccessToken {
            access_token: "at".to_owned(),
            token_type: "Bearer".to_owned(),
            refresh_token: Some("rt".to_owned()),
            expiry: Some(expiry),
            id_token: Some("idt".to_owned()),
        };

        let json = serde_json::to_string(&tok).unwrap();
        let back: AccessToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tok);
    }

    #[test]
    fn minimal_token_omits_absent_fields() {
        let tok = token_with_expiry("at-only", None);
        let json = serde_json::to_string(&tok).unwrap();

        assert!(!json.contains("refresh_token"));
        assert!(!json.contains("expiry"));
        assert!(!json.contains("id_token"));

        let back: AccessToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tok);
        assert!(back.is_fresh(Utc::now()));
    }

    #[test]
    fn freshness_predicate_is_strictly_greater_than_now() {
        let now = Utc::now();
        assert!(!token_with_expiry("t", Some(now)).is_fresh(now));
        assert!(!token_with_expiry("t", Some(now - Duration::seconds(1))).is_fresh(now));
        assert!(token_with_expiry("t", Some(now + Duration::seconds(1))).is_fresh(now));
        assert!(token_with_expiry("t", None).is_fresh(now));
    }

    #[test]
    fn bearer_rendering_selects_the_requested_field() {
        let mut tok = token_with_expiry("access-val", None);
        tok.id_token = Some("identity-val".to_owned());

        assert_eq!(tok.bearer(false), "access-val");
        assert_eq!(tok.bearer(true), "identity-val");
        assert_eq!(tok.rendered(true).access_token, "identity-val");
        assert_eq!(tok.rendered(false).access_token, "access-val");

        // identity render with no assertion present yields an empty bearer
        let bare = token_with_expiry("only-access", None);
        assert_eq!(bare.bearer(true), "");
    }
}
