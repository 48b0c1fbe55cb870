/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as row ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: per-process sequence (4096 ids per ms before wrapping)
pub fn snowflake_id() -> i64 {
    use std::sync::atomic::{AtomicI64, Ordering};
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    static SEQUENCE: AtomicI64 = AtomicI64::new(0);
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) & 0xFFF; // 12 bits
    (ts << 12) | seq
}

/// Six-digit customer-facing number (100000..=999999).
///
/// Uniqueness is the caller's job; see the number allocators in the server.
pub fn six_digit_number() -> String {
    use rand::Rng;
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Payment confirmation number: `CONF-` plus 8 upper-case hex chars
pub fn confirmation_number() -> String {
    use rand::Rng;
    let n: u32 = rand::thread_rng().r#gen();
    format!("CONF-{:08X}", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_id_is_positive_and_safe_for_js() {
        let id = snowflake_id();
        assert!(id > 0);
        assert!(id < (1_i64 << 53));
    }

    #[test]
    fn test_snowflake_ids_in_a_burst_are_unique() {
        let ids: std::collections::HashSet<i64> = (0..1000).map(|_| snowflake_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_six_digit_number_range() {
        for _ in 0..200 {
            let n: u32 = six_digit_number().parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn test_confirmation_number_format() {
        let c = confirmation_number();
        assert!(c.starts_with("CONF-"));
        let hex = &c[5..];
        assert_eq!(hex.len(), 8);
        assert!(hex.chars().all(|ch| ch.is_ascii_digit() || ('A'..='F').contains(&ch)));
    }
}
