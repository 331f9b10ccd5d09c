//! `Content-Encoding` and `Accept-Encoding` negotiation.
//!
//! Token comparison against `gzip` is case-insensitive in every path.
//! A missing header means "no preference / no encoding" and is treated
//! differently from an empty header value.

/// The gzip encoding token.
pub const GZIP: &str = "gzip";

/// Check whether any of the (possibly multi-valued) `Content-Encoding`
/// header values claims gzip.
///
/// Each value is split on commas and trimmed, so `gzip`, `GZIP` and
/// `identity, gzip` all claim gzip.
pub fn claims_gzip<'a, I>(values: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .flat_map(|value| value.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case(GZIP))
}

/// Negotiate response compression from an `Accept-Encoding` header.
///
/// Returns true when the caller advertised gzip support. `None` means the
/// caller stated no preference and gets an uncompressed response. A `q=0`
/// parameter marks an otherwise acceptable token as "not acceptable" per
/// RFC 7231.
pub fn accepts_gzip(accept: Option<&str>) -> bool {
    let Some(accept) = accept else {
        return false;
    };

    for token in accept.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        // Parse "gzip;q=0.5" into encoding="gzip", q_value=Some("0.5")
        let (encoding, q_value) = match token.split_once(';') {
            Some((enc, params)) => {
                let q = params.split(';').find_map(|p| p.trim().strip_prefix("q="));
                (enc.trim(), q)
            }
            None => (token, None),
        };

        if !encoding.eq_ignore_ascii_case(GZIP) {
            continue;
        }

        // Skip if q=0 (explicitly disabled)
        if let Some(q) = q_value {
            let q = q.trim();
            if q == "0" || q == "0.0" || q == "0.00" || q == "0.000" {
                continue;
            }
        }

        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_gzip_single_value() {
        assert!(claims_gzip(["gzip"]));
        assert!(claims_gzip(["GZIP"]));
        assert!(claims_gzip(["Gzip"]));
        assert!(!claims_gzip(["identity"]));
        assert!(!claims_gzip(["br"]));
    }

    #[test]
    fn test_claims_gzip_multi_value() {
        assert!(claims_gzip(["identity", "gzip"]));
        assert!(claims_gzip(["identity, gzip"]));
        assert!(!claims_gzip(["identity", "br"]));
    }

    #[test]
    fn test_claims_gzip_empty() {
        assert!(!claims_gzip([] as [&str; 0]));
        assert!(!claims_gzip([""]));
    }

    #[test]
    fn test_accepts_gzip_basic() {
        assert!(accepts_gzip(Some("gzip")));
        assert!(accepts_gzip(Some("GZIP")));
        assert!(accepts_gzip(Some("deflate, gzip")));
        assert!(accepts_gzip(Some("gzip, identity")));
    }

    #[test]
    fn test_accepts_gzip_absent_or_empty() {
        assert!(!accepts_gzip(None));
        assert!(!accepts_gzip(Some("")));
        assert!(!accepts_gzip(Some("identity")));
        assert!(!accepts_gzip(Some("br, zstd")));
    }

    #[test]
    fn test_accepts_gzip_q_values() {
        // q=0 means "not acceptable"
        assert!(!accepts_gzip(Some("gzip;q=0")));
        assert!(!accepts_gzip(Some("gzip;q=0.0")));
        // Non-zero q values are accepted
        assert!(accepts_gzip(Some("gzip;q=1")));
        assert!(accepts_gzip(Some("gzip;q=0.5")));
    }
}
