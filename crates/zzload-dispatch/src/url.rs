//! Candidate URL normalization

/// Normalize a rendered or declared candidate so that absolute,
/// protocol-relative and root-relative spellings of the same resource on
/// this page compare equal.
pub fn normalize_candidate(url: &str, origin: Option<&str>) -> String {
    let trimmed = url.trim();
    let Some(origin) = origin.filter(|o| !o.is_empty()) else {
        return trimmed.strip_prefix("//").unwrap_or(trimmed).to_owned();
    };

    if let Some(rest) = trimmed.strip_prefix(origin) {
        return rest.to_owned();
    }

    let relative = trimmed.strip_prefix("//").unwrap_or(trimmed);
    let host = origin.split_once("://").map_or(origin, |(_, host)| host);
    relative.strip_prefix(host).unwrap_or(relative).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: Option<&str> = Some("https://example.com");

    #[test]
    fn test_absolute_same_origin() {
        assert_eq!(normalize_candidate("https://example.com/a.jpg", ORIGIN), "/a.jpg");
    }

    #[test]
    fn test_protocol_relative_same_host() {
        assert_eq!(normalize_candidate("//example.com/a.jpg", ORIGIN), "/a.jpg");
    }

    #[test]
    fn test_root_relative_untouched() {
        assert_eq!(normalize_candidate("/a.jpg", ORIGIN), "/a.jpg");
    }

    #[test]
    fn test_foreign_origin_kept() {
        assert_eq!(
            normalize_candidate("https://cdn.net/a.jpg", ORIGIN),
            "https://cdn.net/a.jpg"
        );
        assert_eq!(normalize_candidate("//cdn.net/a.jpg", ORIGIN), "cdn.net/a.jpg");
    }

    #[test]
    fn test_without_origin() {
        assert_eq!(normalize_candidate("//cdn.net/a.jpg", None), "cdn.net/a.jpg");
        assert_eq!(normalize_candidate(" a.jpg ", Some("")), "a.jpg");
    }
}
