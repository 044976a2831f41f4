use url::Url;

/// Returns true if the IRI is absolute (has an RFC 3986 scheme).
///
/// A scheme is `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"`. Blank node
/// identifiers (`_:x`) are not absolute IRIs.
pub fn is_absolute_iri(value: &str) -> bool {
    let Some(colon_pos) = value.find(':') else {
        return false;
    };
    let scheme = &value[..colon_pos];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => chars
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.'),
        _ => false,
    }
}

pub fn is_blank_node_id(value: &str) -> bool {
    value.starts_with("_:")
}

/// Absolute IRI or blank node identifier: anything usable as a node id or property.
pub fn is_absolute_or_blank(value: &str) -> bool {
    is_blank_node_id(value) || is_absolute_iri(value)
}

/// Resolve a (possibly relative) IRI reference against a base IRI.
///
/// Absolute IRIs, blank node identifiers and values without a usable base are
/// returned unchanged.
pub fn resolve(base: Option<&str>, value: &str) -> String {
    if is_absolute_or_blank(value) {
        return value.to_string();
    }
    let Some(base) = base else {
        return value.to_string();
    };
    match Url::parse(base).and_then(|b| b.join(value)) {
        Ok(resolved) => resolved.to_string(),
        Err(e) => {
            tracing::trace!(base, value, error = %e, "IRI not resolvable against base");
            value.to_string()
        }
    }
}

/// Express an absolute IRI relative to a base IRI where possible.
pub fn relativize(base: Option<&str>, iri: &str) -> String {
    let Some(base) = base else {
        return iri.to_string();
    };
    let (Ok(base_url), Ok(iri_url)) = (Url::parse(base), Url::parse(iri)) else {
        return iri.to_string();
    };
    match base_url.make_relative(&iri_url) {
        Some(relative) if !relative.is_empty() => relative,
        _ => iri.to_string(),
    }
}

/// Split a compact IRI into `(prefix, suffix)`.
///
/// Returns `None` for strings without a colon, blank node identifiers and
/// hierarchical IRIs (`scheme://...`), none of which can be prefix-expanded.
pub fn split_compact_iri(value: &str) -> Option<(&str, &str)> {
    let (prefix, suffix) = value.split_once(':')?;
    if prefix == "_" || suffix.starts_with("//") {
        return None;
    }
    Some((prefix, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_iris() {
        assert!(is_absolute_iri("http://example.org/a"));
        assert!(is_absolute_iri("urn:uuid:1234"));
        assert!(is_absolute_iri("did:example:123"));
        assert!(!is_absolute_iri("_:b0"));
        assert!(!is_absolute_iri("relative/path"));
        assert!(!is_absolute_iri("1abc:def"));
    }

    #[test]
    fn resolves_relative_against_base() {
        assert_eq!(
            resolve(Some("http://example.org/dir/doc"), "other"),
            "http://example.org/dir/other"
        );
        assert_eq!(
            resolve(Some("http://example.org/dir/doc"), "#frag"),
            "http://example.org/dir/doc#frag"
        );
        assert_eq!(resolve(None, "other"), "other");
        assert_eq!(resolve(Some("http://example.org/"), "_:b0"), "_:b0");
    }

    #[test]
    fn relativizes_against_base() {
        assert_eq!(
            relativize(Some("http://example.org/dir/doc"), "http://example.org/dir/other"),
            "other"
        );
        assert_eq!(
            relativize(Some("http://example.org/"), "https://other.org/x"),
            "https://other.org/x"
        );
    }

    #[test]
    fn compact_iri_split() {
        assert_eq!(split_compact_iri("schema:name"), Some(("schema", "name")));
        assert_eq!(split_compact_iri("http://example.org"), None);
        assert_eq!(split_compact_iri("_:b0"), None);
        assert_eq!(split_compact_iri("name"), None);
    }
}
