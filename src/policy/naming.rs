use ring::digest::{digest, SHA256};

use crate::model::proxy::ProxyIdentity;

/// Prefix of every proxy workload name
pub static RESOURCE_PREFIX: &str = "envoy";

/// Longest identity part kept before the hash suffix; prefix + part + suffix stay within 63 chars.
const MAX_NAME_PART_LEN: usize = 48;
const HASH_SUFFIX_LEN: usize = 8;

/// Stable resource name shared by both workload kinds of a proxy.
pub fn derived_name(identity: &ProxyIdentity) -> String {
    format!("{RESOURCE_PREFIX}-{}", hashed_name(&identity.qualified_name(), MAX_NAME_PART_LEN))
}

/// Sanitizes `qualified_name` into a DNS label, truncated to `max_len`, suffixed with a sha256 prefix
/// computed on the original input.
pub fn hashed_name(qualified_name: &str, max_len: usize) -> String {
    let hash = hex::encode(digest(&SHA256, qualified_name.as_bytes()));

    let sanitized = qualified_name
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>();

    let truncated = if sanitized.len() > max_len { &sanitized[..max_len] } else { &sanitized[..] };
    let trimmed = truncated.trim_matches('-');
    let suffix = &hash[..HASH_SUFFIX_LEN];

    if trimmed.is_empty() {
        String::from(suffix)
    } else {
        format!("{trimmed}-{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_stable() {
        let identity = ProxyIdentity::for_gateway("default", "eg");
        assert_eq!(derived_name(&identity), derived_name(&identity.clone()));
        assert!(derived_name(&identity).starts_with("envoy-default-eg-"));
    }

    #[test]
    fn labels_do_not_affect_name() {
        let owned = ProxyIdentity::for_gateway("default", "eg");
        let bare = ProxyIdentity { labels: Default::default(), ..owned.clone() };
        assert_eq!(derived_name(&owned), derived_name(&bare));
    }

    #[test]
    fn distinct_identities_get_distinct_names() {
        // both sanitize to "a-b-c", only the hash tells them apart
        let first = ProxyIdentity::for_gateway("a", "b.c");
        let second = ProxyIdentity::for_gateway("a-b", "c");
        assert_ne!(derived_name(&first), derived_name(&second));
        assert_ne!(derived_name(&ProxyIdentity::for_gateway("ns1", "eg")), derived_name(&ProxyIdentity::for_gateway("ns2", "eg")));
    }

    #[test]
    fn long_names_fit_dns_label() {
        let identity = ProxyIdentity::for_gateway(&"n".repeat(63), &"Gateway_Name".repeat(20));
        let name = derived_name(&identity);

        assert!(name.len() <= 63, "{name} is {} chars", name.len());
        assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        assert!(!name.contains("--"));
    }

    #[test]
    fn truncation_drops_dangling_separator() {
        let name = hashed_name("abcd/efgh", 5);
        assert!(name.starts_with("abcd-"));
        assert_eq!(name.len(), "abcd-".len() + HASH_SUFFIX_LEN);
    }

    #[test]
    fn name_without_alphanumerics_is_the_bare_hash() {
        let hashed = hashed_name("/", MAX_NAME_PART_LEN);
        assert_eq!(hashed.len(), HASH_SUFFIX_LEN);
        assert!(hashed.chars().all(|c| c.is_ascii_hexdigit()));

        let name = derived_name(&ProxyIdentity::for_gateway("", ""));
        assert_eq!(name, format!("{RESOURCE_PREFIX}-{hashed}"));
        assert!(!name.contains("--"));
    }
}
