//! Deterministic cache key scheme (C8, spec §4.5).

/// The cache key for a tournament. Slugs are opaque and are never
/// normalized.
#[must_use]
pub fn tournament_key(slug: &str) -> String {
    format!("tournament:{slug}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_namespaced_and_preserves_slug() {
        assert_eq!(tournament_key("evo-2024"), "tournament:evo-2024");
        assert_eq!(tournament_key("MixedCase_Slug"), "tournament:MixedCase_Slug");
    }
}
