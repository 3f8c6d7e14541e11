//! URL-safe slug derivation from human titles.

/// Lowercase, map non-alphanumeric runs to a single hyphen, trim
/// leading/trailing hyphens. Symbol-only titles would otherwise slug
/// to an empty string and collide immediately, so those fall back to
/// `"feature"`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        slug.push_str("feature");
    }

    slug
}
