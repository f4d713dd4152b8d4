/// Longest slug accepted for a CMS lookup.
pub const MAX_SLUG_LENGTH: usize = 100;

/// Path segments that are routes or placeholders, never post slugs.
const RESERVED_SLUGS: &[&str] = &["assets", "api", "admin", "undefined", "null"];

/// Whether `slug` is safe to send to the CMS as a post/tag slug.
///
/// Rejects empty and placeholder values, anything URL- or query-like,
/// UUIDs, leading underscores and characters outside `[A-Za-z0-9_-]`.
pub fn is_slug(slug: &str) -> bool {
    if slug.trim().is_empty() || slug.len() > MAX_SLUG_LENGTH {
        return false;
    }
    if slug.starts_with('_') || slug.starts_with("http") {
        return false;
    }
    if RESERVED_SLUGS.contains(&slug.to_ascii_lowercase().as_str()) {
        return false;
    }
    if is_uuid(slug) {
        return false;
    }
    slug.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// 8-4-4-4-12 hex layout.
fn is_uuid(s: &str) -> bool {
    let groups: Vec<&str> = s.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(g, len)| g.len() == len && g.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Four-digit year.
pub fn is_year(year: i32) -> bool {
    (1000..=9999).contains(&year)
}

pub fn is_month(month: u32) -> bool {
    (1..=12).contains(&month)
}
