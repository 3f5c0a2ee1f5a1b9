//! Search criteria matching for `find`
//!
//! A criterion list lines up with the schema fields. `None` is a wildcard; a
//! present criterion matches any value that starts with it, ignoring case.
//! All present criteria must match.

/// Case-insensitive prefix test.
pub fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    let mut value_chars = value.chars().flat_map(char::to_lowercase);
    prefix
        .chars()
        .flat_map(char::to_lowercase)
        .all(|p| value_chars.next() == Some(p))
}

/// Returns whether a row satisfies every present criterion.
///
/// A present criterion past the last field can never match.
pub fn matches(values: &[String], criteria: &[Option<&str>]) -> bool {
    criteria.iter().enumerate().all(|(i, criterion)| match criterion {
        None => true,
        Some(prefix) => values
            .get(i)
            .map_or(false, |value| starts_with_ignore_case(value, prefix)),
    })
}
