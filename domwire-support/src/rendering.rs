//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format resolution chains and "did you mean?"
//! suggestions in error output.

/// Renders a resolution chain as a readable string.
///
/// # Examples
/// ```
/// use domwire_support::rendering::render_chain;
///
/// let chain = vec!["widget", "logger", "transport"];
/// let rendered = render_chain(&chain);
/// assert_eq!(rendered, "widget → logger → transport");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Renders a list of names as a bulleted block, one per line.
///
/// ```
/// use domwire_support::rendering::render_list;
///
/// assert_eq!(render_list(&["logger", "store"], "    "), "    - logger\n    - store");
/// ```
pub fn render_list(items: &[impl AsRef<str>], indent: &str) -> String {
    items
        .iter()
        .map(|item| format!("{indent}- {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generates "did you mean?" suggestions for a requested name.
///
/// Compares the requested name against available names and returns
/// the closest matches, best first.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    if requested_lower.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();
            if name_lower == requested_lower {
                return None;
            }

            // Substring match (highest priority)
            if name_lower.contains(&requested_lower)
                || requested_lower.contains(&name_lower)
            {
                return Some((name, 100));
            }

            // Same length give or take a typo
            if close_enough(&requested_lower, &name_lower) {
                return Some((name, 90));
            }

            // Common prefix
            let common = name_lower
                .chars()
                .zip(requested_lower.chars())
                .take_while(|(a, b)| a == b)
                .count();

            if common >= 3 {
                return Some((name, common * 10));
            }

            None
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Quick heuristic: lengths differ by at most 2 and at least 60% of the
/// positions hold the same character.
fn close_enough(a: &str, b: &str) -> bool {
    let (a_len, b_len) = (a.chars().count(), b.chars().count());
    if a_len.abs_diff(b_len) > 2 {
        return false;
    }

    let common = a.chars().zip(b.chars()).filter(|(ca, cb)| ca == cb).count();
    let max_len = a_len.max(b_len);

    max_len > 0 && common * 100 / max_len >= 60
}
