use dropfade_state::StateKey;

/// Render a [`StateKey`] into a Redis key string with the given prefix.
///
/// The format is `prefix:kind:id`, so a drop lives at `prefix:drop:CODE`.
pub fn render_key(prefix: &str, key: &StateKey) -> String {
    format!("{}:{}", prefix, key.canonical())
}

/// Strip the prefix from a raw Redis key, yielding the canonical `kind:id`.
pub fn strip_prefix<'a>(prefix: &str, raw: &'a str) -> &'a str {
    raw.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(raw)
}
