use serde_json::Value;

/// Escape one reference token of a JSON pointer (`~` -> `~0`, `/` -> `~1`).
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Extend `parent` with one object property name or array index.
pub fn child(parent: &str, token: &str) -> String {
    let mut out = String::with_capacity(parent.len() + token.len() + 1);
    out.push_str(parent);
    out.push('/');
    out.push_str(&escape_token(token));
    out
}

/// Copy of `document` with the node at `pointer` replaced by `replacement`.
///
/// The empty pointer addresses the whole document. Returns `None` when the
/// pointer does not resolve.
pub fn replace_at(document: &Value, pointer: &str, replacement: Value) -> Option<Value> {
    if pointer.is_empty() {
        return Some(replacement);
    }

    let mut out = document.clone();
    let slot = out.pointer_mut(pointer)?;
    *slot = replacement;
    Some(out)
}
