use crate::model::Env;

/// Render `env` as one `KEY="value"` line per entry, in iteration order.
///
/// Backslashes and double quotes are escaped, so parsing the output in
/// [`crate::ParseMode::Strict`] yields the same pairs in the same order.
pub fn to_string(env: &Env) -> String {
    let mut out = String::new();
    for entry in env {
        out.push_str(&entry.key);
        out.push_str("=\"");
        for ch in entry.value.chars() {
            if ch == '"' || ch == '\\' {
                out.push('\\');
            }
            out.push(ch);
        }
        out.push_str("\"\n");
    }
    out
}
