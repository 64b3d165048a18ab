//! Textual path handling for namespace arguments.

pub const ROOT: &str = "/";

/// Resolves `argument` against the absolute directory `current` and
/// normalizes the result.
pub fn resolve(current: &str, argument: &str) -> String {
    if argument.starts_with('/') {
        normalize(argument)
    } else {
        normalize(&format!("{current}/{argument}"))
    }
}

/// Collapses repeated and trailing separators, skips `.` segments and lets
/// `..` drop the previous segment. `..` at the root stays at the root.
pub fn normalize(path: &str) -> String {
    let mut resolved: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                resolved.pop();
            }
            _ => resolved.push(segment),
        }
    }

    if resolved.is_empty() {
        ROOT.to_string()
    } else {
        format!("/{}", resolved.join("/"))
    }
}

/// Splits a normalized path into its parent directory and final segment.
/// The root has no final segment.
pub fn split_last(path: &str) -> Option<(&str, &str)> {
    let (parent, name) = path.rsplit_once('/')?;
    if name.is_empty() {
        return None;
    }
    Some((if parent.is_empty() { ROOT } else { parent }, name))
}
