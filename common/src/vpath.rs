//! Forward-slash path helpers for game content paths.
//!
//! Content paths are always relative and POSIX-style, regardless of the host.

/// Convert backslashes to forward slashes and drop any leading slash.
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_owned()
}

/// Join path components, ignoring empty components and doubled separators.
pub fn join(parts: &[&str]) -> String {
    let mut out = String::new();
    for part in parts {
        for segment in part.split('/').filter(|s| !s.is_empty()) {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(segment);
        }
    }
    out
}

/// Everything before the final `/`, if there is one.
pub fn parent(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(dir, _)| dir)
}

/// Final path component.
pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// Replace the extension of the final component, or append one if it has none.
///
/// `ext` includes the leading dot. A leading dot on the file name itself is not
/// treated as an extension.
pub fn with_extension(path: &str, ext: &str) -> String {
    let name = file_name(path);
    let stem_len = match name.rfind('.') {
        Some(0) | None => name.len(),
        Some(i) => i,
    };
    let dir_len = path.len() - name.len();
    format!("{}{}", &path[..dir_len + stem_len], ext)
}
