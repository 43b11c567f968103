//! Remote path handling.
//!
//! Remote paths are slash-delimited. Callers may hand in paths built on
//! Windows (`img\a\b.png`), so every entry point normalises separators
//! before the path reaches the server.

/// Replace backslashes with forward slashes.
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Normalise and force a leading `/`.
pub fn absolute(path: &str) -> String {
    let path = normalize(path);
    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}

/// Non-empty segments of a path, after normalisation.
pub fn segments(path: &str) -> Vec<String> {
    normalize(path)
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a normalised path into its directory and file name.
///
/// `img/a/b.png` becomes `("img/a", "b.png")`; a bare name has an empty
/// directory.
pub fn split(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

/// Join a directory and a file name with a single separator.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Parent directory of a normalised path, or `""`.
pub fn parent(path: &str) -> &str {
    split(path).0
}

/// Map a directory under `image_base` onto the same sub-path under `thumbnail_base`.
///
/// `img/sub` with bases `img` / `thumbnails` becomes `thumbnails/sub`. A
/// leading `/` is kept. Directories outside `image_base` are nested whole
/// under `thumbnail_base`.
pub fn mirror_dir(dir: &str, image_base: &str, thumbnail_base: &str) -> String {
    let dir = normalize(dir);
    let rooted = dir.starts_with('/');

    let dir_segments = segments(&dir);
    let base_segments = segments(image_base);
    let rest = if dir_segments.starts_with(&base_segments) {
        &dir_segments[base_segments.len()..]
    } else {
        &dir_segments[..]
    };

    let mut mirrored = segments(thumbnail_base);
    mirrored.extend(rest.iter().cloned());

    let joined = mirrored.join("/");
    if rooted {
        format!("/{joined}")
    } else {
        joined
    }
}
