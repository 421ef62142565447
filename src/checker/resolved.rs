//! Recovering the installed version from a lockfile's resolved tarball URL.
//!
//! Registry tarballs live at `<registry>/<name>/-/<local-name>-<version>.tgz`,
//! so the filename after the last `/-/` carries the concrete version even
//! when the lockfile's `version` field holds a range.

/// Separator between the package path and the tarball filename in registry URLs.
const TARBALL_SEPARATOR: &str = "/-/";

const ARCHIVE_EXTENSIONS: [&str; 2] = [".tgz", ".tar.gz"];

/// Extracts the version from a registry tarball URL.
///
/// Returns an empty string when the URL does not follow the registry layout.
///
/// # Example
///
/// ```
/// use actscan::checker::version_from_resolved;
///
/// assert_eq!(
///     version_from_resolved("https://registry.npmjs.org/@ctrl/tinycolor/-/tinycolor-4.1.1.tgz"),
///     "4.1.1"
/// );
/// assert_eq!(version_from_resolved("https://example.com/invalid"), "");
/// ```
pub fn version_from_resolved(resolved: &str) -> String {
    let Some((_, tail)) = resolved.rsplit_once(TARBALL_SEPARATOR) else {
        return String::new();
    };

    // yarn appends "#<sha1>" and some mirrors add query strings
    let tail = tail.split(['#', '?']).next().unwrap_or_default();
    let filename = tail.rsplit('/').next().unwrap_or_default();
    let filename = ARCHIVE_EXTENSIONS
        .iter()
        .find_map(|ext| filename.strip_suffix(ext))
        .unwrap_or(filename);

    let tokens: Vec<&str> = filename.split('-').collect();
    if tokens.len() < 2 {
        return String::new();
    }

    // Names never start with a digit, so the first digit-led token opens the version.
    match tokens
        .iter()
        .skip(1)
        .position(|t| t.starts_with(|c: char| c.is_ascii_digit()))
    {
        Some(offset) => tokens[offset + 1..].join("-"),
        None => String::new(),
    }
}

/// Returns the version derived from `resolved` if there is one, else `declared`.
pub fn actual_version(declared: &str, resolved: &str) -> String {
    let from_resolved = version_from_resolved(resolved);
    if from_resolved.is_empty() {
        declared.to_string()
    } else {
        from_resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_from_resolved() {
        for (resolved, expected) in [
            (
                "https://registry.npmjs.org/@ctrl/tinycolor/-/tinycolor-4.1.1.tgz",
                "4.1.1",
            ),
            (
                "https://registry.example.org/@ctrl/tinycolor/-/tinycolor-4.1.1.tgz",
                "4.1.1",
            ),
            ("https://registry.npmjs.org/@angular/core/-/core-15.2.3.tgz", "15.2.3"),
            ("https://registry.npmjs.org/lodash/-/lodash-4.17.21.tgz", "4.17.21"),
            (
                "https://registry.npmjs.org/react/-/react-18.0.0-beta.0.tgz",
                "18.0.0-beta.0",
            ),
            (
                "https://registry.npmjs.org/is-arrayish/-/is-arrayish-0.3.3.tgz",
                "0.3.3",
            ),
            (
                "https://registry.yarnpkg.com/debug/-/debug-4.4.2.tgz#abcdef",
                "4.4.2",
            ),
            ("", ""),
            ("https://example.com/invalid", ""),
            ("https://registry.npmjs.org/lodash/-/lodash.tgz", ""),
            ("https://registry.npmjs.org/left-pad/-/left-pad-latest.tgz", ""),
        ] {
            assert_eq!(version_from_resolved(resolved), expected, "resolved: {}", resolved);
        }
    }

    #[test]
    fn test_actual_version_prefers_resolved() {
        assert_eq!(
            actual_version(
                "^4.1.0",
                "https://registry.npmjs.org/@ctrl/tinycolor/-/tinycolor-4.1.1.tgz"
            ),
            "4.1.1"
        );
    }

    #[test]
    fn test_actual_version_falls_back_to_declared() {
        assert_eq!(actual_version("4.1.0", "https://example.com/invalid"), "4.1.0");
        assert_eq!(actual_version("~4.1.0", ""), "~4.1.0");
    }
}
