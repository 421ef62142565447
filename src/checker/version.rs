//! Deciding whether a declared or locked version specifier is vulnerable.
//!
//! Specifiers come straight out of manifests and lockfiles, so they may be
//! exact versions (`4.1.1`), npm ranges (`^4.1.0`, `>=4.1.1 <4.2.0`) or
//! arbitrary strings (`latest`, git URLs). Anything that cannot be parsed is
//! treated as not vulnerable rather than as an error.

use semver::{Version, VersionReq};

/// Operators that mark a specifier as a range, longest first where they overlap.
const RANGE_OPERATORS: [&str; 7] = ["^", "~", ">=", "<=", ">", "<", "="];

/// Returns true if `installed` denotes a version listed in `vulnerable_versions`.
///
/// Checks run in order and the first conclusive one wins:
///
/// 1. verbatim string equality with any entry;
/// 2. if `installed` is a range, whether any exact vulnerable version falls
///    inside it;
/// 3. otherwise `installed` (minus one leading operator) as an exact version,
///    tested against each entry as a range or as an exact version. A prerelease
///    of a vulnerable release counts as vulnerable.
///
/// # Example
///
/// ```
/// use actscan::checker::is_vulnerable;
///
/// let vulnerable = vec!["4.1.1".to_string()];
/// assert!(is_vulnerable("^4.1.0", &vulnerable));
/// assert!(is_vulnerable("4.1.1-rc.0", &vulnerable));
/// assert!(!is_vulnerable("~4.0.0", &vulnerable));
/// ```
pub fn is_vulnerable(installed: &str, vulnerable_versions: &[String]) -> bool {
    if vulnerable_versions.iter().any(|v| v == installed) {
        return true;
    }

    if is_range_specifier(installed) {
        if let Some(range) = Range::parse(installed) {
            return vulnerable_versions
                .iter()
                .filter_map(|v| parse_version(v))
                .any(|v| range.matches(&v));
        }
    }

    let Some(installed) = parse_version(&clean_version(installed)) else {
        return false;
    };

    vulnerable_versions
        .iter()
        .any(|entry| entry_matches(&installed, entry))
}

/// Tests an exact installed version against one vulnerable entry.
fn entry_matches(installed: &Version, entry: &str) -> bool {
    let exact = parse_version(entry);

    // bare versions stay exact so the prerelease rule below applies
    if is_range_specifier(entry) || exact.is_none() {
        if let Some(range) = Range::parse(entry) {
            return range.matches(installed);
        }
    }

    let Some(vulnerable) = exact else {
        return false;
    };

    if same_release(installed, &vulnerable) {
        return true;
    }

    // 4.1.1-rc.0 is a build of the compromised 4.1.1 line; the reverse is not.
    !installed.pre.is_empty()
        && vulnerable.pre.is_empty()
        && installed.major == vulnerable.major
        && installed.minor == vulnerable.minor
        && installed.patch == vulnerable.patch
}

/// Semver equality without build metadata.
fn same_release(a: &Version, b: &Version) -> bool {
    a.major == b.major && a.minor == b.minor && a.patch == b.patch && a.pre == b.pre
}

/// Returns true if `version` is a constraint rather than a pinned version.
///
/// A leading operator, an inner space, or a comma all mark a constraint.
pub fn is_range_specifier(version: &str) -> bool {
    let version = version.trim();
    RANGE_OPERATORS.iter().any(|op| version.starts_with(op))
        || version.contains(' ')
        || version.contains(',')
}

/// Strips surrounding whitespace and at most one leading range operator.
///
/// Prerelease and build metadata are preserved.
pub fn clean_version(version: &str) -> String {
    let version = version.trim();
    RANGE_OPERATORS
        .iter()
        .find_map(|op| version.strip_prefix(op))
        .unwrap_or(version)
        .trim()
        .to_string()
}

/// Parses an exact version the way npm tooling accepts them.
///
/// A leading `v` is ignored and missing minor/patch components default to
/// zero, so `v4.1` parses as `4.1.0`.
pub fn parse_version(text: &str) -> Option<Version> {
    let text = text.trim();
    let text = text
        .strip_prefix('v')
        .or_else(|| text.strip_prefix('V'))
        .unwrap_or(text);

    if let Ok(version) = Version::parse(text) {
        return Some(version);
    }

    let split = text.find(['-', '+']).unwrap_or(text.len());
    let (core, suffix) = text.split_at(split);
    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let mut padded = parts.join(".");
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    padded.push_str(suffix);

    Version::parse(&padded).ok()
}

/// An npm-style version range: alternatives joined by `||`.
#[derive(Debug, Clone)]
pub struct Range {
    alternatives: Vec<VersionReq>,
}

impl Range {
    /// Parses npm range syntax into `semver` requirements.
    ///
    /// Comparators may be separated by whitespace or commas, an operator may be
    /// followed by a space (`>= 1.2.3`), a bare version means `=`, and
    /// `a - b` hyphen ranges are accepted. Returns `None` if any alternative
    /// fails to parse.
    pub fn parse(text: &str) -> Option<Self> {
        let alternatives = text
            .split("||")
            .map(normalize_alternative)
            .map(|alt| alt.and_then(|alt| VersionReq::parse(&alt).ok()))
            .collect::<Option<Vec<_>>>()?;

        Some(Self { alternatives })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }
}

/// Rewrites one `||` alternative into the comma-separated form `semver` parses.
fn normalize_alternative(alternative: &str) -> Option<String> {
    let alternative = alternative.trim();

    if let Some((low, high)) = alternative.split_once(" - ") {
        let (low, high) = (low.trim(), high.trim());
        if low.is_empty() || high.is_empty() {
            return None;
        }
        return Some(format!(">={}, <={}", strip_v(low), strip_v(high)));
    }

    let mut comparators = Vec::new();
    let mut pending_op: Option<&str> = None;

    for token in alternative
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        if token.chars().all(is_operator_char) {
            // "> =" or ">= >" are not meaningful
            if pending_op.is_some() {
                return None;
            }
            pending_op = Some(token);
            continue;
        }

        let comparator = match pending_op.take() {
            Some(op) => format!("{}{}", op, strip_v(token)),
            None => normalize_comparator(token),
        };
        comparators.push(comparator);
    }

    if pending_op.is_some() || comparators.is_empty() {
        return None;
    }

    Some(comparators.join(", "))
}

/// Gives a bare version an explicit `=` and drops a `v` after the operator.
fn normalize_comparator(token: &str) -> String {
    let op_len = token
        .char_indices()
        .find(|(_, c)| !is_operator_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    let (op, rest) = token.split_at(op_len);
    let rest = strip_v(rest);

    let core = rest.split(['-', '+']).next().unwrap_or(rest);
    let is_wildcard = core.contains(['*', 'x', 'X']);
    if op.is_empty() && !is_wildcard && rest.starts_with(|c: char| c.is_ascii_digit()) {
        format!("={}", rest)
    } else {
        format!("{}{}", op, rest)
    }
}

fn strip_v(text: &str) -> &str {
    match text.strip_prefix(['v', 'V']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => text,
    }
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '^' | '~')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_version_match() {
        assert!(is_vulnerable("4.1.1", &versions(&["4.1.1"])));
    }

    #[test]
    fn test_caret_range() {
        assert!(is_vulnerable("^4.1.0", &versions(&["4.1.1"])));
        assert!(!is_vulnerable("^3.0.0", &versions(&["4.1.1"])));
    }

    #[test]
    fn test_tilde_range() {
        assert!(is_vulnerable("~4.1.0", &versions(&["4.1.1"])));
        assert!(!is_vulnerable("~4.0.0", &versions(&["4.1.1"])));
    }

    #[test]
    fn test_comparison_ranges() {
        assert!(is_vulnerable(">=4.1.0", &versions(&["4.1.1"])));
        assert!(!is_vulnerable("<4.1.0", &versions(&["4.1.1"])));
        assert!(is_vulnerable(">= 4.0.0 < 5", &versions(&["4.1.1"])));
        assert!(is_vulnerable(">=4.0.0, <5.0.0", &versions(&["4.1.1"])));
    }

    #[test]
    fn test_union_and_hyphen_ranges() {
        assert!(is_vulnerable("^3.0.0 || ^4.0.0", &versions(&["4.1.1"])));
        assert!(!is_vulnerable("^2.0.0 || ^3.0.0", &versions(&["4.1.1"])));
        assert!(is_vulnerable("4.0.0 - 4.2.0", &versions(&["4.1.1"])));
        assert!(!is_vulnerable("4.1.2 - 4.2.0", &versions(&["4.1.1"])));
    }

    #[test]
    fn test_multiple_vulnerable_versions() {
        let list = versions(&["4.1.1", "4.1.2", "4.1.3"]);
        assert!(is_vulnerable("4.1.2", &list));
        assert!(!is_vulnerable("4.2.0", &list));
    }

    #[test]
    fn test_constraint_vulnerable_entry() {
        let list = versions(&[">=4.1.1 <4.2.0"]);
        assert!(is_vulnerable("4.1.5", &list));
        assert!(!is_vulnerable("4.2.0", &list));
        assert!(!is_vulnerable("4.1.0", &list));
    }

    #[test]
    fn test_non_semantic_versions_match_verbatim() {
        assert!(is_vulnerable("latest", &versions(&["latest"])));
        assert!(!is_vulnerable("next", &versions(&["latest"])));
        assert!(!is_vulnerable("^4.1.0", &versions(&["latest"])));
    }

    #[test]
    fn test_range_shaped_entry_matches_verbatim() {
        assert!(is_vulnerable("^4.1.0", &versions(&["^4.1.0"])));
        assert!(is_vulnerable("not a version", &versions(&["not a version"])));
    }

    #[test]
    fn test_prerelease_handling() {
        assert!(!is_vulnerable("4.1.2-alpha.1", &versions(&["4.1.1"])));
        assert!(!is_vulnerable("4.1.1", &versions(&["4.1.1-beta.1"])));
        assert!(is_vulnerable("4.1.1-rc.0", &versions(&["4.1.1"])));
        assert!(is_vulnerable("4.1.1-beta.1", &versions(&["4.1.1-beta.1"])));
    }

    #[test]
    fn test_build_metadata_ignored() {
        assert!(is_vulnerable("4.1.1+build.7", &versions(&["4.1.1"])));
    }

    #[test]
    fn test_v_prefixed_versions() {
        assert!(is_vulnerable("=v4.1.1", &versions(&["4.1.1"])));
        assert!(is_vulnerable("v4.1.1", &versions(&["4.1.1"])));
    }

    #[test]
    fn test_unparseable_installed_is_safe() {
        assert!(!is_vulnerable("github:user/repo#main", &versions(&["4.1.1"])));
        assert!(!is_vulnerable("", &versions(&["4.1.1"])));
        assert!(!is_vulnerable("4.1.1", &[]));
        // looks like a range but is not one, and is no exact version either
        assert!(!is_vulnerable(">=4.1.1_x", &versions(&["4.1.1"])));
    }

    #[test]
    fn test_wildcard_vulnerable_entries() {
        assert!(is_vulnerable("4.1.5", &versions(&["4.1.x"])));
        assert!(is_vulnerable("4.1.5", &versions(&["4.x"])));
        assert!(is_vulnerable("4.1.5", &versions(&["*"])));
        assert!(!is_vulnerable("4.2.0", &versions(&["4.1.x"])));
        assert!(!is_vulnerable("4.1.5", &versions(&["latest"])));
    }

    #[test]
    fn test_clean_version_string() {
        for (input, expected) in [
            ("^4.1.0", "4.1.0"),
            ("~4.1.0", "4.1.0"),
            (">=4.1.0", "4.1.0"),
            ("<=4.1.0", "4.1.0"),
            (">4.1.0", "4.1.0"),
            ("<4.1.0", "4.1.0"),
            ("=4.1.0", "4.1.0"),
            ("4.1.0", "4.1.0"),
            (" ^4.1.0 ", "4.1.0"),
            ("4.1.0-beta.1+abc", "4.1.0-beta.1+abc"),
        ] {
            assert_eq!(clean_version(input), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn test_is_range_specifier() {
        assert!(is_range_specifier("^1.0.0"));
        assert!(is_range_specifier(">=1.0.0 <2.0.0"));
        assert!(is_range_specifier("1.0.0,2.0.0"));
        assert!(is_range_specifier("1.0.0 - 2.0.0"));
        assert!(!is_range_specifier("1.0.0"));
        assert!(!is_range_specifier(" 1.0.0 "));
        assert!(!is_range_specifier("latest"));
    }

    #[test]
    fn test_parse_version_lenient() {
        assert_eq!(parse_version("4.1"), Some(Version::new(4, 1, 0)));
        assert_eq!(parse_version("v4"), Some(Version::new(4, 0, 0)));
        assert_eq!(
            parse_version("18.0.0-beta.0").map(|v| v.pre.to_string()),
            Some("beta.0".to_string())
        );
        assert_eq!(parse_version("4.x"), None);
        assert_eq!(parse_version("latest"), None);
        assert_eq!(parse_version("1.2.3.4"), None);
    }

    #[test]
    fn test_bare_prerelease_in_range_is_pinned() {
        let range = Range::parse("1.0.0-next.1 || 2.x").unwrap();
        assert!(range.matches(&Version::parse("1.0.0-next.1").unwrap()));
        assert!(!range.matches(&Version::parse("1.0.1").unwrap()));
        assert!(range.matches(&Version::parse("2.3.0").unwrap()));
    }

    #[test]
    fn test_range_parse_rejects_garbage() {
        assert!(Range::parse("^latest").is_none());
        assert!(Range::parse(">=").is_none());
        assert!(Range::parse("^1.0.0 ||").is_none());
    }
}
