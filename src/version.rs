use anyhow::{ensure, Context, Result};
use itertools::Itertools;
use regex::Regex;

pub(crate) const SHORT_SHA_LENGTH: usize = 7;

/// Strict MAJOR.MINOR.PATCH, no prefix or suffix.
pub(crate) fn semver_pattern() -> Regex {
    Regex::new(r"^\d+\.\d+\.\d+$").unwrap()
}

pub(crate) fn short_sha(sha: &str) -> &str {
    sha.get(..SHORT_SHA_LENGTH).unwrap_or(sha)
}

pub(crate) fn format_sha_tag(sha: &str) -> String {
    format!("sha-{}", short_sha(sha))
}

/// Bump the patch component of a MAJOR.MINOR.PATCH string. Anything else is
/// a data-contract violation and comes back as an error.
pub(crate) fn bump_patch_version(version: &str) -> Result<String> {
    let parts: Vec<&str> = version.split('.').collect();
    ensure!(
        parts.len() == 3,
        "expected MAJOR.MINOR.PATCH, got {version:?}"
    );

    for part in &parts {
        ensure!(
            !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()),
            "non-numeric component in version {version:?}"
        );
    }

    let patch: u64 = parts[2]
        .parse()
        .context(format!("patch component of {version:?}"))?;
    Ok(format!("{}.{}.{}", parts[0], parts[1], patch + 1))
}

/// Highest semver tag in `tags` by numeric triple, None when nothing
/// matches. Registry tag listings are unordered, so sort rather than take
/// the first hit.
pub(crate) fn latest_semver(tags: &[String]) -> Option<String> {
    let re = semver_pattern();
    tags.iter()
        .filter(|tag| re.is_match(tag))
        .filter_map(|tag| version_key(tag).map(|key| (key, tag)))
        .sorted_by(|a, b| b.0.cmp(&a.0))
        .next()
        .map(|(_, tag)| tag.clone())
}

fn version_key(version: &str) -> Option<(u64, u64, u64)> {
    let mut parts = version.split('.').map(|part| part.parse::<u64>().ok());
    Some((parts.next()??, parts.next()??, parts.next()??))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_patch_increments_last_component() {
        assert_eq!(bump_patch_version("1.2.3").unwrap(), "1.2.4");
        assert_eq!(bump_patch_version("1.0.0").unwrap(), "1.0.1");
        assert_eq!(bump_patch_version("1.2.99").unwrap(), "1.2.100");
    }

    #[test]
    fn bump_patch_preserves_major_and_minor() {
        assert_eq!(bump_patch_version("5.10.15").unwrap(), "5.10.16");
    }

    #[test]
    fn bump_patch_rejects_malformed_versions() {
        assert!(bump_patch_version("1.2").is_err());
        assert!(bump_patch_version("1.2.3.4").is_err());
        assert!(bump_patch_version("1.2.x").is_err());
        assert!(bump_patch_version("1..3").is_err());
        assert!(bump_patch_version("").is_err());
    }

    #[test]
    fn short_sha_truncates_to_seven_chars() {
        assert_eq!(short_sha("1234567890abcdef"), "1234567");
    }

    #[test]
    fn short_sha_keeps_short_input_unchanged() {
        assert_eq!(short_sha("abc"), "abc");
        assert_eq!(short_sha(""), "");
    }

    #[test]
    fn sha_tag_is_prefixed_short_sha() {
        assert_eq!(format_sha_tag("1234567890abcdef"), "sha-1234567");
        assert_eq!(format_sha_tag("abc"), "sha-abc");
    }

    #[test]
    fn semver_pattern_accepts_plain_triples() {
        let re = semver_pattern();
        for tag in ["1.2.3", "0.0.0", "10.20.30", "123.456.789"] {
            assert!(re.is_match(tag), "{tag} should match");
        }
    }

    #[test]
    fn semver_pattern_rejects_everything_else() {
        let re = semver_pattern();
        for tag in ["v1.2.3", "1.2", "1.2.3.4", "1.2.3-beta", "1.2.3+build", "latest", ""] {
            assert!(!re.is_match(tag), "{tag} should not match");
        }
    }

    #[test]
    fn latest_semver_orders_numerically_not_lexically() {
        let tags = ["0.9.9", "0.10.0", "0.2.30"].map(String::from);
        assert_eq!(latest_semver(&tags), Some("0.10.0".to_owned()));
    }

    #[test]
    fn latest_semver_ignores_non_semver_tags() {
        let tags = ["latest", "sha-abc1234", "0.1.2", "v9.9.9"].map(String::from);
        assert_eq!(latest_semver(&tags), Some("0.1.2".to_owned()));
    }

    #[test]
    fn latest_semver_is_none_when_nothing_matches() {
        assert_eq!(latest_semver(&[]), None);
        assert_eq!(latest_semver(&["latest".to_owned()]), None);
    }
}
