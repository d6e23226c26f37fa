use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;
use prettydiff::{diff_lines, text::ContextConfig};
use regex::{Captures, Regex};

use crate::version::format_sha_tag;

/// One independently patched region of values.yaml.
struct TagTarget<'a> {
    label: &'a str,
    /// Groups: 1 = prefix kept verbatim, 2 = current value, 3 (optional) =
    /// suffix kept verbatim.
    pattern: &'a str,
    new_value: String,
}

/// Update the four image-tag regions in place. Each region is its own
/// match/patch unit; a miss in one never blocks the others, and text
/// outside the matched regions is never touched.
pub(crate) fn update_values(
    values_path: &Path,
    openhands_sha: &str,
    runtime_api_sha: &str,
    runtime_image_tag: &str,
    dry_run: bool,
) -> Result<()> {
    let original = fs::read_to_string(values_path)
        .with_context(|| format!("reading {}", values_path.display()))?;

    let targets = [
        TagTarget {
            label: "enterprise-server image",
            pattern: r"(image:\s*\n\s*repository:\s*ghcr\.io/openhands/enterprise-server\s*\n\s*tag:\s*)(\S+)",
            new_value: format_sha_tag(openhands_sha),
        },
        TagTarget {
            label: "runtime-api image",
            pattern: r"(runtime-api:\s*\n(?:.*\n)*?\s*image:\s*\n\s*tag:\s*)(\S+)",
            new_value: format_sha_tag(runtime_api_sha),
        },
        TagTarget {
            label: "runtime image",
            pattern: r"(runtime:\s*\n\s*image:\s*\n\s*repository:\s*ghcr\.io/openhands/runtime\s*\n\s*tag:\s*)(\S+)",
            new_value: runtime_image_tag.to_owned(),
        },
        TagTarget {
            label: "warmRuntimes image",
            pattern: r#"(image:\s*"ghcr\.io/openhands/runtime:)([^"]+)(")"#,
            new_value: runtime_image_tag.to_owned(),
        },
    ];

    let mut content = original.clone();
    for target in &targets {
        content = patch_tag(content, target);
    }

    if content != original {
        println!(
            "{}",
            diff_lines(&original, &content).format_with_context(
                Some(ContextConfig {
                    context_size: 2,
                    skipping_marker: "---"
                }),
                true
            )
        );
    }

    if !dry_run {
        fs::write(values_path, &content)
            .with_context(|| format!("writing {}", values_path.display()))?;
    }

    Ok(())
}

fn patch_tag(content: String, target: &TagTarget<'_>) -> String {
    let re = Regex::new(target.pattern).unwrap();

    let old_value = match re.captures(&content) {
        Some(caps) => caps[2].to_owned(),
        None => {
            warn!("Could not find {} tag in values.yaml", target.label);
            return content;
        }
    };

    if old_value == target.new_value {
        println!(
            "{} tag unchanged: {old_value} (already latest)",
            target.label
        );
        return content;
    }

    let updated = re
        .replace_all(&content, |caps: &Captures| {
            let suffix = caps.get(3).map_or("", |m| m.as_str());
            format!("{}{}{}", &caps[1], target.new_value, suffix)
        })
        .into_owned();
    println!(
        "Updated {} tag: {old_value} -> {}",
        target.label, target.new_value
    );
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const SAMPLE_VALUES: &str = r#"replicaCount: 2
image:
  repository: ghcr.io/openhands/enterprise-server
  tag: sha-0000000
  pullPolicy: IfNotPresent

service:
  type: ClusterIP
  port: 3000

runtime-api:
  enabled: true
  replicas: 1
  image:
    tag: sha-1111111

runtime:
  image:
    repository: ghcr.io/openhands/runtime
    tag: oh-runtime-old

warmRuntimes:
  - name: default
    image: "ghcr.io/openhands/runtime:oh-runtime-old"
  - name: gpu
    image: "ghcr.io/openhands/runtime:oh-runtime-old"
"#;

    fn write_values(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("values.yaml");
        fs::write(&path, content).unwrap();
        path
    }

    fn patch(path: &Path, dry_run: bool) {
        update_values(
            path,
            "abcdef1234567890",
            "fedcba0987654321",
            "oh-runtime-v2",
            dry_run,
        )
        .unwrap();
    }

    #[test]
    fn updates_all_four_regions() {
        let dir = TempDir::new().unwrap();
        let path = write_values(&dir, SAMPLE_VALUES);

        patch(&path, false);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("tag: sha-abcdef1"));
        assert!(content.contains("tag: sha-fedcba0"));
        assert!(content.contains("tag: oh-runtime-v2"));
        assert_eq!(
            content
                .matches("\"ghcr.io/openhands/runtime:oh-runtime-v2\"")
                .count(),
            2
        );
        assert!(!content.contains("oh-runtime-old"));
    }

    #[test]
    fn text_outside_the_regions_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = write_values(&dir, SAMPLE_VALUES);

        patch(&path, false);

        let content = fs::read_to_string(&path).unwrap();
        let changed: Vec<_> = SAMPLE_VALUES
            .lines()
            .zip(content.lines())
            .filter(|(before, after)| before != after)
            .collect();
        // enterprise tag, runtime-api tag, runtime tag, two warm entries
        assert_eq!(changed.len(), 5, "changed lines: {changed:?}");
        assert!(content.contains("pullPolicy: IfNotPresent"));
        assert!(content.contains("type: ClusterIP"));
        assert!(content.contains("replicas: 1"));
    }

    #[test]
    fn missing_region_does_not_block_the_others() {
        let dir = TempDir::new().unwrap();
        let without_runtime_api = SAMPLE_VALUES.replace("runtime-api:", "something-else:");
        let path = write_values(&dir, &without_runtime_api);

        patch(&path, false);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("tag: sha-abcdef1"));
        assert!(content.contains("tag: oh-runtime-v2"));
        // the orphaned block keeps its old tag
        assert!(content.contains("tag: sha-1111111"));
    }

    #[test]
    fn unchanged_values_are_left_alone() {
        let dir = TempDir::new().unwrap();
        let path = write_values(&dir, SAMPLE_VALUES);

        patch(&path, false);
        let after_first = fs::read_to_string(&path).unwrap();

        patch(&path, false);
        assert_eq!(fs::read_to_string(&path).unwrap(), after_first);
    }

    #[test]
    fn dry_run_leaves_file_bytes_alone() {
        let dir = TempDir::new().unwrap();
        let path = write_values(&dir, SAMPLE_VALUES);

        patch(&path, true);

        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE_VALUES);
    }
}
