use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use prettydiff::{diff_lines, text::ContextConfig};
use regex::{Captures, Regex};
use serde::Deserialize;

use crate::version::bump_patch_version;

const RUNTIME_API_DEPENDENCY: &str = "runtime-api";

/// Read-side view of Chart.yaml. Writes go through text substitution so the
/// file keeps its comments, quoting and key order.
#[derive(Debug, Deserialize)]
pub(crate) struct Chart {
    #[serde(rename = "appVersion")]
    pub app_version: String,
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<ChartDependency>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartDependency {
    pub name: String,
    pub version: String,
}

/// Overwrite appVersion, bump the chart patch version, and move the
/// runtime-api dependency to `new_runtime_api_version` when one was
/// resolved and differs from the current pin.
pub(crate) fn update_chart(
    chart_path: &Path,
    new_app_version: &str,
    new_runtime_api_version: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let original = fs::read_to_string(chart_path)
        .with_context(|| format!("reading {}", chart_path.display()))?;
    let chart: Chart = serde_yaml::from_str(&original)
        .with_context(|| format!("parsing {}", chart_path.display()))?;

    let mut content = replace_scalar(&original, r"(?m)^(appVersion:\s*)(\S+)", new_app_version);
    println!(
        "Updated appVersion: {} -> {}",
        chart.app_version, new_app_version
    );

    let new_version = bump_patch_version(&chart.version)
        .with_context(|| format!("chart version in {}", chart_path.display()))?;
    content = replace_scalar(&content, r"(?m)^(version:\s*)(\S+)", &new_version);
    println!("Updated version: {} -> {}", chart.version, new_version);

    if let Some(new_runtime_api_version) = new_runtime_api_version {
        let dependency = chart
            .dependencies
            .iter()
            .find(|dep| dep.name == RUNTIME_API_DEPENDENCY);

        if let Some(dependency) = dependency {
            if dependency.version == new_runtime_api_version {
                println!(
                    "{RUNTIME_API_DEPENDENCY} version unchanged: {} (already latest)",
                    dependency.version
                );
            } else {
                content = replace_scalar(
                    &content,
                    r"(?m)(-\s+name:\s*runtime-api\s*\n(?:.*\n)*?\s*version:\s*)(\S+)",
                    new_runtime_api_version,
                );
                println!(
                    "Updated {RUNTIME_API_DEPENDENCY} version: {} -> {}",
                    dependency.version, new_runtime_api_version
                );
            }
        }
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
        fs::write(chart_path, &content)
            .with_context(|| format!("writing {}", chart_path.display()))?;
    }

    Ok(())
}

/// Swap group 2 of the first `pattern` match for `new_value`, keeping the
/// group 1 prefix verbatim.
fn replace_scalar(content: &str, pattern: &str, new_value: &str) -> String {
    let re = Regex::new(pattern).unwrap();
    re.replace(content, |caps: &Captures| format!("{}{}", &caps[1], new_value))
        .into_owned()
}
