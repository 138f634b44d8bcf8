//! TOML parser with helpful error messages

use super::schema::DeployerConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse kpt-deploy.toml with detailed error messages
pub fn parse_config(path: &Path) -> Result<DeployerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse kpt-deploy.toml content from string
pub fn parse_config_str(content: &str) -> Result<DeployerConfig> {
    let config: DeployerConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    config.validate()?;

    Ok(config)
}

/// Serialize a configuration to TOML string
pub fn to_toml(config: &DeployerConfig) -> Result<String> {
    toml::to_string_pretty(config).with_context(|| "Failed to serialize configuration to TOML")
}

fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().to_string();
    match error.span() {
        Some(span) => {
            let line_num = content[..span.start.min(content.len())].matches('\n').count() + 1;
            anyhow::anyhow!(
                "TOML parsing error at line {}:\n{}\n\nError: {}",
                line_num,
                get_line_context(content, line_num),
                message
            )
        }
        None => anyhow::anyhow!("TOML parsing error: {}", message),
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 2).min(lines.len());

    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
kpt_binary = "/usr/local/bin/kpt"

[deploy]
dir = "k8s/app"
flags = ["--context=dev"]
apply_flags = ["--reconcile-timeout=2m"]
force = true
name = "app"
inventory_id = "inv-1"
inventory_namespace = "ops"
"#;

        let config = parse_config_str(toml).unwrap();
        assert_eq!(config.kpt_binary, PathBuf::from("/usr/local/bin/kpt"));
        assert_eq!(config.deploy.dir, PathBuf::from("k8s/app"));
        assert_eq!(config.deploy.flags, vec!["--context=dev".to_string()]);
        assert!(config.deploy.force);
        assert_eq!(config.deploy.inventory_namespace, "ops");
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = parse_config_str("").unwrap();
        assert_eq!(config, DeployerConfig::default());
    }

    #[test]
    fn test_parse_invalid_toml_points_at_line() {
        let toml = "[deploy\nname = \"app\"\n";
        let err = parse_config_str(toml).unwrap_err().to_string();
        assert!(err.contains("TOML parsing error"));
    }

    #[test]
    fn test_parse_rejects_empty_dir() {
        let err = parse_config_str("[deploy]\ndir = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("deploy.dir"));
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let mut original = DeployerConfig::default();
        original.deploy.name = "app".to_string();
        original.deploy.apply_flags = vec!["--dry-run".to_string()];

        let parsed = parse_config_str(&to_toml(&original).unwrap()).unwrap();

        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parse_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[deploy]\nname = \"from-file\"").unwrap();

        let config = parse_config(temp_file.path()).unwrap();
        assert_eq!(config.deploy.name, "from-file");
    }

    #[test]
    fn test_parse_nonexistent_file() {
        let result = parse_config(Path::new("/nonexistent/path/kpt-deploy.toml"));
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
