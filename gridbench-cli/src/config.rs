//! Configuration loading from gridbench.toml
//!
//! Gridbench configuration can be specified in a `gridbench.toml` file in the
//! project root. The configuration is automatically discovered by walking up
//! from the current directory.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Gridbench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GridConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Suite discovery configuration
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Runner configuration for benchmark execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Time budget per benchmark case (e.g., "250ms", "1s")
    #[serde(default = "default_budget")]
    pub budget: String,
    /// CPU the process is pinned to before measuring
    #[serde(default)]
    pub pin_cpu: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            budget: default_budget(),
            pin_cpu: 0,
        }
    }
}

fn default_budget() -> String {
    "1s".to_string()
}

/// Suite discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Glob patterns matched against registered suite paths
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
        }
    }
}

fn default_patterns() -> Vec<String> {
    vec!["**".to_string()]
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Write a JSON run report to this path after each run
    #[serde(default)]
    pub report: Option<String>,
}

impl GridConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("gridbench.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# Gridbench Configuration

[runner]
# Time budget per benchmark case
budget = "1s"
# CPU the process is pinned to before measuring
pin_cpu = 0

[discovery]
# Glob patterns matched against registered suite paths
patterns = ["**"]

[output]
# Write a JSON run report after each run (uncomment to enable)
# report = "target/gridbench/report.json"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m") to nanoseconds.
    /// Bare numbers are milliseconds, matching the registration API.
    pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "ms"));

        let value: f64 = num_part
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" | "" => 1_000_000,
            "s" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok((value * multiplier as f64) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GridConfig::default();
        assert_eq!(config.runner.budget, "1s");
        assert_eq!(config.runner.pin_cpu, 0);
        assert_eq!(config.discovery.patterns, vec!["**".to_string()]);
        assert!(config.output.report.is_none());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(GridConfig::parse_duration("3s").unwrap(), 3_000_000_000);
        assert_eq!(GridConfig::parse_duration("500ms").unwrap(), 500_000_000);
        assert_eq!(GridConfig::parse_duration("100us").unwrap(), 100_000);
        assert_eq!(GridConfig::parse_duration("1000ns").unwrap(), 1000);
        assert_eq!(GridConfig::parse_duration("2m").unwrap(), 120_000_000_000);
        assert_eq!(GridConfig::parse_duration("1.5s").unwrap(), 1_500_000_000);
    }

    #[test]
    fn test_parse_duration_bare_number_is_millis() {
        assert_eq!(GridConfig::parse_duration("250").unwrap(), 250_000_000);
        assert_eq!(GridConfig::parse_duration("1").unwrap(), 1_000_000);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(GridConfig::parse_duration("").is_err());
        assert!(GridConfig::parse_duration("fast").is_err());
        assert!(GridConfig::parse_duration("10parsecs").is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [runner]
            budget = "250ms"

            [output]
            report = "out/report.json"
        "#;

        let config: GridConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.budget, "250ms");
        assert_eq!(config.output.report.as_deref(), Some("out/report.json"));
        // Defaults should still apply
        assert_eq!(config.runner.pin_cpu, 0);
        assert_eq!(config.discovery.patterns, vec!["**".to_string()]);
    }

    #[test]
    fn test_default_toml_parses() {
        let default_toml = GridConfig::default_toml();
        let config: GridConfig = toml::from_str(&default_toml).unwrap();
        assert_eq!(config.runner.budget, "1s");
    }
}
