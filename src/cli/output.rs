use crate::cli::args::OutputFormat;
use crate::core::pipeline::Config;
use anyhow::Context;

/// Render a decoded configuration for stdout.
pub fn render(config: &Config, format: OutputFormat) -> crate::Result<String> {
    match format {
        OutputFormat::Debug => Ok(format!("{:#?}", config)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(config).context("failed to render configuration as JSON")
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(config).context("failed to render configuration as YAML")
        }
    }
}
