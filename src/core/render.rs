//! Renderer module
//!
//! Renders ResultSet to different output formats: jsonl, json, md, raw

use crate::core::model::{Kind, ResultItem, ResultSet};
use std::io::Write;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Markdown,
    Raw,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "raw" => Ok(OutputFormat::Raw),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pretty: false,
        }
    }

    /// Create a new render config with pretty option
    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Renderer for result sets
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    #[allow(dead_code)]
    pub fn new(format: OutputFormat) -> Self {
        Self {
            config: RenderConfig::new(format),
        }
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a result set to a string
    pub fn render(&self, result_set: &ResultSet) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(result_set),
            OutputFormat::Json => self.render_json(result_set),
            OutputFormat::Markdown => self.render_markdown(result_set),
            OutputFormat::Raw => self.render_raw(result_set),
        }
    }

    /// Render to a writer, newline terminated
    pub fn render_to<W: Write>(&self, result_set: &ResultSet, mut writer: W) -> std::io::Result<()> {
        let output = self.render(result_set);
        writer.write_all(output.as_bytes())?;
        if !output.is_empty() && !output.ends_with('\n') {
            writer.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Render as JSON Lines (one JSON object per line)
    fn render_jsonl(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| {
                if self.config.pretty {
                    serde_json::to_string_pretty(item).ok()
                } else {
                    serde_json::to_string(item).ok()
                }
            })
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    /// Render as a single JSON array
    fn render_json(&self, result_set: &ResultSet) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        } else {
            serde_json::to_string(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        }
    }

    /// Render as Markdown: summary heading, errors, then one section per file
    fn render_markdown(&self, result_set: &ResultSet) -> String {
        let mut output = String::new();

        if let Some(summary) = &result_set.summary {
            output.push_str(&format!("# {}\n\n", summary));
        }

        let errors: Vec<_> = result_set
            .items
            .iter()
            .filter(|i| i.kind == Kind::Error)
            .collect();
        if !errors.is_empty() {
            output.push_str("## Errors\n\n");
            for item in errors {
                for error in &item.errors {
                    output.push_str(&format!("- **{}**: {}\n", error.code, error.message));
                }
            }
            output.push('\n');
        }

        let mut in_section = false;
        for item in &result_set.items {
            match item.kind {
                Kind::File => {
                    if in_section {
                        output.push('\n');
                    }
                    if let Some(path) = &item.path {
                        output.push_str(&format!("## `{}`", path));
                        if let Some(count) = item.meta.count {
                            output.push_str(&format!(" ({})", count));
                        }
                        output.push_str("\n\n");
                        in_section = true;
                    }
                }
                Kind::Match => self.render_match_md(&mut output, item),
                Kind::Error => {}
            }
        }
        if in_section {
            output.push('\n');
        }

        output
    }

    fn render_match_md(&self, output: &mut String, item: &ResultItem) {
        output.push_str("- ");
        if item.meta.nearest {
            output.push_str("**→** ");
        }
        if let Some(range) = &item.range {
            output.push_str(&format!("`{}`", range.start));
        }
        if let Some(excerpt) = &item.excerpt {
            output.push_str(&format!(" {}", excerpt));
        }
        if item.meta.truncated {
            output.push_str(" ⚠️ truncated");
        }
        output.push('\n');
    }

    /// Render as plain text (copy-paste friendly, not a stable format)
    fn render_raw(&self, result_set: &ResultSet) -> String {
        let mut lines = Vec::new();
        let mut last_path: Option<&str> = None;
        for item in &result_set.items {
            match item.kind {
                Kind::File => {
                    if let Some(path) = item.path.as_deref() {
                        lines.push(path.to_string());
                        last_path = Some(path);
                    }
                }
                Kind::Match => {
                    let path = item.path.as_deref();
                    if path.is_some() && path != last_path {
                        lines.push(path.unwrap_or_default().to_string());
                        last_path = path;
                    }
                    let mut line = String::from("  ");
                    if let Some(range) = &item.range {
                        line.push_str(&format!(
                            "{}, {}",
                            range.start.line + 1,
                            range.start.character + 1
                        ));
                    }
                    if let Some(excerpt) = &item.excerpt {
                        line.push_str(&format!(": {}", excerpt));
                    }
                    lines.push(line);
                }
                Kind::Error => {
                    for error in &item.errors {
                        lines.push(format!("error[{}]: {}", error.code, error.message));
                    }
                }
            }
        }
        lines.join("\n")
    }
}
