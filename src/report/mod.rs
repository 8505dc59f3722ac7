//! Renderers for an [`Analysis`]: markdown document, JSON document and a
//! plain console summary.

pub mod markdown;

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, RouteError};
use crate::scan::Analysis;

pub use markdown::render_markdown;

/// Output format of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
    Summary,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "markdown",
            ReportFormat::Json => "json",
            ReportFormat::Summary => "summary",
        }
    }

    /// File written when no output path is given; `None` means stdout.
    pub fn default_output(&self) -> Option<&'static str> {
        match self {
            ReportFormat::Markdown => Some("apidocs.md"),
            ReportFormat::Json | ReportFormat::Summary => None,
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = RouteError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "json" => Ok(ReportFormat::Json),
            "summary" | "text" => Ok(ReportFormat::Summary),
            other => Err(RouteError::Config(format!(
                "unknown report format '{}' (expected markdown, json or summary)",
                other
            ))),
        }
    }
}

/// Facts about the run that are not part of the analysis itself.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub generated_at: DateTime<Local>,
    /// Prefix for curl examples, e.g. `http://localhost:8080`.
    pub base_url: Option<String>,
}

impl ReportContext {
    pub fn now() -> Self {
        Self {
            generated_at: Local::now(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    fn timestamp(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Render in the requested format.
pub fn render(format: ReportFormat, analysis: &Analysis, ctx: &ReportContext) -> Result<String> {
    match format {
        ReportFormat::Markdown => Ok(render_markdown(analysis, ctx)),
        ReportFormat::Json => render_json(analysis, ctx),
        ReportFormat::Summary => Ok(render_summary(analysis)),
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    #[serde(flatten)]
    analysis: &'a Analysis,
}

/// Pretty JSON document with endpoints, conflicts, summary and skipped files.
pub fn render_json(analysis: &Analysis, ctx: &ReportContext) -> Result<String> {
    let report = JsonReport {
        generated_at: ctx.generated_at.to_rfc3339(),
        analysis,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Console summary: counts per method and per conflict outcome.
pub fn render_summary(analysis: &Analysis) -> String {
    let summary = &analysis.summary;
    let mut out = String::new();

    let methods: Vec<String> = summary
        .methods
        .iter()
        .map(|(m, n)| format!("{} {}", m, n))
        .collect();
    out.push_str(&format!("Endpoints: {}", summary.endpoint_count));
    if !methods.is_empty() {
        out.push_str(&format!(" ({})", methods.join(", ")));
    }
    out.push('\n');

    out.push_str(&format!("Conflicts: {}", summary.conflict_count));
    let outcomes: Vec<String> = summary
        .conflicts_by_outcome
        .iter()
        .map(|(o, n)| format!("{} {}", o, n))
        .collect();
    if !outcomes.is_empty() {
        out.push_str(&format!(" ({})", outcomes.join(", ")));
    }
    out.push('\n');

    out.push_str(&format!(
        "Documented: {}/{} ({:.1}%)\n",
        summary.documented_count,
        summary.endpoint_count,
        summary.documentation_coverage()
    ));
    out.push_str(&format!(
        "Route groups: {}, data shapes: {}\n",
        summary.route_groups, summary.data_shape_count
    ));
    out.push_str(&format!(
        "Files: {} scanned, {} skipped\n",
        analysis.files_scanned,
        analysis.skipped.len()
    ));
    if analysis.dropped > 0 {
        out.push_str(&format!("Dropped declarations: {}\n", analysis.dropped));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;
    use crate::routes::DuplicateStrategy;
    use crate::scan::{analyze_sources, SourceFile};

    pub(crate) fn sample() -> Analysis {
        let src = r#"package main

func main() {
	// List users
	r.GET("/users", listUsers)
	r.POST("/users", createUser)
	// All users
	r.GET("/users/", listAll)
	r.DELETE("/users/:id", deleteUser)
	r.GET("/", index)
}
"#;
        let mut config = RouteConfig::default();
        config.resolve.duplicate_strategy = DuplicateStrategy::ReplaceNew;
        analyze_sources(&[SourceFile::new("main.go", src)], &config)
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("md".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("yaml".parse::<ReportFormat>().is_err());
        assert_eq!(ReportFormat::Markdown.default_output(), Some("apidocs.md"));
        assert_eq!(ReportFormat::Json.default_output(), None);
    }

    #[test]
    fn test_summary_text() {
        let text = render_summary(&sample());
        assert!(text.starts_with("Endpoints: 4 (GET 2, POST 1, DELETE 1)\n"));
        assert!(text.contains("Conflicts: 1 (Kept First 1)"));
        assert!(text.contains("Documented: 1/4 (25.0%)"));
        assert!(text.contains("Files: 1 scanned, 0 skipped"));
    }

    #[test]
    fn test_json_document() {
        let json = render_json(&sample(), &ReportContext::now()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["generated_at"].is_string());
        assert_eq!(value["endpoints"].as_array().unwrap().len(), 4);
        assert_eq!(value["conflicts"][0]["outcome"], "kept_first");
        assert_eq!(value["summary"]["endpoint_count"], 4);
        assert_eq!(value["files_scanned"], 1);
    }
}
