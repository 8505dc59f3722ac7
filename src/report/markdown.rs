//! Markdown API document.

use std::collections::BTreeMap;
use std::fmt::Write;

use super::ReportContext;
use crate::routes::{ConflictRecord, EndpointRecord, HttpMethod};
use crate::scan::Analysis;

/// Width of the method distribution bars.
const BAR_WIDTH: usize = 30;

/// Rows per group in the table of contents.
const TOC_ROWS: usize = 10;

fn badge(method: HttpMethod) -> String {
    let dot = match method {
        HttpMethod::Get => "🟢",
        HttpMethod::Post => "🔵",
        HttpMethod::Put => "🟡",
        HttpMethod::Delete => "🔴",
        HttpMethod::Patch => "🟠",
        HttpMethod::Options => "⚪",
        _ => "⚫",
    };
    format!("{} {}", dot, method)
}

/// Group key: `/users` for `/users/{param}`, `/` for the root.
fn group_of(endpoint: &EndpointRecord) -> String {
    match endpoint.fingerprint.path.first_segment() {
        Some(seg) => format!("/{}", seg),
        None => "/".to_string(),
    }
}

fn anchor(group: &str) -> String {
    let a: String = group
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect::<String>()
        .to_lowercase();
    if a.is_empty() {
        "root".to_string()
    } else {
        a
    }
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Render the full markdown document.
pub fn render_markdown(analysis: &Analysis, ctx: &ReportContext) -> String {
    let mut groups: BTreeMap<String, Vec<&EndpointRecord>> = BTreeMap::new();
    for endpoint in &analysis.endpoints {
        groups.entry(group_of(endpoint)).or_default().push(endpoint);
    }

    let mut out = String::new();
    header(&mut out, analysis, ctx, groups.len());
    contents(&mut out, &groups, ctx);
    details(&mut out, &groups, ctx);
    conflicts(&mut out, &analysis.conflicts);
    statistics(&mut out, analysis);
    skipped(&mut out, analysis);

    out.push_str("---\n\n");
    let _ = writeln!(
        out,
        "*Generated by routescribe on {}.*",
        ctx.generated_at.format("%A, %B %d, %Y at %I:%M %p")
    );
    out
}

fn header(out: &mut String, analysis: &Analysis, ctx: &ReportContext, group_count: usize) {
    let summary = &analysis.summary;
    out.push_str("# API Documentation\n\n");
    let _ = writeln!(out, "Generated {} from Go source code.\n", ctx.timestamp());

    if summary.endpoint_count == 0 {
        out.push_str("⚪ **Status**: No endpoints found\n\n");
    } else {
        let _ = writeln!(
            out,
            "🟢 **Status**: Ready, {:.1}% documented\n",
            summary.documentation_coverage()
        );
    }

    out.push_str("---\n\n## Overview\n\n");
    out.push_str("| Metric | Value |\n|---|---|\n");
    let _ = writeln!(out, "| Total Endpoints | {} |", summary.endpoint_count);
    let _ = writeln!(out, "| Route Groups | {} |", group_count);
    let _ = writeln!(out, "| HTTP Methods | {} |", summary.methods.len());
    let _ = writeln!(out, "| Files Scanned | {} |", analysis.files_scanned);
    let _ = writeln!(out, "| Conflicts Resolved | {} |", summary.conflict_count);
    if summary.data_shape_count > 0 {
        let _ = writeln!(out, "| Data Shapes | {} |", summary.data_shape_count);
    }
    out.push('\n');

    if !summary.methods.is_empty() {
        out.push_str("### HTTP Method Distribution\n\n");
        let badges: Vec<String> = summary
            .methods
            .iter()
            .map(|(m, n)| format!("{}: {}", badge(*m), n))
            .collect();
        out.push_str(&badges.join(" | "));
        out.push_str("\n\n");
    }
}

fn contents(out: &mut String, groups: &BTreeMap<String, Vec<&EndpointRecord>>, ctx: &ReportContext) {
    if groups.is_empty() {
        return;
    }
    out.push_str("---\n\n## Table of Contents\n\n");
    for (i, (group, endpoints)) in groups.iter().enumerate() {
        let icon = if group == "/" { "🏠" } else { "📁" };
        let _ = writeln!(out, "### {}. {} {}\n", i + 1, icon, group.to_uppercase());
        out.push_str("| Method | Path | Handler | Quick Test |\n");
        out.push_str("|--------|------|---------|------------|\n");
        for endpoint in endpoints.iter().take(TOC_ROWS) {
            let _ = writeln!(
                out,
                "| {} | `{}` | `{}` | `{}` |",
                badge(endpoint.method()),
                endpoint.display_path,
                cell(&endpoint.handler),
                endpoint.curl_example(ctx.base_url.as_deref())
            );
        }
        if endpoints.len() > TOC_ROWS {
            let _ = writeln!(
                out,
                "\n[...] **{} more endpoints** - [{}](#{})",
                endpoints.len() - TOC_ROWS,
                group,
                anchor(group)
            );
        }
        out.push('\n');
    }
}

fn details(out: &mut String, groups: &BTreeMap<String, Vec<&EndpointRecord>>, ctx: &ReportContext) {
    if groups.is_empty() {
        return;
    }
    out.push_str("---\n\n## Endpoint Details\n\n");
    for (group, endpoints) in groups {
        let _ = writeln!(out, "### {} Endpoints\n", group.to_uppercase());
        for endpoint in endpoints {
            endpoint_block(out, endpoint, ctx);
        }
    }
}

fn endpoint_block(out: &mut String, endpoint: &EndpointRecord, ctx: &ReportContext) {
    let _ = writeln!(
        out,
        "<details>\n<summary>{} `{}`</summary>\n",
        badge(endpoint.method()),
        endpoint.display_path
    );
    out.push_str("| Property | Value |\n|---|---|\n");
    let _ = writeln!(out, "| Handler | `{}` |", cell(&endpoint.handler));
    let _ = writeln!(out, "| Description | {} |", cell(&endpoint.description));
    let _ = writeln!(out, "| Endpoint Key | `{}` |", endpoint.fingerprint);
    let sources: Vec<String> = endpoint.sources.iter().map(|s| s.display_short()).collect();
    let _ = writeln!(out, "| Source | {} |", sources.join(", "));

    let _ = writeln!(
        out,
        "\n**Testing**\n```bash\n{}\n```",
        endpoint.curl_example(ctx.base_url.as_deref())
    );

    if !endpoint.data_shapes.is_empty() {
        out.push_str("\n**Data Shapes**\n\n");
        for shape in &endpoint.data_shapes {
            let _ = writeln!(out, "#### {}\n", shape.name);
            let _ = writeln!(out, "**Description**: {}\n", shape.description);
            let is_json = shape.shape.trim_start().starts_with(|c: char| c == '{' || c == '[');
            let fence = if is_json { "json" } else { "text" };
            let _ = writeln!(out, "```{}\n{}\n```\n", fence, shape.shape);
        }
    }
    out.push_str("</details>\n\n");
}

fn conflicts(out: &mut String, conflicts: &[ConflictRecord]) {
    if conflicts.is_empty() {
        return;
    }
    out.push_str("---\n\n## Duplicate Resolution\n\n");
    let _ = writeln!(
        out,
        "{} duplicate declaration{} resolved.\n",
        conflicts.len(),
        if conflicts.len() == 1 { "" } else { "s" }
    );
    out.push_str("| # | Endpoint | Strategy | Outcome | Existing | Incoming | Result |\n");
    out.push_str("|---|---|---|---|---|---|---|\n");
    for (i, conflict) in conflicts.iter().enumerate() {
        let incoming = conflict
            .incoming
            .comment_text()
            .unwrap_or(crate::routes::DEFAULT_DESCRIPTION);
        let _ = writeln!(
            out,
            "| {} | `{}` | {} | {} | {} ({}) | {} ({}) | {} |",
            i + 1,
            conflict.fingerprint,
            conflict.strategy,
            conflict.outcome,
            cell(&conflict.existing.description),
            conflict
                .existing
                .origin()
                .map(|p| p.display_short())
                .unwrap_or_default(),
            cell(incoming),
            conflict.incoming.position.display_short(),
            cell(&conflict.resolved.description)
        );
    }
    out.push('\n');
}

fn statistics(out: &mut String, analysis: &Analysis) {
    let summary = &analysis.summary;
    if summary.endpoint_count == 0 {
        return;
    }
    out.push_str("---\n\n## Statistics\n\n### HTTP Method Distribution\n\n");
    let max = summary.methods.values().copied().max().unwrap_or(1).max(1);
    for (method, count) in &summary.methods {
        let filled = count * BAR_WIDTH / max;
        let pct = *count as f64 / summary.endpoint_count as f64 * 100.0;
        let _ = writeln!(
            out,
            "**{}**: {} endpoint{} {}{} {:.1}%  ",
            badge(*method),
            count,
            if *count == 1 { "" } else { "s" },
            "█".repeat(filled),
            "░".repeat(BAR_WIDTH - filled),
            pct
        );
    }

    out.push_str("\n### Documentation\n\n| Metric | Value |\n|---|---|\n");
    let _ = writeln!(
        out,
        "| Documentation Coverage | {:.1}% |",
        summary.documentation_coverage()
    );
    let _ = writeln!(
        out,
        "| Documented Endpoints | {}/{} |",
        summary.documented_count, summary.endpoint_count
    );
    out.push('\n');
}

fn skipped(out: &mut String, analysis: &Analysis) {
    if analysis.skipped.is_empty() {
        return;
    }
    out.push_str("---\n\n## Skipped Files\n\n");
    for file in &analysis.skipped {
        let _ = writeln!(out, "- `{}`: {}", file.path.display(), file.reason);
    }
    out.push('\n');
}
