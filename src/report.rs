//! Report aggregation: a text comparison table for the terminal, a JSON
//! artifact carrying the run metadata, and a grouped bar chart (SVG) with the
//! numeric duration annotated above each bar.

use crate::error::Result;
use crate::schema::{MeasurementResult, RegistryBenchReport, RunMeta};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const SCHEMA_VERSION: u32 = 1;

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 90.0;
const PLOT_HEIGHT: f64 = 260.0;
const GROUP_WIDTH: f64 = 120.0;
const BAR_WIDTH: f64 = 40.0;
const BAR_GAP: f64 = 8.0;

const RELATIONAL_COLOR: &str = "#4c72b0";
const DOCUMENT_COLOR: &str = "#dd8452";

pub fn build_report(seed: u64, workers: usize, results: &[MeasurementResult]) -> RegistryBenchReport {
    RegistryBenchReport {
        run: RunMeta {
            schema_version: SCHEMA_VERSION,
            bench_version: env!("CARGO_PKG_VERSION").to_string(),
            seed,
            workers,
            timestamp_utc: chrono::Utc::now().to_rfc3339(),
            git_sha: git_sha_short(),
        },
        results: results.to_vec(),
    }
}

fn git_sha_short() -> Option<String> {
    // Best-effort: read from environment set by CI/build scripts.
    std::env::var("GIT_SHA")
        .ok()
        .or_else(|| std::env::var("GITHUB_SHA").ok())
        .map(|s| s.chars().take(12).collect())
}

fn fmt_secs(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4}"),
        None => "-".to_string(),
    }
}

pub fn render_table(results: &[MeasurementResult]) -> String {
    let label_width = results
        .iter()
        .map(|r| r.label.len())
        .chain(std::iter::once("workload".len()))
        .max()
        .unwrap_or(8);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<label_width$}  {:>14}  {:>14}",
        "workload", "relational (s)", "document (s)"
    );
    let _ = writeln!(out, "{}", "-".repeat(label_width + 32));
    for result in results {
        let _ = writeln!(
            out,
            "{:<label_width$}  {:>14}  {:>14}",
            result.label,
            fmt_secs(result.relational_secs),
            fmt_secs(result.document_secs),
        );
    }
    out
}

pub fn write_json_report(dir: &Path, name: &str, report: &RegistryBenchReport) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{name}.json"));
    fs::write(&path, serde_json::to_string_pretty(report)?)?;
    Ok(path)
}

/// Grouped two-bar comparison under a shared label axis. Absent durations
/// render as omitted bars rather than erroring.
pub fn write_bar_chart(dir: &Path, name: &str, results: &[MeasurementResult]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{name}.svg"));
    fs::write(&path, bar_chart_svg(results))?;
    Ok(path)
}

fn bar_chart_svg(results: &[MeasurementResult]) -> String {
    let width = (MARGIN_LEFT + MARGIN_RIGHT + GROUP_WIDTH * results.len() as f64).max(320.0);
    let height = MARGIN_TOP + PLOT_HEIGHT + MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + PLOT_HEIGHT;

    let max_secs = results
        .iter()
        .flat_map(|r| [r.relational_secs, r.document_secs])
        .flatten()
        .fold(0.0f64, f64::max);
    // Flat scale when nothing was measured, so empty charts still render.
    let scale = if max_secs > 0.0 {
        PLOT_HEIGHT / max_secs
    } else {
        0.0
    };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{height:.0}" viewBox="0 0 {width:.0} {height:.0}">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{:.0}" y="22" font-family="sans-serif" font-size="15" text-anchor="middle">Execution time: relational vs document (seconds)</text>"#,
        width / 2.0
    );

    // Axes.
    let _ = writeln!(
        svg,
        r#"<line x1="{MARGIN_LEFT:.0}" y1="{MARGIN_TOP:.0}" x2="{MARGIN_LEFT:.0}" y2="{baseline:.0}" stroke="black"/>"#
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{MARGIN_LEFT:.0}" y1="{baseline:.0}" x2="{:.0}" y2="{baseline:.0}" stroke="black"/>"#,
        width - MARGIN_RIGHT
    );

    for (i, result) in results.iter().enumerate() {
        let group_left = MARGIN_LEFT + GROUP_WIDTH * i as f64;
        let center = group_left + GROUP_WIDTH / 2.0;
        let rel_x = center - BAR_GAP / 2.0 - BAR_WIDTH;
        let doc_x = center + BAR_GAP / 2.0;

        draw_bar(&mut svg, rel_x, baseline, result.relational_secs, scale, RELATIONAL_COLOR);
        draw_bar(&mut svg, doc_x, baseline, result.document_secs, scale, DOCUMENT_COLOR);

        let _ = writeln!(
            svg,
            r#"<text x="{center:.1}" y="{:.0}" font-family="sans-serif" font-size="11" text-anchor="middle">{}</text>"#,
            baseline + 20.0,
            escape_xml(&result.label)
        );
    }

    // Legend.
    let legend_x = width - MARGIN_RIGHT - 130.0;
    let _ = writeln!(
        svg,
        r#"<rect x="{legend_x:.0}" y="{MARGIN_TOP:.0}" width="12" height="12" fill="{RELATIONAL_COLOR}"/><text x="{:.0}" y="{:.0}" font-family="sans-serif" font-size="11">relational</text>"#,
        legend_x + 18.0,
        MARGIN_TOP + 10.0
    );
    let _ = writeln!(
        svg,
        r#"<rect x="{legend_x:.0}" y="{:.0}" width="12" height="12" fill="{DOCUMENT_COLOR}"/><text x="{:.0}" y="{:.0}" font-family="sans-serif" font-size="11">document</text>"#,
        MARGIN_TOP + 18.0,
        legend_x + 18.0,
        MARGIN_TOP + 28.0
    );

    svg.push_str("</svg>\n");
    svg
}

fn draw_bar(svg: &mut String, x: f64, baseline: f64, secs: Option<f64>, scale: f64, color: &str) {
    let Some(secs) = secs else {
        return;
    };
    let bar_height = (secs.max(0.0) * scale).min(PLOT_HEIGHT);
    let y = baseline - bar_height;
    let _ = writeln!(
        svg,
        r#"<rect x="{x:.1}" y="{y:.1}" width="{BAR_WIDTH:.0}" height="{bar_height:.1}" fill="{color}"/>"#
    );
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="10" text-anchor="middle">{secs:.4}</text>"#,
        x + BAR_WIDTH / 2.0,
        y - 4.0
    );
}

fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_results() -> Vec<MeasurementResult> {
        vec![
            MeasurementResult::new("find by external id", Some(0.0123), Some(0.0456)),
            MeasurementResult::new("concurrent insert 1000", Some(1.5), None),
        ]
    }

    #[test]
    fn table_shows_absent_durations_as_dash() {
        let table = render_table(&sample_results());
        assert!(table.contains("find by external id"));
        assert!(table.contains("0.0123"));
        assert!(table.contains('-'));
    }

    #[test]
    fn json_report_round_trips() {
        let report = build_report(42, 10, &sample_results());
        let dir = tempfile::tempdir().unwrap();
        let path = write_json_report(dir.path(), "queries", &report).unwrap();

        let raw = fs::read_to_string(path).unwrap();
        let loaded: RegistryBenchReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(loaded.run.seed, 42);
        assert_eq!(loaded.results.len(), 2);
        assert_eq!(loaded.results[1].document_secs, None);
    }

    #[test]
    fn chart_renders_absent_bars_as_omitted() {
        let svg = bar_chart_svg(&sample_results());
        // Two results, three measured durations: three bars plus legend swatches.
        assert_eq!(svg.matches("<rect").count(), 3 + 2 + 1);
        assert!(svg.contains("1.5000"));
        assert!(svg.contains("concurrent insert 1000"));
    }

    #[test]
    fn chart_handles_empty_and_unmeasured_results() {
        assert!(bar_chart_svg(&[]).contains("</svg>"));
        let unmeasured = vec![MeasurementResult::new("pending", None, None)];
        let svg = bar_chart_svg(&unmeasured);
        assert!(svg.contains("pending"));
    }

    #[test]
    fn chart_artifact_lands_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bar_chart(dir.path(), "writes", &sample_results()).unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("svg"));
    }
}
