//! Formatted terminal output for merged timelines.

use crate::app::pipeline::RunOutput;
use crate::domain::{MergedTimeline, TimelineConfig};
use crate::report::{ProductStats, Summary};

/// Placeholder printed instead of an empty chart or table.
pub const NO_DATA: &str = "No timeline data for the current selection.";

/// Format the run header plus per-product summary and top list.
pub fn format_run_summary(run: &RunOutput, config: &TimelineConfig) -> String {
    let mut out = String::new();

    out.push_str("=== ptl - Purchase Timeline ===\n");
    out.push_str(&format!("Source: {}\n", run.fetched.source));
    out.push_str(&format!(
        "Fetched: {}\n",
        run.fetched.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!(
        "Products: {} shown of {} read | filter: {}\n",
        run.merged.products.len(),
        run.fetched.ingest.products_read,
        config.filter.label()
    ));
    if !run.fetched.ingest.dropped.is_empty() {
        out.push_str(&format!(
            "Dropped: {} item(s) ({} series points)\n",
            run.fetched.ingest.dropped.len(),
            run.fetched.ingest.points_dropped()
        ));
    }
    if run.projected > 0 {
        out.push_str(&format!("Projected forecasts: {}\n", run.projected));
    }
    if let (Some(first), Some(last)) = (run.merged.axis.first(), run.merged.axis.last()) {
        out.push_str(&format!(
            "Axis: {} points | days_before=[{first}, {last}]\n",
            run.merged.axis.len()
        ));
    }

    out.push('\n');
    out.push_str(&format_summary(&run.summary));
    out
}

/// Per-product table, totals, and the top-N list.
pub fn format_summary(summary: &Summary) -> String {
    if summary.products.is_empty() {
        return format!("{NO_DATA}\n");
    }

    let mut out = String::new();
    out.push_str(
        format!(
            "{:<12} {:<28} {:>6} {:>8} {:>12} {:>10} {:<9} {:<16}\n",
            "id", "name", "sales", "target", "revenue", "avg", "pace", "status"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<12} {:-<28} {:-<6} {:-<8} {:-<12} {:-<10} {:-<9} {:-<16}\n",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for p in &summary.products {
        out.push_str(
            format!(
                "{:<12} {:<28} {:>6} {:>8} {:>12} {:>10} {:<9} {:<16}\n",
                truncate(&p.product_id, 12),
                truncate(&p.product_name, 28),
                p.total_sales,
                fmt_target(p),
                fmt_cents(p.total_revenue_cents),
                fmt_cents(p.avg_price_cents),
                p.rating.map(|r| r.display_name()).unwrap_or("-"),
                fmt_status(p),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out.push_str(&format!(
        "\nTotal: {} sales | {}\n",
        summary.total_sales,
        fmt_cents(summary.total_revenue_cents)
    ));

    if !summary.top.is_empty() {
        out.push_str("\nTop products by sales:\n");
        for (i, t) in summary.top.iter().enumerate() {
            out.push_str(&format!(
                "{:>2}. {:<28} {:>6} ({:.1}%)\n",
                i + 1,
                truncate(&t.product_name, 28),
                t.total_sales,
                t.share_pct
            ));
        }
    }

    out
}

/// Merged rows as a fixed-width table (`max_rows = 0` prints all rows).
pub fn format_rows(merged: &MergedTimeline, max_rows: usize) -> String {
    if merged.is_empty() {
        return format!("{NO_DATA}\n");
    }

    let mut out = String::new();
    let mut header = format!("{:>6}", "days");
    for p in &merged.products {
        let id = truncate(&p.product_id, 8);
        header.push_str(&format!(" {:>10} {:>10}", format!("{id}.a"), format!("{id}.f")));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    let limit = if max_rows == 0 { merged.rows.len() } else { max_rows };
    for row in merged.rows.iter().take(limit) {
        let mut line = format!("{:>6}", row.days_before);
        for p in &merged.products {
            let cell = row.cell(&p.product_id);
            line.push_str(&format!(" {:>10} {:>10}", fmt_opt(cell.actual), fmt_opt(cell.forecast)));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    if merged.rows.len() > limit {
        out.push_str(&format!("... {} more row(s)\n", merged.rows.len() - limit));
    }
    out
}

/// Format cents as dollars with thousands separators, e.g. `$1,234.50`.
pub fn fmt_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let dollars = (abs / 100).to_string();
    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{:02}", abs % 100)
}

fn fmt_target(p: &ProductStats) -> String {
    match (p.sales_target, p.target_pct) {
        (Some(t), Some(pct)) => format!("{t} {pct:.0}%"),
        (Some(t), None) => t.to_string(),
        _ => "-".to_string(),
    }
}

pub fn fmt_status(p: &ProductStats) -> String {
    if p.is_upcoming {
        match p.days_until_start {
            Some(d) => format!("starts in {d}d"),
            None => "upcoming".to_string(),
        }
    } else {
        match p.median_days_before {
            Some(m) => format!("done, med {m:.0}d"),
            None => "done".to_string(),
        }
    }
}

fn fmt_opt(v: Option<u64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProductMeta, ProductSeries, SeriesPoint};
    use crate::report::summarize;
    use crate::timeline::merge_timeline;

    fn scenario() -> MergedTimeline {
        merge_timeline(&[ProductSeries {
            product_id: "A".to_string(),
            product_name: "Course A".to_string(),
            actual_series: vec![SeriesPoint::new(30, 5), SeriesPoint::new(10, 40), SeriesPoint::new(0, 100)],
            forecast_series: vec![SeriesPoint::new(0, 100), SeriesPoint::new(-5, 130), SeriesPoint::new(-10, 160)],
            meta: ProductMeta {
                total_sales: 100,
                total_revenue_cents: 7_120_000,
                sales_target: Some(80),
                avg_price_cents: 71_200,
                is_upcoming: true,
                days_until_start: Some(0),
                ..ProductMeta::default()
            },
        }])
    }

    #[test]
    fn fmt_cents_groups_thousands() {
        assert_eq!(fmt_cents(0), "$0.00");
        assert_eq!(fmt_cents(71_200), "$712.00");
        assert_eq!(fmt_cents(123_456_789), "$1,234,567.89");
        assert_eq!(fmt_cents(-5), "-$0.05");
    }

    #[test]
    fn rows_table_marks_nulls() {
        let txt = format_rows(&scenario(), 0);
        let expected = concat!(
            "  days        A.a        A.f\n",
            "    30          5          -\n",
            "    10         40          -\n",
            "     5         40          -\n",
            "     0        100        100\n",
            "    -5          -        130\n",
            "   -10          -        160\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn rows_table_respects_limit() {
        let txt = format_rows(&scenario(), 2);
        assert!(txt.ends_with("... 4 more row(s)\n"));
    }

    #[test]
    fn empty_views_print_placeholder() {
        let empty = MergedTimeline::default();
        assert_eq!(format_rows(&empty, 0), format!("{NO_DATA}\n"));
        assert_eq!(format_summary(&summarize(&empty, 3)), format!("{NO_DATA}\n"));
    }

    #[test]
    fn summary_lists_target_progress() {
        let txt = format_summary(&summarize(&scenario(), 3));
        assert!(txt.contains("80 125%"));
        assert!(txt.contains("$71,200.00"));
        assert!(txt.contains("starts in 0d"));
        assert!(txt.contains(" 1. Course A"));
    }
}
