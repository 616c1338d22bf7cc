use anyhow::Result;
use callfreq::{
    CallfreqResult, CatalogRender, ChartRender, PresentationSink, StatusRender, SummaryRender,
};
use serde::Serialize;
use serde_json::Value;

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub struct CliLogger {
    json: bool,
    no_color: bool,
    chart_width: usize,
}

impl CliLogger {
    pub fn new(json: bool, no_color: bool, chart_width: usize) -> Self {
        Self {
            json,
            no_color,
            chart_width,
        }
    }

    pub fn print_serialized<T: Serialize>(&self, value: &T) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(value)?);
            return Ok(());
        }

        let rendered = render_value(&serde_json::to_value(value)?, 0);
        println!("{rendered}");
        Ok(())
    }

    pub fn print_error(&self, msg: &str) {
        if self.json {
            let out = serde_json::json!({
                "status": "error",
                "code": "error",
                "message": msg,
            });
            println!("{out}");
            return;
        }
        eprintln!("{} {msg}", self.style("error", "31;1"));
    }

    pub fn print_warning(&self, msg: &str) {
        if self.json {
            let out = serde_json::json!({
                "status": "warning",
                "code": "warning",
                "message": msg,
            });
            eprintln!("{out}");
            return;
        }
        eprintln!("{} {msg}", self.style("warn", "33;1"));
    }

    fn emit_json<T: Serialize>(&self, render: &str, data: &T) -> CallfreqResult<()> {
        let out = serde_json::json!({
            "render": render,
            "data": serde_json::to_value(data)?,
        });
        println!("{out}");
        Ok(())
    }

    fn style(&self, text: &str, ansi: &str) -> String {
        if self.no_color {
            return text.to_string();
        }
        format!("\x1b[{ansi}m{text}\x1b[0m")
    }
}

impl PresentationSink for CliLogger {
    fn render_status(&mut self, status: &StatusRender) -> CallfreqResult<()> {
        if self.json {
            return self.emit_json("status", status);
        }
        match status {
            StatusRender::Empty => println!("{}", self.style("no report loaded", "90")),
            StatusRender::Loading { ticket } => {
                println!("{} #{ticket}", self.style("loading", "36;1"));
            }
            StatusRender::Loaded {
                report_id,
                source,
                last_failure,
            } => {
                let short = report_id.get(..12).unwrap_or(report_id);
                println!(
                    "{} {short} {}",
                    self.style("report", "90"),
                    source.as_deref().unwrap_or("<blob>")
                );
                if let Some(failure) = last_failure {
                    self.print_warning(&format!("replacement rejected, kept previous report: {failure}"));
                }
            }
            StatusRender::Error { message, .. } => self.print_error(message),
        }
        Ok(())
    }

    fn render_summary(&mut self, summary: &SummaryRender) -> CallfreqResult<()> {
        if self.json {
            return self.emit_json("summary", summary);
        }
        let meta = &summary.metadata;
        let stats = &summary.summary;
        let mut out = String::new();
        out.push_str(&format!(
            "{} {} {}\n",
            self.style("callfreq", "36;1"),
            self.style(&summary.server_name, "37;1"),
            summary.server_version
        ));
        out.push_str(&format!(
            "{} {}  {} {}ms  {} {} calls\n",
            self.style("ticks", "90"),
            summary.tick_count,
            self.style("sampling", "90"),
            meta["sampling_rate_ms"],
            self.style("threshold", "90"),
            meta["excessive_call_threshold"]
        ));
        out.push_str(&format!(
            "{} {}  {} {}\n",
            self.style("unique methods", "90"),
            stats["unique_method_count"],
            self.style("avg calls/tick", "90"),
            stats["avg_calls_per_tick"]
        ));
        let filters: Vec<&str> = meta["method_filters"]
            .as_array()
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let filters = if filters.is_empty() {
            "None".to_string()
        } else {
            filters.join(", ")
        };
        out.push_str(&format!("{} {filters}\n", self.style("method filters", "90")));

        if let Some(top) = stats["top_methods"].as_array().filter(|t| !t.is_empty()) {
            out.push_str(&format!("{}\n", self.style("top methods", "33;1")));
            for (rank, entry) in top.iter().enumerate() {
                out.push_str(&format!(
                    "  #{rank} {} avg={} max={} total={}\n",
                    entry["method_name"].as_str().unwrap_or("?"),
                    entry["avg_calls_per_tick"],
                    entry["max_calls"],
                    entry["total_calls"]
                ));
            }
        }
        println!("{}", out.trim_end());
        Ok(())
    }

    fn render_catalog(&mut self, catalog: &CatalogRender) -> CallfreqResult<()> {
        if self.json {
            return self.emit_json("catalog", catalog);
        }
        let mut out = format!(
            "{} {}/{}",
            self.style("methods", "33;1"),
            catalog.methods.len(),
            catalog.total
        );
        if !catalog.filter.is_empty() {
            out.push_str(&format!(" {} {:?}", self.style("filter", "90"), catalog.filter));
        }
        out.push('\n');
        if catalog.methods.is_empty() {
            out.push_str(&format!("  {}\n", self.style("no methods match the filter", "90")));
        }
        for method in &catalog.methods {
            if catalog.selected.as_deref() == Some(method.as_str()) {
                out.push_str(&format!("{} {}\n", self.style(">", "34;1"), self.style(method, "34;1")));
            } else {
                out.push_str(&format!("  {method}\n"));
            }
        }
        println!("{}", out.trim_end());
        Ok(())
    }

    fn render_chart(&mut self, chart: &ChartRender) -> CallfreqResult<()> {
        if self.json {
            return self.emit_json("chart", chart);
        }
        let mut out = String::new();
        for series in &chart.series {
            let max = series.points.iter().copied().fold(0.0, f64::max);
            out.push_str(&format!("{}\n", self.style(&series.label, "37;1")));
            out.push_str(&format!(
                "  {}\n",
                self.style(&sparkline(&series.points, self.chart_width), "32")
            ));
            out.push_str(&format!("  {} {max}\n", self.style("peak", "90")));
        }
        if let (Some(first), Some(last)) = (chart.labels.first(), chart.labels.last()) {
            out.push_str(&format!(
                "  {} {first} .. {last} ({} points)\n",
                self.style("span", "90"),
                chart.labels.len()
            ));
        }
        println!("{}", out.trim_end());
        Ok(())
    }
}

/// Scales `points` into block characters, max-pooling down to `width` columns.
fn sparkline(points: &[f64], width: usize) -> String {
    if points.is_empty() {
        return String::new();
    }
    let width = width.max(1);
    let buckets: Vec<f64> = if points.len() <= width {
        points.to_vec()
    } else {
        (0..width)
            .map(|i| {
                let start = i * points.len() / width;
                let end = ((i + 1) * points.len() / width).max(start + 1);
                points[start..end].iter().copied().fold(0.0, f64::max)
            })
            .collect()
    };
    let max = buckets.iter().copied().fold(0.0, f64::max);
    let top = BARS.len() - 1;
    buckets
        .iter()
        .map(|v| {
            if max <= 0.0 {
                return BARS[0];
            }
            let idx = ((v / max) * top as f64).round() as usize;
            BARS[idx.min(top)]
        })
        .collect()
}

fn render_value(value: &Value, indent: usize) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Array(items) => render_array(items, indent),
        Value::Object(map) => render_object(map, indent),
    }
}

fn render_array(items: &[Value], indent: usize) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }

    let pad = " ".repeat(indent);
    let mut out = String::new();
    for item in items {
        match item {
            Value::Object(_) | Value::Array(_) => {
                out.push_str(&format!("{pad}-\n{}\n", render_value(item, indent + 2)));
            }
            _ => out.push_str(&format!("{pad}- {}\n", render_value(item, indent + 2))),
        }
    }
    out.trim_end().to_string()
}

fn render_object(map: &serde_json::Map<String, Value>, indent: usize) -> String {
    if map.is_empty() {
        return "{}".to_string();
    }

    let pad = " ".repeat(indent);
    let mut out = String::new();
    for (key, value) in map {
        match value {
            Value::Object(_) | Value::Array(_) => {
                out.push_str(&format!(
                    "{pad}{key}:\n{}\n",
                    render_value(value, indent + 2)
                ));
            }
            _ => out.push_str(&format!(
                "{pad}{key}: {}\n",
                render_value(value, indent + 2)
            )),
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparkline_scales_to_peak() {
        assert_eq!(sparkline(&[0.0, 5.0, 10.0], 10), "▁▅█");
    }

    #[test]
    fn sparkline_of_zeros_is_flat() {
        assert_eq!(sparkline(&[0.0, 0.0], 10), "▁▁");
        assert_eq!(sparkline(&[], 10), "");
    }

    #[test]
    fn sparkline_pools_down_to_width() {
        let points: Vec<f64> = (0..100).map(f64::from).collect();
        let line = sparkline(&points, 10);
        assert_eq!(line.chars().count(), 10);
        assert_eq!(line.chars().last(), Some('█'));
    }

    #[test]
    fn render_value_nests_objects() {
        let value = serde_json::json!({"a": [1, {"b": true}]});
        assert_eq!(render_value(&value, 0), "a:\n  - 1\n  -\n    b: true");
    }
}
