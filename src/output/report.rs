// Report Generator - daily/weekly/monthly summaries of persisted monitoring state

use crate::Result;
use crate::error::MonitorError;
use crate::monitor::alerts::Alert;
use crate::monitor::store::{AppendLog, MonitorStore};
use crate::monitor::types::{CycleSummary, MetricRecord, Severity};
use chrono::{DateTime, Duration, Utc};
use handlebars::Handlebars;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Number of alerts listed individually in a report
pub const RECENT_ALERT_LIMIT: usize = 20;

/// Reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl ReportPeriod {
    pub fn days(&self) -> i64 {
        match self {
            ReportPeriod::Daily => 1,
            ReportPeriod::Weekly => 7,
            ReportPeriod::Monthly => 30,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportPeriod::Daily => "daily",
            ReportPeriod::Weekly => "weekly",
            ReportPeriod::Monthly => "monthly",
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Output formats for a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Markdown,
    Html,
    Both,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeverityCount {
    pub severity: Severity,
    pub class: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricRow {
    pub check_name: String,
    pub timestamp: String,
    pub payload: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertRow {
    pub timestamp: String,
    pub severity: Severity,
    pub class: String,
    pub check_name: String,
    pub title: String,
    pub message: String,
    pub channels: String,
    pub suppressed: bool,
}

/// Everything a report template renders
#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub period: ReportPeriod,
    pub generated_at: String,
    pub window_start: String,
    pub total_alerts: usize,
    pub suppressed_alerts: usize,
    pub by_severity: Vec<SeverityCount>,
    pub by_check: BTreeMap<String, usize>,
    pub cycles_run: usize,
    pub cycles_with_failures: usize,
    pub average_duration_ms: u64,
    pub latest_metrics: Vec<MetricRow>,
    pub recent_alerts: Vec<AlertRow>,
}

impl ReportData {
    pub fn severity_count(&self, severity: Severity) -> usize {
        self.by_severity
            .iter()
            .find(|c| c.severity == severity)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

const MARKDOWN_TEMPLATE: &str = r#"# Vault Sentinel {{period}} security report

Generated: {{generated_at}}
Period: {{window_start}} to {{generated_at}}

## Alerts

Total alerts: {{total_alerts}} ({{suppressed_alerts}} suppressed)

| Severity | Count |
|----------|-------|
{{#each by_severity}}| {{severity}} | {{count}} |
{{/each}}

{{#if by_check}}
| Check | Alerts |
|-------|--------|
{{#each by_check}}| {{@key}} | {{this}} |
{{/each}}
{{/if}}

## Monitoring cycles

- Cycles run: {{cycles_run}}
- Cycles with failed checks: {{cycles_with_failures}}
- Average cycle duration: {{average_duration_ms}}ms

## Latest metrics

{{#each latest_metrics}}
### {{check_name}} ({{timestamp}})

```json
{{payload}}
```

{{else}}
No metrics recorded in this period.
{{/each}}

## Recent alerts

{{#each recent_alerts}}
- **{{severity}}** {{timestamp}} [{{check_name}}] {{title}}: {{message}}{{#if suppressed}} _(suppressed)_{{/if}}
{{else}}
No alerts in this period.
{{/each}}
"#;

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Vault Sentinel {{period}} report</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; background: #f5f5f5; padding: 20px; }
        .container { max-width: 1200px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
        h2 { color: #34495e; margin-top: 30px; margin-bottom: 15px; padding-bottom: 10px; border-bottom: 2px solid #3498db; }
        .header { background: linear-gradient(135deg, #2c3e50 0%, #4ca1af 100%); color: white; padding: 40px; border-radius: 8px; margin-bottom: 30px; }
        .summary-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin: 20px 0; }
        .summary-card { background: #f8f9fa; padding: 20px; border-radius: 8px; border-left: 4px solid #3498db; }
        .summary-card .value { font-size: 2em; font-weight: bold; color: #3498db; margin-top: 10px; }
        table { width: 100%; border-collapse: collapse; margin: 20px 0; }
        th, td { padding: 12px; text-align: left; border-bottom: 1px solid #ddd; vertical-align: top; }
        th { background: #34495e; color: white; }
        pre { background: #f8f9fa; padding: 10px; border-radius: 4px; overflow-x: auto; }
        .severity-critical { background: #c0392b; color: white; padding: 4px 8px; border-radius: 4px; }
        .severity-high { background: #e74c3c; color: white; padding: 4px 8px; border-radius: 4px; }
        .severity-medium { background: #f39c12; color: white; padding: 4px 8px; border-radius: 4px; }
        .severity-low { background: #95a5a6; color: white; padding: 4px 8px; border-radius: 4px; }
        .severity-info { background: #7f8c8d; color: white; padding: 4px 8px; border-radius: 4px; }
        .footer { margin-top: 40px; padding-top: 20px; border-top: 1px solid #ddd; color: #7f8c8d; text-align: center; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Vault Sentinel {{period}} security report</h1>
            <div>{{window_start}} to {{generated_at}}</div>
        </div>

        <section>
            <h2>Summary</h2>
            <div class="summary-grid">
                <div class="summary-card"><h3>Alerts</h3><div class="value">{{total_alerts}}</div></div>
                <div class="summary-card"><h3>Cycles</h3><div class="value">{{cycles_run}}</div></div>
                <div class="summary-card"><h3>Cycles with failures</h3><div class="value">{{cycles_with_failures}}</div></div>
                <div class="summary-card"><h3>Avg cycle</h3><div class="value">{{average_duration_ms}}ms</div></div>
            </div>
            <table>
                <thead><tr><th>Severity</th><th>Count</th></tr></thead>
                <tbody>
                {{#each by_severity}}
                    <tr><td><span class="severity-{{class}}">{{severity}}</span></td><td>{{count}}</td></tr>
                {{/each}}
                </tbody>
            </table>
            {{#if by_check}}
            <table>
                <thead><tr><th>Check</th><th>Alerts</th></tr></thead>
                <tbody>
                {{#each by_check}}
                    <tr><td>{{@key}}</td><td>{{this}}</td></tr>
                {{/each}}
                </tbody>
            </table>
            {{/if}}
        </section>

        <section>
            <h2>Latest metrics</h2>
            {{#each latest_metrics}}
                <h3>{{check_name}} <small>{{timestamp}}</small></h3>
                <pre>{{payload}}</pre>
            {{else}}
                <p>No metrics recorded in this period.</p>
            {{/each}}
        </section>

        <section>
            <h2>Recent alerts</h2>
            {{#if recent_alerts}}
            <table>
                <thead><tr><th>Time</th><th>Severity</th><th>Check</th><th>Title</th><th>Message</th><th>Channels</th></tr></thead>
                <tbody>
                {{#each recent_alerts}}
                    <tr>
                        <td>{{timestamp}}</td>
                        <td><span class="severity-{{class}}">{{severity}}</span></td>
                        <td>{{check_name}}</td>
                        <td>{{title}}</td>
                        <td>{{message}}</td>
                        <td>{{#if suppressed}}suppressed{{else}}{{channels}}{{/if}}</td>
                    </tr>
                {{/each}}
                </tbody>
            </table>
            {{else}}
            <p>No alerts in this period.</p>
            {{/if}}
        </section>

        <div class="footer">
            <p>Generated by Vault Sentinel</p>
        </div>
    </div>
</body>
</html>"#;

/// Builds and renders reports from the persisted logs
pub struct ReportGenerator {
    store: MonitorStore,
}

impl ReportGenerator {
    pub fn new(store: MonitorStore) -> Self {
        Self { store }
    }

    /// Aggregate the records of the last `period` ending at `now`
    pub async fn build(&self, period: ReportPeriod, now: DateTime<Utc>) -> Result<ReportData> {
        let since = now - Duration::days(period.days());
        let in_period = |ts: DateTime<Utc>| ts >= since && ts <= now;

        let alerts: Vec<Alert> = AppendLog::<Alert>::new(self.store.alert_log_path())
            .read_all()
            .await?
            .into_iter()
            .filter(|a| in_period(a.timestamp()))
            .collect();
        let metrics: Vec<MetricRecord> =
            AppendLog::<MetricRecord>::new(self.store.metrics_log_path())
                .read_all()
                .await?
                .into_iter()
                .filter(|m| in_period(m.timestamp))
                .collect();
        let cycles: Vec<CycleSummary> =
            AppendLog::<CycleSummary>::new(self.store.cycle_log_path())
                .read_all()
                .await?
                .into_iter()
                .filter(|c| in_period(c.started_at))
                .collect();

        let by_severity = Severity::ALL
            .iter()
            .map(|&severity| SeverityCount {
                severity,
                class: severity_class(severity),
                count: alerts
                    .iter()
                    .filter(|a| a.finding.severity == severity)
                    .count(),
            })
            .collect();

        let mut by_check = BTreeMap::new();
        for alert in &alerts {
            *by_check.entry(alert.finding.check_name.clone()).or_insert(0) += 1;
        }

        let average_duration_ms = if cycles.is_empty() {
            0
        } else {
            cycles.iter().map(|c| c.duration_ms).sum::<u64>() / cycles.len() as u64
        };

        // Later records win; the log is in append order
        let mut latest: BTreeMap<String, &MetricRecord> = BTreeMap::new();
        for record in &metrics {
            match latest.get(&record.check_name) {
                Some(existing) if existing.timestamp > record.timestamp => {}
                _ => {
                    latest.insert(record.check_name.clone(), record);
                }
            }
        }
        let latest_metrics = latest
            .into_values()
            .map(|record| -> Result<MetricRow> {
                Ok(MetricRow {
                    check_name: record.check_name.clone(),
                    timestamp: format_time(record.timestamp),
                    payload: serde_json::to_string_pretty(&record.payload)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut recent: Vec<&Alert> = alerts.iter().collect();
        recent.sort_by_key(|a| std::cmp::Reverse(a.timestamp()));
        let recent_alerts = recent
            .into_iter()
            .take(RECENT_ALERT_LIMIT)
            .map(|alert| AlertRow {
                timestamp: format_time(alert.timestamp()),
                severity: alert.finding.severity,
                class: severity_class(alert.finding.severity),
                check_name: alert.finding.check_name.clone(),
                title: alert.finding.title.clone(),
                message: alert.finding.message.clone(),
                channels: alert.channels_succeeded.join(", "),
                suppressed: alert.suppressed,
            })
            .collect();

        Ok(ReportData {
            period,
            generated_at: format_time(now),
            window_start: format_time(since),
            total_alerts: alerts.len(),
            suppressed_alerts: alerts.iter().filter(|a| a.suppressed).count(),
            by_severity,
            by_check,
            cycles_run: cycles.len(),
            cycles_with_failures: cycles.iter().filter(|c| c.checks_failed > 0).count(),
            average_duration_ms,
            latest_metrics,
            recent_alerts,
        })
    }

    pub fn render_markdown(&self, data: &ReportData) -> Result<String> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        Ok(handlebars.render_template(MARKDOWN_TEMPLATE, data)?)
    }

    pub fn render_html(&self, data: &ReportData) -> Result<String> {
        let handlebars = Handlebars::new();
        Ok(handlebars.render_template(HTML_TEMPLATE, data)?)
    }

    /// Build, render and write a report; returns the written paths
    pub async fn generate(
        &self,
        period: ReportPeriod,
        format: ReportFormat,
        now: DateTime<Utc>,
    ) -> Result<Vec<PathBuf>> {
        let data = self.build(period, now).await?;

        let reports_dir = self.store.reports_dir();
        tokio::fs::create_dir_all(&reports_dir)
            .await
            .map_err(|e| MonitorError::FileSystem {
                path: reports_dir.display().to_string(),
                source: e,
            })?;

        let stem = format!("{}-{}", period, now.format("%Y%m%d-%H%M%S"));
        let mut outputs = Vec::new();

        if matches!(format, ReportFormat::Markdown | ReportFormat::Both) {
            outputs.push((reports_dir.join(format!("{}.md", stem)), self.render_markdown(&data)?));
        }
        if matches!(format, ReportFormat::Html | ReportFormat::Both) {
            outputs.push((reports_dir.join(format!("{}.html", stem)), self.render_html(&data)?));
        }

        let mut written = Vec::with_capacity(outputs.len());
        for (path, contents) in outputs {
            tokio::fs::write(&path, contents)
                .await
                .map_err(|e| MonitorError::FileSystem {
                    path: path.display().to_string(),
                    source: e,
                })?;
            tracing::info!("Report written to {}", path.display());
            written.push(path);
        }

        Ok(written)
    }
}

fn severity_class(severity: Severity) -> String {
    severity.to_string().to_lowercase()
}

fn format_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
