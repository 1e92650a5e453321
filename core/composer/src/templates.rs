use health_insight_schemas::{BriefingStyle, DailyBriefing, Measurement, Metric};

/// Template renderer for daily briefings
pub struct TemplateRenderer;

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render the briefing text in its own style
    pub fn render(&self, briefing: &DailyBriefing) -> String {
        match briefing.style {
            BriefingStyle::Short => self.render_short(briefing),
            BriefingStyle::Standard => self.render_standard(briefing),
            BriefingStyle::Detailed => self.render_detailed(briefing),
        }
    }

    fn render_short(&self, briefing: &DailyBriefing) -> String {
        let mut parts = vec![format!("{}: {}", briefing.date, self.active_flags(briefing))];

        if let Some(best) = briefing.similar.first() {
            parts.push(format!(
                "Closest match {} ({} shared)",
                best.date, best.score
            ));
        }

        parts.join(". ")
    }

    fn render_standard(&self, briefing: &DailyBriefing) -> String {
        let mut lines = vec![format!("Daily briefing for {}", briefing.date)];

        let metrics: Vec<String> = Metric::ALL
            .iter()
            .filter_map(|metric| {
                briefing
                    .record
                    .metric(metric.field())
                    .map(|value| format!("{}={}", metric, value))
            })
            .collect();
        if metrics.is_empty() {
            lines.push("• Metrics: none recorded".to_string());
        } else {
            lines.push(format!("• Metrics: {}", metrics.join(", ")));
        }

        lines.push(format!("• Flags: {}", self.active_flags(briefing)));

        let similar: Vec<String> = briefing
            .similar
            .iter()
            .map(|r| format!("{} ({})", r.date, r.score))
            .collect();
        if !similar.is_empty() {
            lines.push(format!("• Similar days: {}", similar.join(", ")));
        }

        let averages: Vec<String> = Metric::ALL
            .iter()
            .map(|metric| {
                format!(
                    "{} {}",
                    metric,
                    format_measurement(&briefing.patterns.average(*metric))
                )
            })
            .collect();
        lines.push(format!(
            "• Averages over {} days: {}",
            briefing.patterns.day_count,
            averages.join(", ")
        ));

        for event in &briefing.events {
            if event.tags.is_empty() {
                lines.push(format!("• Note: {}", event.body));
            } else {
                lines.push(format!("• Note [{}]: {}", event.tags.join(", "), event.body));
            }
        }

        lines.join("\n")
    }

    fn render_detailed(&self, briefing: &DailyBriefing) -> String {
        let mut lines = vec![
            format!("# Daily Briefing: {}", briefing.date),
            "\n## Today".to_string(),
        ];

        for metric in Metric::ALL {
            let value = briefing
                .record
                .metric(metric.field())
                .map(|v| v.to_string())
                .unwrap_or_else(|| "n/a".to_string());
            lines.push(format!("- {}: {}", metric, value));
        }
        lines.push(format!("- Flags: {}", self.active_flags(briefing)));

        if !briefing.similar.is_empty() {
            lines.push("\n## Similar Days".to_string());
            for result in &briefing.similar {
                let shared: Vec<&str> = result.shared.iter().map(|f| f.as_str()).collect();
                lines.push(format!(
                    "- {} (score {}): {}",
                    result.date,
                    result.score,
                    shared.join(", ")
                ));
            }
        }

        let patterns = &briefing.patterns;
        lines.push(format!("\n## Global Patterns ({} days)", patterns.day_count));
        for metric in Metric::ALL {
            lines.push(format!(
                "- Average {}: {}",
                metric,
                format_measurement(&patterns.average(metric))
            ));
        }
        lines.push(format!(
            "- Caffeine hour vs sleep correlation: {}",
            format_measurement(&patterns.caffeine_sleep_correlation)
        ));

        let triggers: Vec<String> = patterns
            .top_triggers(3)
            .into_iter()
            .map(|(flag, count)| format!("{} {}/{}", flag, count, patterns.high_stress_days))
            .collect();
        if triggers.is_empty() {
            lines.push("- Stress triggers: none".to_string());
        } else {
            lines.push(format!("- Stress triggers: {}", triggers.join(", ")));
        }

        if !briefing.events.is_empty() {
            lines.push("\n## Notes".to_string());
            for event in &briefing.events {
                lines.push(format!("- {}", event.body));
                if !event.tags.is_empty() {
                    lines.push(format!("  tags: {}", event.tags.join(", ")));
                }
            }
        }

        lines.join("\n")
    }

    fn active_flags(&self, briefing: &DailyBriefing) -> String {
        let active: Vec<&str> = briefing.flags.active().map(|f| f.as_str()).collect();
        if active.is_empty() {
            "no flags".to_string()
        } else {
            active.join(", ")
        }
    }
}

fn format_measurement(measurement: &Measurement) -> String {
    match measurement.value() {
        Some(value) => format!("{:.2}", value),
        None => "n/a".to_string(),
    }
}
