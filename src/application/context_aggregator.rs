// Context aggregator - Flattens live entity state into a bounded text block
use crate::application::monitoring_repository::MonitoringRepository;
use crate::domain::entity::EntityRecord;
use crate::domain::telemetry::{Alarm, Reading, TelemetrySnapshot};
use std::sync::Arc;

const PLACEHOLDER: &str = "N/A";
const TRUNCATION_MARKER: &str = "\n[truncated]";
const OMITTED_MARKER: &str = "[omitted: context limit reached]";

/// Rendered context sections, in the order the composer places them
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedContext {
    pub device_information: String,
    pub problems: String,
    pub metrics: String,
}

impl AggregatedContext {
    pub fn char_count(&self) -> usize {
        self.device_information.chars().count() + self.problems.chars().count() + self.metrics.chars().count()
    }
}

#[derive(Clone)]
pub struct ContextAggregator {
    repository: Arc<dyn MonitoringRepository>,
    max_chars: usize,
}

impl ContextAggregator {
    pub fn new(repository: Arc<dyn MonitoringRepository>, max_chars: usize) -> Self {
        Self { repository, max_chars }
    }

    pub async fn aggregate(&self, entity: &EntityRecord) -> AggregatedContext {
        let snapshot = self.snapshot(entity).await;
        let context = self.render(&snapshot);
        tracing::debug!(platform_id = %entity.platform_id, chars = context.char_count(), "Aggregated context");
        context
    }

    /// Fetch attributes, readings and alarms for one entity
    pub async fn snapshot(&self, entity: &EntityRecord) -> TelemetrySnapshot {
        let id = &entity.platform_id;
        let (attributes, readings, alarms) = tokio::join!(
            self.repository.entity_attributes(id),
            self.repository.latest_readings(id),
            self.repository.active_alarms(id),
        );

        let attributes = attributes.unwrap_or_else(|e| {
            tracing::warn!(platform_id = %id, error = %e, "Error fetching attributes; using placeholders");
            Default::default()
        });
        let readings = readings
            .inspect_err(|e| tracing::warn!(platform_id = %id, error = %e, "Error fetching readings"))
            .ok();
        let alarms = alarms
            .inspect_err(|e| tracing::warn!(platform_id = %id, error = %e, "Error fetching alarms"))
            .ok();

        TelemetrySnapshot {
            entity: entity.clone(),
            attributes,
            readings,
            alarms,
        }
    }

    /// Render a snapshot, capping the total size at `max_chars`
    pub fn render(&self, snapshot: &TelemetrySnapshot) -> AggregatedContext {
        let mut remaining = self.max_chars;
        let omitted = OMITTED_MARKER.chars().count();

        // Each later section keeps room for at least the omission marker
        let device_information = bound(render_device(snapshot), &mut remaining, 2 * omitted);
        let problems = bound(render_problems(snapshot.alarms.as_deref()), &mut remaining, omitted);
        let metrics = bound(render_metrics(snapshot.readings.as_deref()), &mut remaining, 0);

        AggregatedContext {
            device_information,
            problems,
            metrics,
        }
    }
}

fn or_placeholder(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(PLACEHOLDER)
}

fn render_device(snapshot: &TelemetrySnapshot) -> String {
    let attributes = &snapshot.attributes;
    format!(
        "Device Name: {}, Platform Name: {}, Device Type: {}, Device Model: {}, Description: {}, Location: {}, Notes: {}",
        snapshot.entity.label,
        or_placeholder(attributes.name.as_deref()),
        snapshot.entity.category,
        or_placeholder(attributes.model.as_deref()),
        or_placeholder(attributes.description.as_deref()),
        or_placeholder(attributes.location.as_deref()),
        or_placeholder(attributes.notes.as_deref()),
    )
}

fn render_problems(alarms: Option<&[Alarm]>) -> String {
    let Some(alarms) = alarms else {
        return "Problem data could not be retrieved.".to_string();
    };

    let lines: Vec<String> = alarms
        .iter()
        .filter(|alarm| !alarm.is_cleared())
        .map(render_alarm)
        .collect();

    if lines.is_empty() {
        "No current problems.".to_string()
    } else {
        lines.join("\n")
    }
}

fn render_alarm(alarm: &Alarm) -> String {
    let mut line = format!("Problem: {} Severity: {}", alarm.name, alarm.severity);
    if let Some(status) = &alarm.status {
        line.push_str(&format!(" Status: {}", status));
    }
    if let Some(raised_at) = alarm.raised_at {
        line.push_str(&format!(" Since: {}", raised_at.format("%Y-%m-%d %H:%M UTC")));
    }
    if let Some(detail) = alarm.detail.as_deref().filter(|d| !d.trim().is_empty()) {
        line.push_str(&format!(" Detail: {}", detail));
    }
    for message in alarm.acknowledgement_messages() {
        line.push_str(&format!(" Detail: {}", message));
    }
    line
}

fn render_metrics(readings: Option<&[Reading]>) -> String {
    let Some(readings) = readings else {
        return "Readings could not be retrieved.".to_string();
    };
    if readings.is_empty() {
        return "No readings available.".to_string();
    }

    readings
        .iter()
        .map(|reading| match reading.description.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(description) => format!(
                "Metric Name: {}, Description: {}, Value: {}",
                reading.name, description, reading.value
            ),
            None => format!("Metric Name: {}, Value: {}", reading.name, reading.value),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fit `text` into the remaining budget minus `reserve`, truncating on a char
/// boundary. A section with no usable room is replaced by the omission marker.
fn bound(text: String, remaining: &mut usize, reserve: usize) -> String {
    let available = remaining.saturating_sub(reserve);
    let len = text.chars().count();
    if len <= available {
        *remaining -= len;
        return text;
    }

    let omitted = OMITTED_MARKER.chars().count();
    if available <= omitted {
        *remaining = remaining.saturating_sub(omitted);
        return OMITTED_MARKER.to_string();
    }

    let mut kept: String = text
        .chars()
        .take(available - TRUNCATION_MARKER.chars().count())
        .collect();
    kept.push_str(TRUNCATION_MARKER);
    *remaining -= available;
    kept
}
