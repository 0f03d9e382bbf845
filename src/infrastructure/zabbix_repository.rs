// Zabbix repository implementation (network-management deployment)
use crate::application::monitoring_repository::{MonitoringError, MonitoringRepository};
use crate::domain::dashboard::{DashboardConfig, DashboardId, DashboardSummary};
use crate::domain::entity::{EntityKind, EntityReference, PlatformId};
use crate::domain::telemetry::{Acknowledgement, Alarm, EntityAttributes, EntityProfile, Reading};
use crate::infrastructure::config::ZabbixSettings;
use anyhow::Context;
use async_trait::async_trait;
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const HOST_FIELD_PREFIX: &str = "hostid";
const DEFAULT_HOST_CATEGORY: &str = "host";

#[derive(Debug, Clone)]
pub struct ZabbixRepository {
    http: reqwest::Client,
    url: String,
    api_token: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    message: String,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DashboardPayload {
    dashboardid: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    pages: Vec<PagePayload>,
}

#[derive(Debug, Deserialize)]
struct PagePayload {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    widgets: Vec<WidgetPayload>,
}

#[derive(Debug, Deserialize)]
struct WidgetPayload {
    #[serde(default)]
    fields: Vec<FieldPayload>,
}

#[derive(Debug, Deserialize)]
struct FieldPayload {
    name: String,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct HostPayload {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    /// An object, or an empty array when inventory is disabled for the host
    #[serde(default)]
    inventory: Value,
    #[serde(default)]
    items: Vec<ItemPayload>,
}

#[derive(Debug, Deserialize)]
struct ItemPayload {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    name_resolved: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    lastvalue: Option<String>,
    #[serde(default)]
    units: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProblemPayload {
    name: String,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    clock: Option<String>,
    #[serde(default)]
    acknowledged: Option<String>,
    #[serde(default)]
    opdata: Option<String>,
    #[serde(default)]
    acknowledges: Vec<AcknowledgePayload>,
}

#[derive(Debug, Deserialize)]
struct AcknowledgePayload {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    new_severity: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ZabbixRepository {
    pub fn new(settings: &ZabbixSettings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .context("Failed to build Zabbix HTTP client")?;
        Ok(Self {
            http,
            url: settings.url.clone(),
            api_token: settings.api_token.clone(),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, MonitoringError> {
        tracing::debug!(%method, "Zabbix JSON-RPC call");
        let response = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json-rpc")
            .bearer_auth(&self.api_token)
            .json(&json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": 1,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MonitoringError::Status { status, body });
        }

        let data = response
            .json::<RpcResponse<T>>()
            .await
            .map_err(|e| MonitoringError::Malformed(e.to_string()))?;

        if let Some(error) = data.error {
            let detail = error.data.unwrap_or_default();
            return Err(MonitoringError::Api(format!("{} {}", error.message, detail).trim().to_string()));
        }
        data.result
            .ok_or_else(|| MonitoringError::Malformed(format!("{} returned no result", method)))
    }

    async fn host(&self, id: &PlatformId) -> Result<HostPayload, MonitoringError> {
        let hosts: Vec<HostPayload> = self
            .call(
                "host.get",
                json!({
                    "output": "extend",
                    "hostids": [id.as_str()],
                    "selectItems": "extend",
                    "selectInventory": "extend",
                }),
            )
            .await?;
        hosts
            .into_iter()
            .next()
            .ok_or_else(|| MonitoringError::NotFound(format!("host {}", id)))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn inventory_field(inventory: &Value, key: &str) -> Option<String> {
    non_blank(inventory.get(key).and_then(Value::as_str).map(str::to_string))
}

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One reference per page, carrying every distinct host id its widgets point at
fn references_from(pages: Vec<PagePayload>) -> Vec<EntityReference> {
    pages
        .into_iter()
        .map(|page| {
            let mut ids: Vec<PlatformId> = Vec::new();
            let host_values = page
                .widgets
                .iter()
                .flat_map(|widget| widget.fields.iter())
                .filter(|field| field.name.starts_with(HOST_FIELD_PREFIX))
                .filter_map(|field| field_text(&field.value));
            for value in host_values {
                let id = PlatformId::new(value);
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            EntityReference::new(non_blank(page.name), EntityKind::Host, ids)
        })
        .collect()
}

fn severity_name(code: Option<&str>) -> String {
    match code {
        Some("0") => "Not classified",
        Some("1") => "Information",
        Some("2") => "Warning",
        Some("3") => "Average",
        Some("4") => "High",
        Some("5") => "Disaster",
        _ => "N/A",
    }
    .to_string()
}

fn alarm_from(problem: ProblemPayload) -> Alarm {
    let mut alarm = Alarm::new(problem.name, severity_name(problem.severity.as_deref()));
    alarm.status = Some(
        match problem.acknowledged.as_deref() {
            Some("1") => "acknowledged",
            _ => "unacknowledged",
        }
        .to_string(),
    );
    alarm.raised_at = problem
        .clock
        .and_then(|clock| clock.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0));
    alarm.detail = non_blank(problem.opdata);
    alarm.acknowledgements = problem
        .acknowledges
        .into_iter()
        .map(|ack| {
            Acknowledgement::new(
                ack.action.and_then(|a| a.parse().ok()).unwrap_or(0),
                ack.new_severity.and_then(|s| s.parse().ok()).unwrap_or(0),
                non_blank(ack.message),
            )
        })
        .collect();
    alarm
}

#[async_trait]
impl MonitoringRepository for ZabbixRepository {
    async fn list_dashboards(&self) -> Result<Vec<DashboardSummary>, MonitoringError> {
        let dashboards: Vec<DashboardPayload> = self
            .call("dashboard.get", json!({ "output": ["dashboardid", "name"] }))
            .await?;
        Ok(dashboards
            .into_iter()
            .map(|d| {
                let title = d.name.unwrap_or_else(|| d.dashboardid.clone());
                DashboardSummary::new(DashboardId::new(d.dashboardid), title)
            })
            .collect())
    }

    async fn dashboard(&self, id: &DashboardId) -> Result<DashboardConfig, MonitoringError> {
        let dashboards: Vec<DashboardPayload> = self
            .call(
                "dashboard.get",
                json!({
                    "output": "extend",
                    "dashboardids": [id.as_str()],
                    "selectPages": "extend",
                }),
            )
            .await?;

        let dashboard = dashboards
            .into_iter()
            .next()
            .ok_or_else(|| MonitoringError::NotFound(format!("dashboard {}", id)))?;
        let title = dashboard.name.unwrap_or_else(|| dashboard.dashboardid.clone());
        Ok(DashboardConfig::new(
            DashboardId::new(dashboard.dashboardid),
            title,
            references_from(dashboard.pages),
        ))
    }

    async fn entity_profile(&self, id: &PlatformId) -> Result<EntityProfile, MonitoringError> {
        let host = self.host(id).await?;
        Ok(EntityProfile {
            title: non_blank(host.name).or_else(|| non_blank(host.host.clone())),
            category: inventory_field(&host.inventory, "type").or_else(|| Some(DEFAULT_HOST_CATEGORY.to_string())),
            name: host.host,
        })
    }

    async fn latest_readings(&self, id: &PlatformId) -> Result<Vec<Reading>, MonitoringError> {
        let host = self.host(id).await?;
        Ok(host
            .items
            .into_iter()
            .filter_map(|item| {
                let name = non_blank(item.name_resolved).or(non_blank(item.name))?;
                let value = item.lastvalue?;
                let value = match non_blank(item.units) {
                    Some(units) => format!("{} {}", value, units),
                    None => value,
                };
                Some(Reading::new(name, non_blank(item.description), value))
            })
            .collect())
    }

    async fn entity_attributes(&self, id: &PlatformId) -> Result<EntityAttributes, MonitoringError> {
        let host = self.host(id).await?;
        Ok(EntityAttributes {
            name: inventory_field(&host.inventory, "name"),
            model: inventory_field(&host.inventory, "model"),
            location: inventory_field(&host.inventory, "location"),
            description: non_blank(host.description),
            notes: inventory_field(&host.inventory, "notes"),
        })
    }

    async fn active_alarms(&self, id: &PlatformId) -> Result<Vec<Alarm>, MonitoringError> {
        let problems: Vec<ProblemPayload> = self
            .call(
                "problem.get",
                json!({
                    "output": "extend",
                    "hostids": [id.as_str()],
                    "selectAcknowledges": "extend",
                    "sortfield": ["eventid"],
                    "sortorder": "DESC",
                }),
            )
            .await?;
        Ok(problems.into_iter().map(alarm_from).collect())
    }
}
