// ThingsBoard repository implementation (device-telemetry deployment)
use crate::application::monitoring_repository::{MonitoringError, MonitoringRepository};
use crate::domain::dashboard::{DashboardConfig, DashboardId, DashboardSummary};
use crate::domain::entity::{EntityKind, EntityReference, PlatformId};
use crate::domain::telemetry::{Alarm, EntityAttributes, EntityProfile, Reading};
use crate::infrastructure::config::ThingsBoardSettings;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;

const DEVICE: &str = "DEVICE";

pub struct ThingsBoardRepository {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    token: Mutex<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct EntityIdPayload {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PageData<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct DashboardInfoPayload {
    id: EntityIdPayload,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DashboardPayload {
    id: EntityIdPayload,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    configuration: Option<DashboardConfiguration>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DashboardConfiguration {
    /// Keyed by alias id; ordered so catalog collisions resolve the same way every time
    #[serde(default)]
    entity_aliases: BTreeMap<String, EntityAlias>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityAlias {
    #[serde(default)]
    filter: Option<AliasFilter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AliasFilter {
    #[serde(default)]
    single_entity: Option<SingleEntity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SingleEntity {
    #[serde(default)]
    entity_type: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DevicePayload {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    device_type: Option<String>,
    #[serde(default)]
    additional_info: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct AttributeEntry {
    key: String,
    value: Value,
}

#[derive(Debug, Deserialize)]
struct TimeseriesValue {
    value: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlarmPayload {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    alarm_type: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    start_ts: Option<i64>,
    #[serde(default)]
    details: Option<Value>,
}

impl ThingsBoardRepository {
    pub fn new(settings: &ThingsBoardSettings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .context("Failed to build ThingsBoard HTTP client")?;
        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
            username: settings.username.clone(),
            password: settings.password.clone(),
            token: Mutex::new(None),
        })
    }

    async fn token(&self) -> Result<String, MonitoringError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        tracing::info!(username = %self.username, "Logging in to ThingsBoard");
        let response = self
            .http
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&serde_json::json!({
                "username": self.username,
                "password": self.password,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(MonitoringError::Auth(format!("login rejected with status {}", status)));
        }

        let login = response
            .json::<LoginResponse>()
            .await
            .map_err(|e| MonitoringError::Malformed(e.to_string()))?;
        *cached = Some(login.token.clone());
        Ok(login.token)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, MonitoringError> {
        let token = self.token().await?;
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header("X-Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            // Expired session; the next call logs in again
            self.token.lock().await.take();
            return Err(MonitoringError::Auth("session token rejected".to_string()));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MonitoringError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MonitoringError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| MonitoringError::Malformed(e.to_string()))
    }

    async fn attributes(&self, id: &PlatformId) -> Result<Vec<AttributeEntry>, MonitoringError> {
        self.get_json(&format!(
            "/api/plugins/telemetry/{}/{}/values/attributes",
            DEVICE,
            urlencoding::encode(id.as_str())
        ))
        .await
    }

    async fn device(&self, id: &PlatformId) -> Result<DevicePayload, MonitoringError> {
        self.get_json(&format!("/api/device/{}", urlencoding::encode(id.as_str())))
            .await
    }
}

/// Render a JSON scalar the way it would be displayed; null becomes None
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn attribute(entries: &[AttributeEntry], key: &str) -> Option<String> {
    entries
        .iter()
        .find(|entry| entry.key == key)
        .and_then(|entry| value_text(&entry.value))
}

fn references_from(configuration: Option<DashboardConfiguration>) -> Vec<EntityReference> {
    let Some(configuration) = configuration else {
        return Vec::new();
    };

    configuration
        .entity_aliases
        .into_values()
        .filter_map(|alias| alias.filter?.single_entity)
        .map(|entity| {
            let kind = match entity.entity_type.as_deref() {
                Some(DEVICE) => EntityKind::Device,
                _ => EntityKind::Other,
            };
            let ids = entity.id.map(PlatformId::new).into_iter().collect();
            EntityReference::new(None, kind, ids)
        })
        .collect()
}

fn alarm_from(payload: AlarmPayload) -> Alarm {
    let name = payload
        .name
        .or(payload.alarm_type)
        .unwrap_or_else(|| "Unnamed alarm".to_string());
    let mut alarm = Alarm::new(name, payload.severity.unwrap_or_else(|| "N/A".to_string()));
    alarm.status = payload.status;
    alarm.raised_at = payload.start_ts.and_then(DateTime::<Utc>::from_timestamp_millis);
    alarm.detail = payload.details.as_ref().and_then(|details| match details {
        Value::Object(map) if map.is_empty() => None,
        other => value_text(other),
    });
    alarm
}

#[async_trait]
impl MonitoringRepository for ThingsBoardRepository {
    async fn list_dashboards(&self) -> Result<Vec<DashboardSummary>, MonitoringError> {
        let page: PageData<DashboardInfoPayload> = self.get_json("/api/user/dashboards?pageSize=100&page=0").await?;
        Ok(page
            .data
            .into_iter()
            .map(|d| {
                let title = d.title.unwrap_or_else(|| d.id.id.clone());
                DashboardSummary::new(DashboardId::new(d.id.id), title)
            })
            .collect())
    }

    async fn dashboard(&self, id: &DashboardId) -> Result<DashboardConfig, MonitoringError> {
        let payload: DashboardPayload = self
            .get_json(&format!("/api/dashboard/{}", urlencoding::encode(id.as_str())))
            .await?;

        let title = payload.title.unwrap_or_else(|| payload.id.id.clone());
        let references = references_from(payload.configuration);
        tracing::debug!(dashboard_id = %id, "Dashboard has {} entity aliases", references.len());
        Ok(DashboardConfig::new(DashboardId::new(payload.id.id), title, references))
    }

    async fn entity_profile(&self, id: &PlatformId) -> Result<EntityProfile, MonitoringError> {
        let attributes = self.attributes(id).await?;
        let device = self.device(id).await?;
        Ok(EntityProfile {
            title: attribute(&attributes, "title"),
            category: device.device_type,
            name: device.name,
        })
    }

    async fn latest_readings(&self, id: &PlatformId) -> Result<Vec<Reading>, MonitoringError> {
        let series: BTreeMap<String, Vec<TimeseriesValue>> = self
            .get_json(&format!(
                "/api/plugins/telemetry/{}/{}/values/timeseries",
                DEVICE,
                urlencoding::encode(id.as_str())
            ))
            .await?;

        Ok(series
            .into_iter()
            .filter_map(|(key, values)| {
                let value = values.first().and_then(|v| value_text(&v.value))?;
                Some(Reading::new(key, None, value))
            })
            .collect())
    }

    async fn entity_attributes(&self, id: &PlatformId) -> Result<EntityAttributes, MonitoringError> {
        let attributes = self.attributes(id).await?;
        let device = self.device(id).await?;
        let description = attribute(&attributes, "description").or_else(|| {
            device
                .additional_info
                .as_ref()
                .and_then(|info| info.get("description"))
                .and_then(value_text)
        });

        Ok(EntityAttributes {
            name: device.name,
            model: attribute(&attributes, "model"),
            location: attribute(&attributes, "location"),
            description,
            notes: attribute(&attributes, "notes"),
        })
    }

    async fn active_alarms(&self, id: &PlatformId) -> Result<Vec<Alarm>, MonitoringError> {
        let page: PageData<AlarmPayload> = self
            .get_json(&format!(
                "/api/alarm/{}/{}?searchStatus=ACTIVE&pageSize=100&page=0",
                DEVICE,
                urlencoding::encode(id.as_str())
            ))
            .await?;
        Ok(page.data.into_iter().map(alarm_from).collect())
    }
}
