// In-memory collaborators for pipeline tests
use crate::application::completion_service::{CompletionError, CompletionService};
use crate::application::monitoring_repository::{MonitoringError, MonitoringRepository};
use crate::domain::dashboard::{DashboardConfig, DashboardId, DashboardSummary};
use crate::domain::entity::{EntityKind, EntityReference, PlatformId};
use crate::domain::telemetry::{Alarm, EntityAttributes, EntityProfile, Reading};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct CallCounts {
    pub dashboards: AtomicUsize,
    pub dashboard: AtomicUsize,
    pub profile: AtomicUsize,
    pub readings: AtomicUsize,
    pub attributes: AtomicUsize,
    pub alarms: AtomicUsize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        [
            &self.dashboards,
            &self.dashboard,
            &self.profile,
            &self.readings,
            &self.attributes,
            &self.alarms,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }

    /// Calls made on behalf of context aggregation only
    pub fn aggregation(&self) -> usize {
        self.attributes.load(Ordering::SeqCst) + self.alarms.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct StubRepository {
    pub dashboards: Vec<DashboardSummary>,
    pub configs: HashMap<String, DashboardConfig>,
    pub profiles: HashMap<String, EntityProfile>,
    pub readings: HashMap<String, Vec<Reading>>,
    pub attributes: HashMap<String, EntityAttributes>,
    pub alarms: HashMap<String, Vec<Alarm>>,
    pub failing: HashSet<String>,
    pub calls: CallCounts,
}

impl StubRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device with a title attribute, category and readings
    pub fn with_device(mut self, id: &str, title: &str, category: &str, readings: &[(&str, &str)]) -> Self {
        self.profiles.insert(
            id.to_string(),
            EntityProfile {
                title: Some(title.to_string()),
                category: Some(category.to_string()),
                name: Some(format!("dev-{}", id)),
            },
        );
        self.readings.insert(
            id.to_string(),
            readings
                .iter()
                .map(|(name, value)| Reading::new(name.to_string(), None, value.to_string()))
                .collect(),
        );
        self
    }

    /// Registers a dashboard whose aliases point at the given device ids
    pub fn with_dashboard(mut self, id: &str, title: &str, device_ids: &[&str]) -> Self {
        let references = device_ids
            .iter()
            .map(|d| EntityReference::new(None, EntityKind::Device, vec![PlatformId::new(*d)]))
            .collect();
        self.configs.insert(
            id.to_string(),
            DashboardConfig::new(DashboardId::new(id), title.to_string(), references),
        );
        self
    }

    pub fn with_alarms(mut self, id: &str, alarms: Vec<Alarm>) -> Self {
        self.alarms.insert(id.to_string(), alarms);
        self
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    fn check(&self, id: &str) -> Result<(), MonitoringError> {
        if self.failing.contains(id) {
            return Err(MonitoringError::Transport(format!("connection reset fetching {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl MonitoringRepository for StubRepository {
    async fn list_dashboards(&self) -> Result<Vec<DashboardSummary>, MonitoringError> {
        self.calls.dashboards.fetch_add(1, Ordering::SeqCst);
        Ok(self.dashboards.clone())
    }

    async fn dashboard(&self, id: &DashboardId) -> Result<DashboardConfig, MonitoringError> {
        self.calls.dashboard.fetch_add(1, Ordering::SeqCst);
        self.check(id.as_str())?;
        self.configs
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| MonitoringError::NotFound(format!("dashboard {}", id)))
    }

    async fn entity_profile(&self, id: &PlatformId) -> Result<EntityProfile, MonitoringError> {
        self.calls.profile.fetch_add(1, Ordering::SeqCst);
        self.check(id.as_str())?;
        self.profiles
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| MonitoringError::NotFound(format!("entity {}", id)))
    }

    async fn latest_readings(&self, id: &PlatformId) -> Result<Vec<Reading>, MonitoringError> {
        self.calls.readings.fetch_add(1, Ordering::SeqCst);
        self.check(id.as_str())?;
        Ok(self.readings.get(id.as_str()).cloned().unwrap_or_default())
    }

    async fn entity_attributes(&self, id: &PlatformId) -> Result<EntityAttributes, MonitoringError> {
        self.calls.attributes.fetch_add(1, Ordering::SeqCst);
        self.check(id.as_str())?;
        Ok(self.attributes.get(id.as_str()).cloned().unwrap_or_default())
    }

    async fn active_alarms(&self, id: &PlatformId) -> Result<Vec<Alarm>, MonitoringError> {
        self.calls.alarms.fetch_add(1, Ordering::SeqCst);
        self.check(id.as_str())?;
        Ok(self.alarms.get(id.as_str()).cloned().unwrap_or_default())
    }
}

type Responder = Box<dyn Fn(&str) -> Result<String, CompletionError> + Send + Sync>;

/// Completion stub answering from a closure over the prompt and recording
/// every (persona, prompt) pair it receives
pub struct StubCompletion {
    responder: Responder,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl StubCompletion {
    pub fn new(responder: impl Fn(&str) -> Result<String, CompletionError> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(answer: &str) -> Self {
        let answer = answer.to_string();
        Self::new(move |_| Ok(answer.clone()))
    }

    pub fn failing() -> Self {
        Self::new(|_| Err(CompletionError::Transport("quota exceeded".to_string())))
    }

    pub fn recorded(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for StubCompletion {
    async fn complete(&self, persona: &str, prompt: &str) -> Result<String, CompletionError> {
        self.prompts
            .lock()
            .unwrap()
            .push((persona.to_string(), prompt.to_string()));
        (self.responder)(prompt)
    }
}
