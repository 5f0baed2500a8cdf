use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::DataService;
use crate::core::CertificateResult;
use crate::models::{Certificate, CertificateFilter, Event, EventParticipant, NewCertificate, NewPreset, Preset, User};

#[derive(Default)]
struct Store {
    users: Vec<User>,
    events: Vec<Event>,
    participants: Vec<EventParticipant>,
    certificates: Vec<Certificate>,
    presets: Vec<Preset>,
}

/// Process-local data service for demos and tests.
#[derive(Default)]
pub struct InMemoryDataService {
    store: RwLock<Store>,
}

impl InMemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(self, users: Vec<User>) -> Self {
        let mut store = self.store.into_inner();
        store.users = users;
        InMemoryDataService {
            store: RwLock::new(store),
        }
    }

    pub fn with_events(self, events: Vec<Event>) -> Self {
        let mut store = self.store.into_inner();
        store.events = events;
        InMemoryDataService {
            store: RwLock::new(store),
        }
    }

    pub async fn insert_user(&self, user: User) {
        self.store.write().await.users.push(user);
    }

    pub async fn insert_participant(&self, participant: EventParticipant) {
        self.store.write().await.participants.push(participant);
    }
}

#[async_trait]
impl DataService for InMemoryDataService {
    async fn fetch_users(&self) -> CertificateResult<Vec<User>> {
        Ok(self.store.read().await.users.clone())
    }

    async fn fetch_events(&self) -> CertificateResult<Vec<Event>> {
        Ok(self.store.read().await.events.clone())
    }

    async fn fetch_event_participants(&self, event_id: &str) -> CertificateResult<Vec<EventParticipant>> {
        let store = self.store.read().await;
        Ok(store
            .participants
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn fetch_certificates(&self, filter: &CertificateFilter) -> CertificateResult<Vec<Certificate>> {
        let store = self.store.read().await;
        Ok(store
            .certificates
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn create_certificates(&self, chunk: Vec<NewCertificate>) -> CertificateResult<Vec<Certificate>> {
        let now = Utc::now();
        let created: Vec<Certificate> = chunk.into_iter().map(|c| c.into_certificate(now)).collect();
        self.store.write().await.certificates.extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_presets(&self) -> CertificateResult<Vec<Preset>> {
        Ok(self.store.read().await.presets.clone())
    }

    async fn save_preset(&self, preset: NewPreset) -> CertificateResult<Preset> {
        let preset = preset.into_preset();
        self.store.write().await.presets.push(preset.clone());
        Ok(preset)
    }

    async fn delete_preset(&self, id: Uuid) -> CertificateResult<()> {
        let mut store = self.store.write().await;
        let before = store.presets.len();
        store.presets.retain(|p| p.id != id);
        if store.presets.len() == before {
            tracing::debug!(preset_id = %id, "Preset already absent");
        }
        Ok(())
    }
}
