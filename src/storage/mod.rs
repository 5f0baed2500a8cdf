pub mod http;
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::CertificateResult;
use crate::models::{Certificate, CertificateFilter, Event, EventParticipant, NewCertificate, NewPreset, Preset, User};

pub use http::HttpDataService;
pub use memory::InMemoryDataService;

/// Remote store of users, events, certificates and presets.
#[async_trait]
pub trait DataService: Send + Sync {
    async fn fetch_users(&self) -> CertificateResult<Vec<User>>;

    async fn fetch_events(&self) -> CertificateResult<Vec<Event>>;

    async fn fetch_event_participants(&self, event_id: &str) -> CertificateResult<Vec<EventParticipant>>;

    async fn fetch_certificates(&self, filter: &CertificateFilter) -> CertificateResult<Vec<Certificate>>;

    /// Persists one chunk and returns the stored records in the same order.
    async fn create_certificates(&self, chunk: Vec<NewCertificate>) -> CertificateResult<Vec<Certificate>>;

    async fn list_presets(&self) -> CertificateResult<Vec<Preset>>;

    async fn save_preset(&self, preset: NewPreset) -> CertificateResult<Preset>;

    async fn delete_preset(&self, id: Uuid) -> CertificateResult<()>;
}
