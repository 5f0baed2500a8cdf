use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use super::DataService;
use crate::core::{CertificateError, CertificateResult};
use crate::models::{Certificate, CertificateFilter, Event, EventParticipant, NewCertificate, NewPreset, Preset, User};

/// REST client for the EduCheck data service.
pub struct HttpDataService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDataService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CertificateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(persistence)?;
        Ok(HttpDataService {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> CertificateResult<T> {
        self.client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(persistence)?
            .json()
            .await
            .map_err(persistence)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> CertificateResult<T> {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(persistence)?
            .json()
            .await
            .map_err(persistence)
    }
}

fn persistence(error: reqwest::Error) -> CertificateError {
    CertificateError::Persistence(error.to_string())
}

#[async_trait]
impl DataService for HttpDataService {
    async fn fetch_users(&self) -> CertificateResult<Vec<User>> {
        self.get_json("users", &[]).await
    }

    async fn fetch_events(&self) -> CertificateResult<Vec<Event>> {
        self.get_json("events", &[]).await
    }

    async fn fetch_event_participants(&self, event_id: &str) -> CertificateResult<Vec<EventParticipant>> {
        self.get_json(&format!("events/{}/participants", event_id), &[]).await
    }

    async fn fetch_certificates(&self, filter: &CertificateFilter) -> CertificateResult<Vec<Certificate>> {
        let mut query = Vec::new();
        if let Some(recipient_id) = &filter.recipient_id {
            query.push(("recipientId", recipient_id.as_str()));
        }
        if let Some(event_id) = &filter.event_id {
            query.push(("eventId", event_id.as_str()));
        }
        self.get_json("certificates", &query).await
    }

    async fn create_certificates(&self, chunk: Vec<NewCertificate>) -> CertificateResult<Vec<Certificate>> {
        let created: Vec<Certificate> = self.post_json("certificates", &chunk).await?;
        if created.len() != chunk.len() {
            return Err(CertificateError::Persistence(format!(
                "Data service stored {} of {} certificates",
                created.len(),
                chunk.len()
            )));
        }
        Ok(created)
    }

    async fn list_presets(&self) -> CertificateResult<Vec<Preset>> {
        self.get_json("presets", &[]).await
    }

    async fn save_preset(&self, preset: NewPreset) -> CertificateResult<Preset> {
        self.post_json("presets", &preset).await
    }

    async fn delete_preset(&self, id: Uuid) -> CertificateResult<()> {
        self.client
            .delete(self.url(&format!("presets/{}", id)))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(persistence)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_onto_the_base_url() {
        let service = HttpDataService::new("https://api.educheck.local/v1/", Duration::from_secs(5)).unwrap();
        assert_eq!(service.url("/presets"), "https://api.educheck.local/v1/presets");
        assert_eq!(service.url("events/7/participants"), "https://api.educheck.local/v1/events/7/participants");
    }

    #[tokio::test]
    async fn unreachable_service_is_a_persistence_error() {
        let service = HttpDataService::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        match service.fetch_users().await {
            Err(CertificateError::Persistence(_)) => {}
            other => panic!("unexpected {:?}", other.map(|u| u.len())),
        }
    }
}
