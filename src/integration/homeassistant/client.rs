//! Home Assistant Client.
//! This client is the higher level API client for Home Assistant.

use super::Result;
use super::http_client::HttpClient;
use super::schemas::StateCreateOrUpdate;
use reqwest::Url;

pub struct Client {
    http: HttpClient,
}

impl Client {
    /// Creates a new instance of `Client`.
    pub fn new(url: Url, token: String) -> Result<Self> {
        let http = HttpClient::new(url, token)?;
        Ok(Client { http })
    }

    /// Check that Home Assistant is reachable and accepts the token.
    pub async fn check_api(&self) -> Result<()> {
        let status = self.http.get_api_status().await?;
        log::info!("Home Assistant API: {}", status.message);
        Ok(())
    }

    /// Set the state of an entity in Home Assistant.
    pub async fn set_entity_state(
        &self,
        entity_id: &str,
        state: &StateCreateOrUpdate,
    ) -> Result<()> {
        self.http.post_state(entity_id, state).await
    }
}
