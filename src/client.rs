use crate::config::PanelsConfig;
use crate::error::{PanelError, Result};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Thin JSON/text client for the panel endpoints
#[derive(Clone)]
pub struct PanelClient {
    server_url: String,
    client: reqwest::Client,
}

impl PanelClient {
    /// Create a new client for the configured server
    pub fn new(config: &PanelsConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(PanelClient {
            server_url: config.server_url.clone(),
            client,
        })
    }

    /// Absolute URL for a server path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    /// GET a path and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let body = read_success_body(response).await?;

        Ok(serde_json::from_str(&body)?)
    }

    /// POST a JSON body and decode the JSON reply
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        let body = read_success_body(response).await?;

        Ok(serde_json::from_str(&body)?)
    }

    /// GET a path and return the raw text body
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        read_success_body(response).await
    }
}

/// Read the body, turning any non-2xx status into `PanelError::Status`
async fn read_success_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(PanelError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.text().await?)
}
