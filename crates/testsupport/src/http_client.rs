use anyhow::Result;
use serde_json::Value;

/// Thin wrapper over reqwest for the admin and mock-serving surfaces.
pub struct TestClient {
    base_url: String,
    client: reqwest::Client,
}

impl TestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn health(&self) -> Result<reqwest::StatusCode> {
        let resp = self
            .client
            .get(format!("{}/healthz", self.base_url))
            .send()
            .await?;
        Ok(resp.status())
    }

    /// Registers (or replaces) a prototype and returns the assigned ID.
    pub async fn create_prototype(&self, definition: &Value) -> Result<(reqwest::StatusCode, Value)> {
        let resp = self
            .client
            .post(format!("{}/v1/prototypes", self.base_url))
            .json(definition)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.json().await?;
        Ok((status, body))
    }

    pub async fn list_prototypes(&self, query: &str) -> Result<Value> {
        let url = if query.is_empty() {
            format!("{}/v1/prototypes", self.base_url)
        } else {
            format!("{}/v1/prototypes?{}", self.base_url, query)
        };
        Ok(self.client.get(url).send().await?.json().await?)
    }

    pub async fn get_prototype(&self, id: &str) -> Result<(reqwest::StatusCode, Value)> {
        let resp = self
            .client
            .get(format!("{}/v1/prototypes/{}", self.base_url, id))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.json().await?;
        Ok((status, body))
    }

    pub async fn delete_prototype(&self, id: &str) -> Result<reqwest::StatusCode> {
        let resp = self
            .client
            .delete(format!("{}/v1/prototypes/{}", self.base_url, id))
            .send()
            .await?;
        Ok(resp.status())
    }

    /// Fires a request at the mock-serving surface.
    pub async fn call_mock(
        &self,
        method: reqwest::Method,
        path_and_query: &str,
        headers: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<(reqwest::StatusCode, Value)> {
        let mut req = self
            .client
            .request(method, format!("{}/v1/mock{}", self.base_url, path_and_query));
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.json().await?;
        Ok((status, body))
    }
}
