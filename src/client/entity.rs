use serde_json::{Map, Value};

use crate::types::encode_path_segment;

use super::engine::{ApiClient, RequestOptions};
use super::error::{ClientError, ClientResult};

/// CRUD helpers for one resource, addressed by its remapped path.
#[derive(Clone)]
pub struct EntityApi {
    client: ApiClient,
    resource: String,
    path: String,
}

impl ApiClient {
    pub fn entity(&self, resource: &str) -> EntityApi {
        EntityApi {
            client: self.clone(),
            resource: resource.to_string(),
            path: self.config().resource_path(resource),
        }
    }
}

impl EntityApi {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// `sort` is a column name, optionally prefixed with `-` for descending.
    pub async fn list(&self, sort: Option<&str>) -> ClientResult<Value> {
        self.filter(Map::new(), sort).await
    }

    pub async fn filter(&self, criteria: Map<String, Value>, sort: Option<&str>) -> ClientResult<Value> {
        let mut options = RequestOptions { query: criteria, ..RequestOptions::default() };
        if let Some(sort) = sort {
            options = options.query("sort", sort);
        }
        self.client.get(&self.path, options).await
    }

    /// Array of zero or one rows.
    pub async fn get(&self, id: &str) -> ClientResult<Value> {
        let path = self.record_path("get", id)?;
        self.client.get(&path, RequestOptions::default()).await
    }

    pub async fn create(&self, payload: Value) -> ClientResult<Value> {
        self.client.post(&self.path, RequestOptions::default().body(payload)).await
    }

    pub async fn update(&self, id: &str, payload: Value) -> ClientResult<Value> {
        let path = self.record_path("update", id)?;
        self.client.put(&path, RequestOptions::default().body(payload)).await
    }

    pub async fn delete(&self, id: &str) -> ClientResult<Value> {
        let path = self.record_path("delete", id)?;
        self.client.delete(&path, RequestOptions::default()).await
    }

    fn record_path(&self, operation: &'static str, id: &str) -> ClientResult<String> {
        if id.trim().is_empty() {
            return Err(ClientError::MissingId {
                operation,
                resource: self.resource.clone(),
            });
        }
        Ok(format!("{}/{}", self.path, encode_path_segment(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;

    fn api(resource: &str) -> EntityApi {
        let mut config = ClientConfig::new("http://localhost:3000/api");
        config.resource_map.insert("quotes".into(), "orcamentos".into());
        ApiClient::new(config).unwrap().entity(resource)
    }

    #[test]
    fn resource_names_are_remapped() {
        assert_eq!(api("quotes").path(), "/orcamentos");
        assert_eq!(api("vehicles").path(), "/vehicles");
    }

    #[tokio::test]
    async fn blank_ids_fail_before_any_request() {
        let err = api("quotes").update("", serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "update requires a valid id for quotes");
        let err = api("quotes").delete("  ").await.unwrap_err();
        assert!(matches!(err, ClientError::MissingId { operation: "delete", .. }));
    }

    #[test]
    fn record_ids_are_encoded_as_path_segments() {
        let quotes = api("quotes");
        assert_eq!(quotes.record_path("get", "q 1").unwrap(), "/orcamentos/q%201");
        assert_eq!(quotes.record_path("get", "a/b").unwrap(), "/orcamentos/a%2Fb");
    }
}
