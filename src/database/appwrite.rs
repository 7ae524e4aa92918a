//! Appwrite document database client
//!
//! Minimal REST client for the Appwrite databases API.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::database::MovieDatabase;
use crate::error::DatabaseError;
use crate::models::{SavedMovie, TrendingMovie};

#[derive(Debug, Deserialize)]
struct DocumentList<T> {
    #[serde(default = "Vec::new")]
    documents: Vec<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateDocument<'a, T> {
    document_id: &'a str,
    data: T,
}

/// One Appwrite query, serialized as the JSON string the REST API expects.
fn query(method: &str, attribute: Option<&str>, values: Value) -> String {
    let mut query = json!({ "method": method, "values": values });
    if let Some(attribute) = attribute {
        query["attribute"] = json!(attribute);
    }
    query.to_string()
}

/// Document data without Appwrite's `$` metadata fields.
fn document_data<T: Serialize>(document: &T) -> Result<Value, DatabaseError> {
    let mut value =
        serde_json::to_value(document).map_err(|e| DatabaseError::Malformed(e.to_string()))?;
    if let Some(object) = value.as_object_mut() {
        object.retain(|key, _| !key.starts_with('$'));
    }
    Ok(value)
}

// == Appwrite Database ==
/// Appwrite-backed [`MovieDatabase`].
#[derive(Debug, Clone)]
pub struct AppwriteDatabase {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: Option<String>,
    database_id: String,
    metrics_collection: String,
    saved_collection: String,
}

impl AppwriteDatabase {
    pub fn new(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        database_id: impl Into<String>,
        metrics_collection: impl Into<String>,
        saved_collection: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            api_key: None,
            database_id: database_id.into(),
            metrics_collection: metrics_collection.into(),
            saved_collection: saved_collection.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.appwrite_endpoint,
            &config.appwrite_project_id,
            &config.appwrite_database_id,
            &config.appwrite_metrics_collection_id,
            &config.appwrite_saved_collection_id,
        )
        .with_api_key(config.appwrite_api_key.clone())
    }

    /// Authenticates requests with a server API key.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    fn request(&self, method: Method, collection: &str, document_id: Option<&str>) -> RequestBuilder {
        let mut url = format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, collection
        );
        if let Some(id) = document_id {
            url.push('/');
            url.push_str(id);
        }
        debug!("{} {}", method, url);

        let mut builder = self
            .http
            .request(method, url)
            .header("X-Appwrite-Project", &self.project_id);
        if let Some(key) = &self.api_key {
            builder = builder.header("X-Appwrite-Key", key);
        }
        builder
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, DatabaseError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DatabaseError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        queries: &[String],
    ) -> Result<Vec<T>, DatabaseError> {
        let params: Vec<(&str, &str)> = queries.iter().map(|q| ("queries[]", q.as_str())).collect();
        let builder = self.request(Method::GET, collection, None).query(&params);
        let list: DocumentList<T> = self.send(builder).await?;
        Ok(list.documents)
    }

    async fn create<T: Serialize + DeserializeOwned>(
        &self,
        collection: &str,
        document: &T,
    ) -> Result<T, DatabaseError> {
        let body = CreateDocument {
            document_id: "unique()",
            data: document_data(document)?,
        };
        let builder = self.request(Method::POST, collection, None).json(&body);
        self.send(builder).await
    }
}

#[async_trait]
impl MovieDatabase for AppwriteDatabase {
    async fn find_metric(&self, movie_id: i64) -> Result<Option<TrendingMovie>, DatabaseError> {
        let queries = [query("equal", Some("movie_id"), json!([movie_id]))];
        let documents = self.list(&self.metrics_collection, &queries).await?;
        Ok(documents.into_iter().next())
    }

    async fn create_metric(&self, metric: &TrendingMovie) -> Result<TrendingMovie, DatabaseError> {
        self.create(&self.metrics_collection, metric).await
    }

    async fn update_metric_count(
        &self,
        document_id: &str,
        count: u64,
    ) -> Result<(), DatabaseError> {
        let builder = self
            .request(Method::PATCH, &self.metrics_collection, Some(document_id))
            .json(&json!({ "data": { "count": count } }));
        let _: Value = self.send(builder).await?;
        Ok(())
    }

    async fn top_metrics(&self, limit: usize) -> Result<Vec<TrendingMovie>, DatabaseError> {
        let queries = [
            query("limit", None, json!([limit])),
            query("orderDesc", Some("count"), json!([])),
        ];
        self.list(&self.metrics_collection, &queries).await
    }

    async fn find_saved(&self, movie_id: i64) -> Result<Option<SavedMovie>, DatabaseError> {
        let queries = [query("equal", Some("movie_id"), json!([movie_id]))];
        let documents = self.list(&self.saved_collection, &queries).await?;
        Ok(documents.into_iter().next())
    }

    async fn create_saved(&self, movie: &SavedMovie) -> Result<SavedMovie, DatabaseError> {
        self.create(&self.saved_collection, movie).await
    }

    async fn delete_saved(&self, document_id: &str) -> Result<(), DatabaseError> {
        let response = self
            .request(Method::DELETE, &self.saved_collection, Some(document_id))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DatabaseError::Status {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    async fn list_saved(&self) -> Result<Vec<SavedMovie>, DatabaseError> {
        let queries = [query("orderDesc", Some("$createdAt"), json!([]))];
        self.list(&self.saved_collection, &queries).await
    }
}
