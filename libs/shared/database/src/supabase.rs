use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, Response,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::store::{document_id, DocumentQuery, DocumentStore, ID_FIELD};

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.anon_key))?,
        );

        Ok(headers)
    }

    async fn send(&self, method: Method, path: &str,
                  body: Option<Value>, extra_headers: Option<HeaderMap>)
                  -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        Ok(response)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         body: Option<Value>, extra_headers: Option<HeaderMap>)
                                         -> Result<T>
    where T: DeserializeOwned {
        let response = self.send(method, path, body, extra_headers).await?;
        let data = response.json::<T>().await?;
        Ok(data)
    }

    fn return_representation() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    fn collection_path(collection: &str) -> String {
        format!("/rest/v1/{}", collection)
    }

    fn document_path(collection: &str, id: &str) -> String {
        format!("/rest/v1/{}?id=eq.{}", collection, urlencoding::encode(id))
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

/// PostgREST may hand back integer keys; the rest of the system treats ids as strings.
fn normalize_id(mut document: Value) -> Value {
    if let Some(id) = document_id(&document) {
        if let Value::Object(fields) = &mut document {
            fields.insert(ID_FIELD.to_string(), Value::String(id));
        }
    }
    document
}

#[async_trait]
impl DocumentStore for SupabaseClient {
    async fn insert(&self, collection: &str, document: Value) -> Result<String> {
        let result: Vec<Value> = self.request_with_headers(
            Method::POST,
            &Self::collection_path(collection),
            Some(document),
            Some(Self::return_representation()),
        ).await?;

        let created = result
            .first()
            .ok_or_else(|| anyhow!("Insert into {} returned no representation", collection))?;

        let id = document_id(created)
            .ok_or_else(|| anyhow!("Insert into {} returned a row without an id", collection))?;

        info!("Created {} document {}", collection, id);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let result: Vec<Value> = self.request(
            Method::GET,
            &Self::document_path(collection, id),
            None,
        ).await?;

        Ok(result.into_iter().next().map(normalize_id))
    }

    async fn query(&self, collection: &str, query: &DocumentQuery) -> Result<Vec<Value>> {
        let query_string = query.to_postgrest();
        let path = if query_string.is_empty() {
            Self::collection_path(collection)
        } else {
            format!("{}?{}", Self::collection_path(collection), query_string)
        };

        let result: Vec<Value> = self.request(Method::GET, &path, None).await?;
        Ok(result.into_iter().map(normalize_id).collect())
    }

    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<()> {
        let result: Vec<Value> = self.request_with_headers(
            Method::PATCH,
            &Self::document_path(collection, id),
            Some(Value::Object(fields)),
            Some(Self::return_representation()),
        ).await?;

        if result.is_empty() {
            return Err(anyhow!("Resource not found: no {} document with id {}", collection, id));
        }

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.send(Method::DELETE, &Self::document_path(collection, id), None, None).await?;
        Ok(())
    }
}
