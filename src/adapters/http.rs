use crate::config::toml_config::ServiceConfig;
use crate::domain::model::{DataArray, Params};
use crate::domain::ports::{value_to_param, AccessService};
use crate::utils::error::{GamineError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// REST access service speaking JSON over HTTP.
///
/// Collections live at `{base}/{resource}`, entities at
/// `{base}/{resource}/{id}`. New objects are POSTed, existing ones PUT.
#[derive(Debug, Clone)]
pub struct HttpAccessService {
    client: Client,
    base_url: Url,
    headers: BTreeMap<String, String>,
    timeout: Option<Duration>,
}

impl HttpAccessService {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| GamineError::InvalidConfigValueError {
            field: "service.base_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(GamineError::InvalidConfigValueError {
                field: "service.base_url".to_string(),
                value: base_url.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            headers: BTreeMap::new(),
            timeout: None,
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let mut service = Self::new(&config.base_url)?;
        if let Some(headers) = &config.headers {
            service.headers = headers.clone();
        }
        service.timeout = config.timeout_seconds.map(Duration::from_secs);
        Ok(service)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, resource: &str, id: Option<&Value>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(resource.split('/').filter(|s| !s.is_empty()));
            if let Some(id) = id {
                segments.push(&value_to_param(id));
            }
        }
        url
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        let mut request = self.client.request(method, url.clone());

        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        request
    }

    /// Sends the request and decodes the JSON body. `Ok(None)` for an empty
    /// body, or for a 404 when `allow_missing` is set.
    async fn fetch(
        &self,
        request: RequestBuilder,
        url: &Url,
        allow_missing: bool,
    ) -> Result<Option<Value>> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("API response status for {}: {}", url, status);

        if allow_missing && status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            return Err(GamineError::ApiStatusError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&body)?))
    }

    fn rows(url: &Url, body: Option<Value>) -> Result<Vec<DataArray>> {
        match body {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(obj) => Ok(obj),
                    other => Err(GamineError::UnexpectedResponse {
                        url: url.to_string(),
                        message: format!("expected an object in the result list, got {}", other),
                    }),
                })
                .collect(),
            // A single object is treated as a one-row result
            Some(Value::Object(obj)) => Ok(vec![obj]),
            Some(other) => Err(GamineError::UnexpectedResponse {
                url: url.to_string(),
                message: format!("expected an array of objects, got {}", other),
            }),
        }
    }

    fn object(url: &Url, body: Option<Value>) -> Result<Option<DataArray>> {
        match body {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(obj)) => Ok(Some(obj)),
            Some(other) => Err(GamineError::UnexpectedResponse {
                url: url.to_string(),
                message: format!("expected an object, got {}", other),
            }),
        }
    }
}

#[async_trait]
impl AccessService for HttpAccessService {
    async fn find_all(&self, resource: &str, params: &Params) -> Result<Vec<DataArray>> {
        let url = self.url(resource, None);
        tracing::debug!("GET {}", url);

        let request = self.request(Method::GET, &url).query(params);
        let body = self.fetch(request, &url, false).await?;
        Self::rows(&url, body)
    }

    async fn find_one_by_id(
        &self,
        resource: &str,
        id: &Value,
        params: &Params,
    ) -> Result<Option<DataArray>> {
        let url = self.url(resource, Some(id));
        tracing::debug!("GET {}", url);

        let request = self.request(Method::GET, &url).query(params);
        let body = self.fetch(request, &url, true).await?;
        Self::object(&url, body)
    }

    async fn find_by_key_val(
        &self,
        resource: &str,
        key: &str,
        val: &Value,
        params: &Params,
    ) -> Result<Vec<DataArray>> {
        let url = self.url(resource, None);
        tracing::debug!("GET {} where {}={}", url, key, val);

        let request = self
            .request(Method::GET, &url)
            .query(&[(key, value_to_param(val))])
            .query(params);
        let body = self.fetch(request, &url, false).await?;
        Self::rows(&url, body)
    }

    async fn save(
        &self,
        data: &DataArray,
        id: Option<&Value>,
        resource: &str,
    ) -> Result<DataArray> {
        let (method, url) = match id {
            Some(id) => (Method::PUT, self.url(resource, Some(id))),
            None => (Method::POST, self.url(resource, None)),
        };
        tracing::debug!("{} {}", method, url);

        let request = self.request(method, &url).json(data);
        let body = self.fetch(request, &url, false).await?;
        Ok(Self::object(&url, body)?.unwrap_or_default())
    }

    async fn remove(&self, id: &Value, resource: &str) -> Result<bool> {
        let url = self.url(resource, Some(id));
        tracing::debug!("DELETE {}", url);

        let request = self.request(Method::DELETE, &url);
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("API response status for {}: {}", url, status);

        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(GamineError::ApiStatusError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(true)
    }
}
