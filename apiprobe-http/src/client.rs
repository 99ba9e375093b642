//! Instrumented HTTP client

use crate::config::ClientConfig;
use crate::curl::to_curl;
use crate::errors::HttpError;
use crate::report::{with_evidence, ReportSink};
use crate::types::{ApiResponse, HttpMethod, RequestOptions, SentRequest};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[cfg(feature = "coverage")]
use crate::coverage::{self, CoverageRecord, CoverageRecorder};

/// Dispatches verb-level calls against a configured host over one shared
/// connection pool, with structured logging, coverage recording and report
/// evidence around every request.
pub struct ApiClient {
    config: ClientConfig,
    session: Client,
    report: Option<Arc<dyn ReportSink>>,
    #[cfg(feature = "coverage")]
    coverage: Option<CoverageRecorder>,
}

impl ApiClient {
    /// Build a client from validated configuration. The underlying
    /// connection pool is created once here and reused for every request.
    pub fn new(config: ClientConfig) -> Result<Self, HttpError> {
        config.validate()?;
        debug!(
            host = %config.host,
            timeout_secs = config.timeout.as_secs(),
            "Creating ApiClient"
        );
        let session = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()?;
        Ok(Self {
            config,
            session,
            report: None,
            #[cfg(feature = "coverage")]
            coverage: None,
        })
    }

    /// Attach report evidence for every request to the given sink
    pub fn with_report(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.report = Some(sink);
        self
    }

    /// Record API coverage for every logged request
    #[cfg(feature = "coverage")]
    pub fn with_coverage(mut self, recorder: CoverageRecorder) -> Self {
        self.coverage = Some(recorder);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Merge headers into the default set: new keys are added, existing
    /// keys are overwritten, nothing is removed.
    pub fn update_headers(&mut self, headers: HashMap<String, String>) {
        self.config.headers.extend(headers);
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, HttpError> {
        self.send(HttpMethod::Get, path, options).await
    }

    pub async fn post(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, HttpError> {
        self.send(HttpMethod::Post, path, options).await
    }

    pub async fn put(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, HttpError> {
        self.send(HttpMethod::Put, path, options).await
    }

    pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, HttpError> {
        self.send(HttpMethod::Delete, path, options).await
    }

    /// Route through the evidence middleware when a report sink is
    /// configured. Evidence is attached whether or not logging is enabled.
    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, HttpError> {
        match &self.report {
            Some(sink) => {
                with_evidence(sink.as_ref(), options.json.as_ref(), || {
                    self.send_raw(method, path, &options)
                })
                .await
            }
            None => self.send_raw(method, path, &options).await,
        }
    }

    async fn send_raw(
        &self,
        method: HttpMethod,
        path: &str,
        options: &RequestOptions,
    ) -> Result<ApiResponse, HttpError> {
        // The URL is the exact concatenation of host and path; no slash is
        // inserted and nothing is normalized here.
        let full_url = format!("{}{}", self.config.host, path);

        if self.config.disable_log {
            let response = self.execute(method, &full_url, options).await?;
            return check_status(response);
        }

        let event_id = Uuid::new_v4();
        info!(
            event = "Request",
            event_id = %event_id,
            method = %method,
            full_url = %full_url,
            params = ?options.params,
            headers = ?options.headers,
            json = ?options.json,
            data = ?options.data,
        );

        let response = self.execute(method, &full_url, options).await?;

        println!("CURL: {}", to_curl(&response.request));

        #[cfg(feature = "coverage")]
        if let Some(recorder) = &self.coverage {
            let record =
                CoverageRecord::from_call(&self.config.host, path, method, options, &response);
            coverage::spawn_record(recorder.clone(), record);
        }

        info!(
            event = "Response",
            event_id = %event_id,
            status_code = response.status,
            headers = ?response.headers,
            json = %response.json_or_empty(),
        );
        println!("{}", "_".repeat(100));

        check_status(response)
    }

    /// Perform the network call and buffer the response
    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        options: &RequestOptions,
    ) -> Result<ApiResponse, HttpError> {
        let headers = self.effective_headers(options);
        let mut header_map = HeaderMap::new();
        for (name, value) in &headers {
            let header_name = HeaderName::from_str(name)
                .map_err(|_| HttpError::InvalidHeaderName(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| HttpError::InvalidHeaderValue(name.clone()))?;
            header_map.insert(header_name, header_value);
        }

        let mut request = self.session.request(method.into(), url).headers(header_map);
        if let Some(params) = &options.params {
            request = request.query(params);
        }

        let mut sent_headers: Vec<(String, String)> = headers
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect();
        let sent_body = if let Some(json) = &options.json {
            request = request.json(json);
            if !sent_headers.iter().any(|(k, _)| k == "content-type") {
                sent_headers.push(("content-type".to_string(), "application/json".to_string()));
            }
            Some(serde_json::to_string(json)?)
        } else if let Some(data) = &options.data {
            request = request.body(data.clone());
            Some(data.clone())
        } else {
            None
        };
        sent_headers.sort();

        let response = request.send().await?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let response_headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(ApiResponse {
            status,
            headers: response_headers,
            body,
            request: SentRequest {
                method,
                url: final_url,
                headers: sent_headers,
                body: sent_body,
            },
        })
    }

    /// Default headers with per-request overrides applied on top
    fn effective_headers(&self, options: &RequestOptions) -> HashMap<String, String> {
        let mut headers = self.config.headers.clone();
        if let Some(overrides) = &options.headers {
            for (name, value) in overrides {
                headers.insert(name.clone(), value.clone());
            }
        }
        headers
    }
}

/// Enforce the success-or-fail contract: non-2xx statuses become errors
/// carrying the response status, URL and body.
fn check_status(response: ApiResponse) -> Result<ApiResponse, HttpError> {
    if response.is_success() {
        return Ok(response);
    }
    Err(HttpError::Status {
        status: response.status,
        url: response.request.url.clone(),
        body: response.body,
    })
}
