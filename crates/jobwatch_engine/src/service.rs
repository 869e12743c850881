use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use jobwatch_core::{JobParameters, ProgressSnapshot, ResultRow};
use jobwatch_logging::{watch_debug, watch_info};
use reqwest::{Response, Url};

use crate::download::{AtomicDownload, PersistError};
use crate::types::{MessageBody, ProgressBody, RowBody, StartBody};
use crate::{FailureKind, HealthStatus, ServiceError};

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Contract of the remote job service the monitor drives.
#[async_trait::async_trait]
pub trait JobService: Send + Sync {
    /// Starts a job; returns the service's acknowledgement text.
    async fn start(&self, params: &JobParameters) -> Result<String, ServiceError>;

    async fn progress(&self) -> Result<ProgressSnapshot, ServiceError>;

    /// Newest `limit` collected rows, newest first.
    async fn results(&self, limit: usize) -> Result<Vec<ResultRow>, ServiceError>;

    async fn stop(&self) -> Result<(), ServiceError>;

    async fn reset(&self) -> Result<(), ServiceError>;

    async fn health(&self) -> Result<HealthStatus, ServiceError>;

    /// Streams the export artifact to `dest`; returns the number of bytes written.
    async fn download(&self, dest: &Path) -> Result<u64, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestJobService {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestJobService {
    pub fn new(settings: ServiceSettings) -> Result<Self, ServiceError> {
        let base = parse_base(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ServiceError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base
            .join(path)
            .map_err(|err| ServiceError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn post_expecting_ok(&self, path: &str) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(self.endpoint(path)?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl JobService for ReqwestJobService {
    async fn start(&self, params: &JobParameters) -> Result<String, ServiceError> {
        let body = StartBody {
            query: &params.query,
            location: &params.location,
            limit: params.limit,
        };
        let response = self
            .client
            .post(self.endpoint("start-scraping")?)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        // A success without a readable body still counts as accepted.
        let body: MessageBody = response.json().await.unwrap_or_default();
        let message = body.message.unwrap_or_else(|| "Job started".to_string());
        watch_info!("start accepted: {}", message);
        Ok(message)
    }

    async fn progress(&self) -> Result<ProgressSnapshot, ServiceError> {
        let response = self
            .client
            .get(self.endpoint("progress")?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let body: ProgressBody = response.json().await.map_err(map_reqwest_error)?;
        Ok(body.into())
    }

    async fn results(&self, limit: usize) -> Result<Vec<ResultRow>, ServiceError> {
        let mut url = self.endpoint("results")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let rows: Vec<RowBody> = response.json().await.map_err(map_reqwest_error)?;
        Ok(rows.into_iter().map(ResultRow::from).collect())
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        self.post_expecting_ok("stop-scraping").await
    }

    async fn reset(&self) -> Result<(), ServiceError> {
        self.post_expecting_ok("reset-scraper").await
    }

    async fn health(&self) -> Result<HealthStatus, ServiceError> {
        let response = self
            .client
            .get(self.base.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        response.json().await.map_err(map_reqwest_error)
    }

    async fn download(&self, dest: &Path) -> Result<u64, ServiceError> {
        let response = self
            .client
            .get(self.endpoint("download")?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        let mut file = AtomicDownload::create(dest).map_err(map_persist_error)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            file.write_chunk(&chunk).map_err(map_persist_error)?;
        }
        let written = file.written();
        let path: PathBuf = file.finish().map_err(map_persist_error)?;
        watch_info!("downloaded {} bytes to {:?}", written, path);
        Ok(written)
    }
}

/// Base URLs are treated as directories so relative endpoints keep any path prefix.
fn parse_base(raw: &str) -> Result<Url, ServiceError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|err| ServiceError::new(FailureKind::InvalidUrl, err.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ServiceError::new(
            FailureKind::InvalidUrl,
            format!("{raw} cannot be used as a base url"),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Turns a non-2xx response into an error carrying the service's `error` text.
async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response
        .json::<MessageBody>()
        .await
        .ok()
        .and_then(|body| body.error.or(body.message));
    watch_debug!("service answered {} ({:?})", status, detail);
    Err(
        ServiceError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string())
            .with_detail(detail),
    )
}

fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ServiceError::new(FailureKind::Decode, err.to_string());
    }
    ServiceError::new(FailureKind::Network, err.to_string())
}

fn map_persist_error(err: PersistError) -> ServiceError {
    ServiceError::new(FailureKind::Io, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::parse_base;

    #[test]
    fn base_url_keeps_path_prefix() {
        let base = parse_base("http://localhost:5001/api").unwrap();
        assert_eq!(
            base.join("progress").unwrap().as_str(),
            "http://localhost:5001/api/progress"
        );
        let bare = parse_base("http://localhost:5001").unwrap();
        assert_eq!(
            bare.join("progress").unwrap().as_str(),
            "http://localhost:5001/progress"
        );
    }

    #[test]
    fn garbage_base_is_rejected() {
        assert!(parse_base("not a url").is_err());
        assert!(parse_base("mailto:ops@example.com").is_err());
    }
}
