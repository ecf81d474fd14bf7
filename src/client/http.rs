use super::*;
use crate::protocol::IDEMPOTENCY_HEADER;
use serde::de::DeserializeOwned;

/// Game API over HTTP, each call wrapped in the retry policy
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url,
            retry: config.retry,
        })
    }

    async fn create_round_once(&self) -> TransportResult<RoundPublicView> {
        let response = self
            .client
            .get(format!("{}/api/round", self.base_url))
            .send()
            .await?;
        read_json(response).await
    }

    async fn submit_answer_once(
        &self,
        request: &SubmitAnswerRequest,
    ) -> TransportResult<ScoreVerdict> {
        let mut builder = self
            .client
            .post(format!("{}/api/answer", self.base_url))
            .json(request);
        if let Some(key) = &request.idempotency_key {
            builder = builder.header(IDEMPOTENCY_HEADER, key);
        }

        let response = builder.send().await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> TransportResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| TransportError::Decode(e.to_string()))
}

#[async_trait]
impl GameTransport for HttpTransport {
    async fn create_round(&self) -> TransportResult<RoundPublicView> {
        self.retry
            .run("create_round", |_| self.create_round_once())
            .await
    }

    /// Every attempt carries the same idempotency key, so a retry of an
    /// answer the server already judged returns the original verdict
    async fn submit_answer(&self, request: &SubmitAnswerRequest) -> TransportResult<ScoreVerdict> {
        self.retry
            .run("submit_answer", |_| self.submit_answer_once(request))
            .await
    }
}
