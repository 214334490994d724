//! PerfMon SOAP HTTPS 클라이언트.
//!
//! `PerfmonTransport` 포트 구현. 봉투 생성, Basic 인증, 요청 속도 조절,
//! 상태 코드별 에러 분류, 응답 Body 추출을 담당한다.

use async_trait::async_trait;
use perfmon_core::config::ApiConfig;
use perfmon_core::error::CoreError;
use perfmon_core::models::operation::SoapOperation;
use perfmon_core::models::status::ClientStatus;
use perfmon_core::ports::transport::PerfmonTransport;
use perfmon_core::PROGRAM_NAME;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::rate_governor::{RateGovernor, MIN_DELAY};
use crate::soap;

/// 원격 API에 보내는 User-Agent
pub fn user_agent() -> String {
    format!("{}/{}", PROGRAM_NAME, env!("CARGO_PKG_VERSION"))
}

/// HTTP 에러 응답을 `CoreError`로 분류
///
/// 401과 rate limit 표식은 치명 에러, 나머지는 SOAP 폴트를 담은 일시 에러.
pub fn classify_failure(status: u16, body: &str) -> CoreError {
    let fault = soap::parse_fault(body).unwrap_or_default();
    if status == 401 {
        return CoreError::Auth(format!(
            "HTTP 401, PerfMon API 사용 권한이 없습니다 {}",
            fault.message
        ));
    }
    if soap::is_rate_control(body) {
        return CoreError::RateLimit(if fault.message.is_empty() {
            format!("HTTP {}", status)
        } else {
            fault.message
        });
    }
    CoreError::Remote {
        status,
        fault_code: fault.code,
        fault_string: fault.message,
    }
}

/// PerfMon SOAP 클라이언트: `PerfmonTransport` 포트 구현
pub struct SoapHttpClient {
    client: reqwest::Client,
    endpoint: String,
    user: String,
    password: String,
    governor: Arc<RateGovernor>,
    status: Arc<ClientStatus>,
}

impl SoapHttpClient {
    /// 새 클라이언트 생성
    pub fn new(
        config: &ApiConfig,
        governor: Arc<RateGovernor>,
        status: Arc<ClientStatus>,
    ) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.ignore_certificate)
            .user_agent(user_agent())
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint_url(),
            user: config.user.clone(),
            password: config.password.clone(),
            governor,
            status,
        })
    }

    /// 요청 URL 변경 (프록시, 테스트 서버)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// 요청 URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 공유 상태 카운터
    pub fn status(&self) -> &Arc<ClientStatus> {
        &self.status
    }

    async fn pace(&self, operation: SoapOperation, request_id: &str) {
        let requests = self.governor.snapshot().requests;
        let wait = self.governor.delay();
        if wait > MIN_DELAY {
            warn!(
                %operation,
                request_id,
                "{}건 요청 후 {:?} 대기",
                requests,
                wait
            );
            tokio::time::sleep(wait).await;
        }
    }
}

#[async_trait]
impl PerfmonTransport for SoapHttpClient {
    async fn send(&self, operation: SoapOperation, body: &str) -> Result<String, CoreError> {
        let request_id = Uuid::new_v4().to_string();
        let envelope = soap::envelope(body);

        self.pace(operation, &request_id).await;

        self.status.record_request();
        debug!(%operation, request_id = %request_id, "PerfMon 요청 전송");

        let resp = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .header(CONTENT_TYPE, "text/xml")
            .header(ACCEPT, "text/xml")
            .header(CACHE_CONTROL, "no-cache")
            .body(envelope)
            .send()
            .await
            .map_err(|e| {
                self.status.record_error();
                error!(%operation, request_id = %request_id, "요청 실패: {}", e);
                CoreError::Network(format!("{} 요청 실패: {}", operation, e))
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            self.status.record_error();
            error!(%operation, request_id = %request_id, "응답 본문 읽기 실패: {}", e);
            CoreError::Network(format!("{} 응답 읽기 실패: {}", operation, e))
        })?;

        if status.as_u16() > 299 {
            self.status.record_error();
            let err = classify_failure(status.as_u16(), &text);
            error!(%operation, request_id = %request_id, status = status.as_u16(), "에러 응답: {}", err);
            return Err(err);
        }

        self.status.record_response();
        let inner = soap::extract_body(&text).map_err(|e| {
            error!(%operation, request_id = %request_id, "응답 해석 실패: {}", e);
            e
        })?;
        Ok(inner.to_string())
    }

    fn reset_pacing(&self) {
        self.governor.reset();
    }
}
