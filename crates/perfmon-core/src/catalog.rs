//! 지원 카운터 카탈로그.
//!
//! PerfMon이 노출하는 수백 개 카운터 중 익스포터가 요청할 수 있는
//! 카운터만 고정 테이블로 관리한다. 테이블에 없는 카운터는 원격 카탈로그에
//! 존재하더라도 세션에 추가되지 않는다.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::config::MetricsConfig;

/// 카운터를 가져올 수 있는 PerfMon 그룹
pub const ALLOWED_GROUPS: &[&str] = &["Cisco CallManager", "Cisco Recording"];

/// 이벤트(누적) 카운터 판별 접미사 (대소문자 무시)
const EVENT_SUFFIX: &str = "failed";

/// 카탈로그 항목
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSpec {
    /// PerfMon 카운터 이름
    pub name: &'static str,
    /// Prometheus 메트릭 이름
    pub metric_name: &'static str,
    /// 설정에 값이 없을 때의 활성화 여부
    pub default_enabled: bool,
}

const fn spec(name: &'static str, metric_name: &'static str, default_enabled: bool) -> CounterSpec {
    CounterSpec {
        name,
        metric_name,
        default_enabled,
    }
}

static CATALOG: &[CounterSpec] = &[
    spec("CallsActive", "cucm_calls_active", true),
    spec("CallsAttempted", "cucm_calls_attempted", false),
    spec("CallsInProgress", "cucm_calls_in_progress", true),
    spec("CallsCompleted", "cucm_calls_completed", true),
    spec("PartiallyRegisteredPhone", "cucm_partially_registered_phone", true),
    spec("RegisteredHardwarePhones", "cucm_registered_hardware_phones", true),
    spec("GatewayRegistrationFailures", "cucm_gateway_registration_failures", false),
    spec("GatewaysInService", "cucm_gateways_in_service", false),
    spec("GatewaysOutOfService", "cucm_gateways_out_of_service", false),
    spec("GatewaysSessionsActive", "cucm_gateways_sessions_active", true),
    spec("GatewaysSessionsFailed", "cucm_gateways_sessions_failed", true),
    spec("PhoneSessionsActive", "cucm_phone_sessions_active", true),
    spec("PhoneSessionsFailed", "cucm_phone_sessions_failed", true),
    spec("AnnunciatorOutOfResources", "cucm_annunciator_out_of_resources", false),
    spec("AnnunciatorResourceActive", "cucm_annunciator_resource_active", false),
    spec("AnnunciatorResourceAvailable", "cucm_annunciator_resource_available", false),
    spec("AnnunciatorResourceTotal", "cucm_annunciator_resource_total", false),
    spec("AuthenticatedCallsActive", "cucm_authenticated_calls_active", false),
    spec("AuthenticatedCallsCompleted", "cucm_authenticated_calls_completed", false),
    spec(
        "AuthenticatedPartiallyRegisteredPhone",
        "cucm_authenticated_partially_registered_phone",
        false,
    ),
    spec("AuthenticatedRegisteredPhones", "cucm_authenticated_registered_phones", false),
    spec("CallManagerHeartBeat", "cucm_call_manager_heart_beat", false),
    spec(
        "CumulativeAllocatedResourceCannotOpenPort",
        "cucm_cumulative_allocated_resource_cannot_open_port",
        false,
    ),
    spec("EncryptedCallsActive", "cucm_encrypted_calls_active", false),
    spec("EncryptedCallsCompleted", "cucm_encrypted_calls_completed", false),
    spec(
        "EncryptedPartiallyRegisteredPhones",
        "cucm_encrypted_partially_registered_phones",
        false,
    ),
    spec("EncryptedRegisteredPhones", "cucm_encrypted_registered_phones", false),
    spec("HWConferenceActive", "cucm_hw_conference_active", false),
    spec("HWConferenceCompleted", "cucm_hw_conference_completed", false),
    spec("HWConferenceOutOfResources", "cucm_hw_conference_out_of_resources", false),
    spec("HWConferenceResourceActive", "cucm_hw_conference_resource_active", false),
    spec("HWConferenceResourceAvailable", "cucm_hw_conference_resource_available", false),
    spec("HWConferenceResourceTotal", "cucm_hw_conference_resource_total", false),
    spec("MTPOutOfResources", "cucm_mtp_out_of_resources", false),
    spec("MTPRequestsThrottled", "cucm_mtp_requests_throttled", false),
    spec("MTPResourceActive", "cucm_mtp_resource_active", false),
    spec("MTPResourceAvailable", "cucm_mtp_resource_available", false),
    spec("MTPResourceTotal", "cucm_mtp_resource_total", true),
    spec("RegisteredAnalogAccess", "cucm_registered_analog_access", false),
    spec("RegisteredMGCPGateway", "cucm_registered_mgcp_gateway", false),
    spec("RegisteredOtherStationDevices", "cucm_registered_other_station_devices", false),
    spec(
        "SIPLineServerAuthorizationChallenges",
        "cucm_sip_line_server_authorization_challenges",
        false,
    ),
    spec(
        "SIPLineServerAuthorizationFailures",
        "cucm_sip_line_server_authorization_failures",
        false,
    ),
    spec(
        "SIPTrunkApplicationAuthorizationFailures",
        "cucm_sip_trunk_application_authorization_failures",
        false,
    ),
    spec(
        "SIPTrunkApplicationAuthorizations",
        "cucm_sip_trunk_application_authorizations",
        false,
    ),
    spec("SIPTrunkAuthorizationFailures", "cucm_sip_trunk_authorization_failures", false),
    spec("SIPTrunkAuthorizations", "cucm_sip_trunk_authorizations", false),
    spec(
        "SIPTrunkServerAuthenticationChallenges",
        "cucm_sip_trunk_server_authentication_challenges",
        false,
    ),
    spec("SWConferenceActive", "cucm_sw_conference_active", false),
    spec("SWConferenceCompleted", "cucm_sw_conference_completed", false),
    spec("SWConferenceOutOfResources", "cucm_sw_conference_out_of_resources", false),
    spec("SWConferenceResourceActive", "cucm_sw_conference_resource_active", false),
    spec("SWConferenceResourceAvailable", "cucm_sw_conference_resource_available", false),
    spec("SWConferenceResourceTotal", "cucm_sw_conference_resource_total", false),
    spec("SystemCallsAttempted", "cucm_system_calls_attempted", false),
    spec("TranscoderOutOfResources", "cucm_transcoder_out_of_resources", false),
    spec("TranscoderRequestsThrottled", "cucm_transcoder_requests_throttled", false),
    spec("TranscoderResourceActive", "cucm_transcoder_resource_active", false),
    spec("TranscoderResourceAvailable", "cucm_transcoder_resource_available", false),
    spec("TranscoderResourceTotal", "cucm_transcoder_resource_total", false),
    spec("UnEncryptedCallFailures", "cucm_un_encrypted_call_failures", false),
    spec("VideoCallsActive", "cucm_video_calls_active", false),
    spec("VideoCallsCompleted", "cucm_video_calls_completed", false),
    spec("VideoOnHoldOutOfResources", "cucm_video_on_hold_out_of_resources", false),
    spec("VideoOnHoldResourceActive", "cucm_video_on_hold_resource_active", false),
    spec("VideoOutOfResources", "cucm_video_out_of_resources", false),
];

/// 정확한 이름 인덱스
static BY_NAME: Lazy<HashMap<&'static str, &'static CounterSpec>> =
    Lazy::new(|| CATALOG.iter().map(|spec| (spec.name, spec)).collect());

/// 소문자 이름 인덱스 (설정 키 매칭용)
static BY_LOWER_NAME: Lazy<HashMap<String, &'static CounterSpec>> = Lazy::new(|| {
    CATALOG
        .iter()
        .map(|spec| (spec.name.to_ascii_lowercase(), spec))
        .collect()
});

/// 전체 카탈로그 (선언 순서)
pub fn all() -> &'static [CounterSpec] {
    CATALOG
}

/// 이름으로 카탈로그 항목 조회
pub fn lookup(name: &str) -> Option<&'static CounterSpec> {
    BY_NAME.get(name).copied()
}

/// 대소문자를 무시하고 카탈로그 항목 조회
pub fn lookup_ignore_case(name: &str) -> Option<&'static CounterSpec> {
    BY_LOWER_NAME.get(&name.to_ascii_lowercase()).copied()
}

/// 카탈로그에 있는 카운터인지 여부
pub fn is_supported(name: &str) -> bool {
    BY_NAME.contains_key(name)
}

/// 허용된 그룹인지 여부
pub fn is_allowed_group(group: &str) -> bool {
    ALLOWED_GROUPS.contains(&group)
}

/// 설정 기준 활성화 여부. 카탈로그에 없는 카운터는 항상 `false`.
pub fn enabled(metrics: &MetricsConfig, name: &str) -> bool {
    match lookup(name) {
        Some(spec) => metrics.counter_override(name).unwrap_or(spec.default_enabled),
        None => false,
    }
}

/// 이벤트(누적) 카운터 여부. 이름이 `Failed`로 끝나면 이벤트, 나머지는 레벨
pub fn is_event_counter(name: &str) -> bool {
    name.len() >= EVENT_SUFFIX.len()
        && name.is_char_boundary(name.len() - EVENT_SUFFIX.len())
        && name[name.len() - EVENT_SUFFIX.len()..].eq_ignore_ascii_case(EVENT_SUFFIX)
}
