//! Interpretation of QCMobile `carriers/docket-number` answers.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{info, warn};

use loadline_core::domain::carrier::CarrierVerification;

pub const UNAVAILABLE_MESSAGE: &str = "FMCSA service is temporarily unavailable";

/// Authority status code the registry uses for an active carrier.
pub const ACTIVE_STATUS: &str = "A";

#[derive(Debug, Deserialize)]
struct DocketResponse {
    #[serde(default)]
    content: Option<Vec<DocketEntry>>,
}

#[derive(Debug, Deserialize)]
struct DocketEntry {
    #[serde(default)]
    carrier: Option<CarrierDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CarrierDetails {
    #[serde(default)]
    status_code: Option<String>,
    #[serde(default)]
    legal_name: Option<String>,
}

/// Maps a registry HTTP answer to a verification result. Only the first
/// carrier in `content` is considered.
pub fn interpret_response(status: StatusCode, body: &str) -> CarrierVerification {
    if status.is_server_error() {
        warn!(event_name = "fmcsa.upstream_unavailable", status = status.as_u16());
        return CarrierVerification::unavailable(UNAVAILABLE_MESSAGE);
    }
    if !status.is_success() {
        warn!(event_name = "fmcsa.upstream_rejected", status = status.as_u16());
        return CarrierVerification::rejected();
    }

    let parsed = match serde_json::from_str::<DocketResponse>(body) {
        Ok(parsed) => parsed,
        Err(error) => {
            warn!(event_name = "fmcsa.response_malformed", error = %error);
            return CarrierVerification::rejected();
        }
    };

    let Some(carrier) = parsed
        .content
        .and_then(|entries| entries.into_iter().next())
        .and_then(|entry| entry.carrier)
    else {
        info!(event_name = "fmcsa.carrier_not_found");
        return CarrierVerification::rejected();
    };

    match carrier.status_code.as_deref() {
        Some(ACTIVE_STATUS) => {
            let legal_name = carrier.legal_name.unwrap_or_default();
            info!(event_name = "fmcsa.carrier_active", carrier_name = %legal_name);
            CarrierVerification::active(legal_name, ACTIVE_STATUS)
        }
        other => {
            info!(event_name = "fmcsa.carrier_inactive", status_code = ?other);
            CarrierVerification::rejected()
        }
    }
}
