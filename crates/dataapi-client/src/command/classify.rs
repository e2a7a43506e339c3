use dataapi_core::{DataApiError, DataApiErrors, Error, Warning, Warnings};
use serde::Deserialize;

use super::TRACING_TARGET;
use crate::options::WarningHandler;

#[derive(Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Default, Deserialize)]
struct ErrorsBody {
    #[serde(default)]
    errors: Vec<DataApiError>,
}

#[derive(Default, Deserialize)]
struct WarningsBody {
    #[serde(default)]
    status: WarningsStatus,
}

#[derive(Default, Deserialize)]
struct WarningsStatus {
    #[serde(default)]
    warnings: Warnings,
}

/// Splits a response into warnings and an optional error.
///
/// Statuses of 400 and above yield a transport error built from the body's
/// `message` field, or the raw body when there is none, and no warnings.
/// Otherwise the `errors` array becomes a [`DataApiErrors`] and
/// `status.warnings` is returned alongside it; bodies that do not parse are
/// treated as carrying neither. `handler` is called once per warning before
/// this returns.
pub fn extract_errors(
    status: u16,
    body: &[u8],
    handler: Option<&WarningHandler>,
) -> (Warnings, Option<Error>) {
    if status >= 400 {
        let message = serde_json::from_slice::<MessageBody>(body)
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());

        tracing::warn!(
            target: TRACING_TARGET,
            status,
            message = %message,
            "Data API request rejected"
        );

        let error = Error::transport(message).with_status_code(status);
        return (Warnings::new(), Some(error));
    }

    let errors = serde_json::from_slice::<ErrorsBody>(body)
        .unwrap_or_default()
        .errors;
    let warnings = serde_json::from_slice::<WarningsBody>(body)
        .unwrap_or_default()
        .status
        .warnings;

    for warning in &warnings {
        report_warning(warning, handler);
    }

    (warnings, DataApiErrors::new(errors).map(Error::data_api))
}

fn report_warning(warning: &Warning, handler: Option<&WarningHandler>) {
    tracing::warn!(
        target: TRACING_TARGET,
        code = warning.error_code.as_deref().unwrap_or_default(),
        warning = %warning,
        "Data API warning"
    );

    if let Some(handler) = handler {
        handler(warning);
    }
}
