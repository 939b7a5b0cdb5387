use loadline_core::domain::carrier::McNumber;
use loadline_fmcsa::FmcsaClient;
use serde_json::json;

use crate::commands::{prepare, CommandResult};

pub fn run(raw_mc_number: &str) -> CommandResult {
    let Ok(mc_number) = McNumber::parse(raw_mc_number) else {
        return CommandResult::failure(
            "verify",
            "invalid_mc_number",
            format!("MC number must be digits only, got {raw_mc_number:?}"),
            7,
        );
    };

    let (config, runtime) = match prepare("verify") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let client = match FmcsaClient::from_config(&config.fmcsa) {
        Ok(client) => client,
        Err(error) => {
            return CommandResult::failure("verify", "fmcsa_client", error.to_string(), 4);
        }
    };

    let verification = runtime.block_on(client.lookup(&mc_number));
    let message = match (&verification.error, verification.valid) {
        (Some(error), _) => format!("registry unavailable: {error}"),
        (None, true) => format!("MC {mc_number} is an active carrier"),
        (None, false) => format!("MC {mc_number} is not an active carrier"),
    };

    CommandResult::success_with_data(
        "verify",
        message,
        Some(json!({ "mc_number": mc_number.as_str(), "verification": verification })),
    )
}
