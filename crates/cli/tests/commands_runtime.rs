use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use loadline_cli::commands::{config, migrate, seed, verify};
use serde_json::Value;

const VALID_ENV: &[(&str, &str)] = &[
    ("LOADLINE_SERVER_API_KEY", "cli-shared-secret-7c21"),
    ("LOADLINE_FMCSA_WEB_KEY", "fmcsa-web-key-test"),
    ("LOADLINE_DATABASE_URL", "sqlite::memory:"),
];

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(VALID_ENV, || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_without_api_key() {
    with_env(&[("LOADLINE_FMCSA_WEB_KEY", "fmcsa-web-key-test")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
        assert!(payload["message"].as_str().unwrap_or_default().contains("server.api_key"));
    });
}

#[test]
fn seed_loads_demo_board_by_default() {
    with_env(VALID_ENV, || {
        let result = seed::run(None);
        assert_eq!(result.exit_code, 0, "expected demo seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["loads_seeded"], 5);
        assert_eq!(payload["data"]["total_loads"], 5);
        assert!(payload["message"].as_str().unwrap_or_default().contains("built-in demo loads"));
    });
}

#[test]
fn seed_reads_loads_from_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("loads.json");
    fs::write(
        &path,
        r#"[{"load_id": "F-1", "origin": "Reno, NV", "destination": "Boise, ID", "loadboard_rate": 980.25}]"#,
    )
    .expect("write loads file");

    with_env(VALID_ENV, || {
        let result = seed::run(Some(&path));
        assert_eq!(result.exit_code, 0, "expected file seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["loads_seeded"], 1);
        assert_eq!(payload["data"]["total_loads"], 1);
    });
}

#[test]
fn seed_rejects_malformed_loads_file_before_touching_database() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("loads.json");
    fs::write(&path, r#"{"load_id": "not-an-array"}"#).expect("write loads file");

    with_env(&[], || {
        let result = seed::run(Some(&path));
        assert_eq!(result.exit_code, 7);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "loads_file");
    });
}

#[test]
fn verify_rejects_non_digit_mc_number() {
    with_env(VALID_ENV, || {
        let result = verify::run("MC-12");
        assert_eq!(result.exit_code, 7);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "verify");
        assert_eq!(payload["error_class"], "invalid_mc_number");
    });
}

#[test]
fn verify_reports_unreachable_registry_as_not_active() {
    let mut vars = VALID_ENV.to_vec();
    vars.push(("LOADLINE_FMCSA_BASE_URL", "http://127.0.0.1:9"));
    vars.push(("LOADLINE_FMCSA_TIMEOUT_SECS", "2"));

    with_env(&vars, || {
        let result = verify::run("123456");
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["mc_number"], "123456");
        assert_eq!(payload["data"]["verification"]["valid"], false);
    });
}

#[test]
fn config_redacts_secrets_and_attributes_env_sources() {
    with_env(VALID_ENV, || {
        let output = config::run();

        assert!(output.starts_with("effective config"));
        assert!(
            output.contains("- server.api_key = ***7c21 (source: env (LOADLINE_SERVER_API_KEY))")
        );
        assert!(!output.contains("cli-shared-secret"));
        assert!(output.contains("- server.port = 4000 (source: default)"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "LOADLINE_DATABASE_URL",
        "LOADLINE_DATABASE_MAX_CONNECTIONS",
        "LOADLINE_DATABASE_TIMEOUT_SECS",
        "LOADLINE_SERVER_BIND_ADDRESS",
        "LOADLINE_SERVER_PORT",
        "LOADLINE_SERVER_HEALTH_CHECK_PORT",
        "LOADLINE_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "LOADLINE_SERVER_API_KEY",
        "LOADLINE_FMCSA_BASE_URL",
        "LOADLINE_FMCSA_WEB_KEY",
        "LOADLINE_FMCSA_TIMEOUT_SECS",
        "LOADLINE_NEGOTIATION_MAX_ROUNDS",
        "LOADLINE_NEGOTIATION_BAND_PCT",
        "LOADLINE_NEGOTIATION_LOOKUP_TIMEOUT_SECS",
        "LOADLINE_SESSIONS_IDLE_TTL_SECS",
        "LOADLINE_SESSIONS_SWEEP_INTERVAL_SECS",
        "LOADLINE_LOGGING_LEVEL",
        "LOADLINE_LOGGING_FORMAT",
        "LOADLINE_LOG_LEVEL",
        "LOADLINE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
