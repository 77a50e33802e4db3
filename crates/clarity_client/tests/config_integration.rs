//! Integration tests for config load/save and agent address resolution.

use clarity_client::config::{self, ws_base_url, DEFAULT_ACK_TEXT, DEFAULT_SEND_FAILURE_TEXT};
use clarity_client::session::target_url;
use clarity_client::{Config, ConfigError, SessionSettings};
use predicates::prelude::*;

#[test]
fn load_existing_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(
        &config_path,
        r#"
agent:
  url: "https://agent.example.com/"
user:
  id: "42"
audio:
  spool_dir: "/tmp/clarity-audio"
messages:
  ack_default: "Noté."
  send_failure: "Connexion impossible."
"#,
    )
    .unwrap();

    let cfg = config::load(&config_path).expect("load should succeed");
    assert_eq!(cfg.agent.url.as_deref(), Some("https://agent.example.com/"));
    assert_eq!(cfg.user.id.as_deref(), Some("42"));
    assert_eq!(
        cfg.audio.spool_dir.as_deref(),
        Some(std::path::Path::new("/tmp/clarity-audio"))
    );
    assert_eq!(cfg.ack_default(), "Noté.");
    assert_eq!(cfg.send_failure(), "Connexion impossible.");
}

#[test]
fn empty_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(&config_path, "{}\n").unwrap();

    let cfg = config::load(&config_path).expect("load should succeed");
    assert!(cfg.agent.url.is_none());
    assert!(cfg.user.id.is_none());
    assert_eq!(cfg.ack_default(), DEFAULT_ACK_TEXT);
    assert_eq!(cfg.send_failure(), DEFAULT_SEND_FAILURE_TEXT);
}

#[test]
fn load_reports_missing_file_and_bad_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    assert!(matches!(config::load(&missing), Err(ConfigError::Io(_))));

    let broken = dir.path().join("broken.yaml");
    std::fs::write(&broken, "agent: [unclosed").unwrap();
    assert!(matches!(config::load(&broken), Err(ConfigError::Yaml(_))));
}

#[test]
fn save_creates_directory_and_file_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("clarity");
    let config_path = config_dir.join("config.yaml");
    assert!(!config_dir.exists(), "config dir should not exist yet");

    let mut cfg = Config::default();
    cfg.agent.url = Some("https://agent.example.com".into());
    cfg.user.id = Some("7".into());

    config::save(&config_path, &cfg).expect("save should succeed");
    let pred = predicates::path::exists();
    assert!(pred.eval(&config_path), "config file should exist after save");

    let contents = std::fs::read_to_string(&config_path).unwrap();
    assert!(predicates::str::contains("agent:").eval(&contents));
    assert!(
        !predicates::str::contains("spool_dir").eval(&contents),
        "unset options should not be written"
    );

    let reloaded = config::load(&config_path).expect("reload should succeed");
    assert_eq!(reloaded.agent.url, cfg.agent.url);
    assert_eq!(reloaded.user.id, cfg.user.id);
}

#[test]
fn websocket_address_follows_http_scheme() {
    assert_eq!(
        ws_base_url(Some("https://agent.example.com")),
        "wss://agent.example.com"
    );
    assert_eq!(
        ws_base_url(Some("http://localhost:9000///")),
        "ws://localhost:9000"
    );
    assert_eq!(ws_base_url(Some("ws://already:1")), "ws://already:1");
    assert_eq!(ws_base_url(None), "ws://localhost:8080");
    assert_eq!(ws_base_url(Some("  ")), "ws://localhost:8080");
}

#[test]
fn target_url_appends_user_path() {
    assert_eq!(
        target_url("wss://agent.example.com/", "42"),
        "wss://agent.example.com/ws/42"
    );
}

#[test]
fn session_settings_carry_localized_strings() {
    let mut cfg = Config::default();
    cfg.messages.send_failure = Some("Sin conexión.".into());

    let settings = SessionSettings::from(&cfg);
    assert_eq!(settings.send_failure, "Sin conexión.");
    assert_eq!(settings.ack_default, DEFAULT_ACK_TEXT);
}

/// Config path resolves to `~/.clarity/config.yaml` using the current platform's home dir.
#[test]
fn default_config_path_uses_home_directory() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().to_str().unwrap().to_string();

    let key = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    let original = std::env::var(key).ok();

    std::env::set_var(key, &home);
    let path = config::default_config_path();
    match original {
        Some(v) => std::env::set_var(key, v),
        None => std::env::remove_var(key),
    }

    let path = path.expect("should resolve a config path");
    let expected = dir.path().join(".clarity").join("config.yaml");
    assert_eq!(path, expected);
}

#[test]
fn explicit_config_path_wins() {
    let explicit = std::path::Path::new("/etc/clarity.yaml");
    assert_eq!(
        config::resolve_config_path(Some(explicit)).as_deref(),
        Some(explicit)
    );
}
