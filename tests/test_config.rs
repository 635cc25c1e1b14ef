use shardline::config::{Config, ServerConfig};
use shardline::error::ServerError;

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.server.workers, 10);
    assert_eq!(cfg.server.backlog, 1000);
    assert_eq!(cfg.server.max_connections, 10_000);
    assert_eq!(cfg.server.buffer_size, 4096);
}

#[test]
fn test_config_listen_override_from_env() {
    // All env manipulation lives in this one test to avoid races between tests.
    unsafe {
        std::env::remove_var("SHARDLINE_CONFIG");
        std::env::set_var("LISTEN", "0.0.0.0:3000");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.host, "0.0.0.0");
    assert_eq!(cfg.port, 3000);

    unsafe {
        std::env::set_var("LISTEN", "no-port-here");
    }
    assert!(Config::load().is_err());

    unsafe {
        std::env::remove_var("LISTEN");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg, Config::default());
}

#[test]
fn test_config_from_yaml() {
    let yaml = r#"
host: 0.0.0.0
port: 9090
server:
  workers: 4
  buffer_size: 8192
"#;
    let cfg = Config::from_yaml(yaml).unwrap();

    assert_eq!(cfg.host, "0.0.0.0");
    assert_eq!(cfg.port, 9090);
    assert_eq!(cfg.server.workers, 4);
    assert_eq!(cfg.server.buffer_size, 8192);
    // Unspecified fields keep their defaults
    assert_eq!(cfg.server.backlog, 1000);
}

#[test]
fn test_config_from_yaml_rejects_bad_types() {
    assert!(Config::from_yaml("port: not-a-port").is_err());
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1, cfg2);
}

#[test]
fn test_server_config_validation() {
    assert!(ServerConfig::default().validate().is_ok());

    let invalid = [
        ServerConfig { workers: 0, ..ServerConfig::default() },
        ServerConfig { backlog: 0, ..ServerConfig::default() },
        ServerConfig { max_connections: 0, ..ServerConfig::default() },
        ServerConfig { max_events: 0, ..ServerConfig::default() },
        ServerConfig { buffer_size: 0, ..ServerConfig::default() },
    ];
    for cfg in invalid {
        assert!(matches!(cfg.validate(), Err(ServerError::Config { .. })));
    }
}

#[test]
fn test_connections_per_worker_rounds_up() {
    let cfg = ServerConfig {
        workers: 3,
        max_connections: 10,
        ..ServerConfig::default()
    };

    assert_eq!(cfg.connections_per_worker(), 4);
}
