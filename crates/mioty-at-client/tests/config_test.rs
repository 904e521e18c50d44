//! Integration tests for configuration loading and TCP connection.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use mioty_at_client::{ClientConfig, ConfigError, MiotyClient};

#[test]
fn test_load_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modem.yaml");
    std::fs::write(
        &path,
        "address: \"10.1.2.3:4001\"\nread_timeout_ms: 250\nchunk_size: 16\n",
    )
    .unwrap();

    let config = ClientConfig::load(&path).expect("config should load");
    assert_eq!(config.address, "10.1.2.3:4001");
    assert_eq!(config.read_timeout_ms, 250);
    assert_eq!(config.chunk_size, 16);
    assert_eq!(config.max_command_len, 512);
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ClientConfig::load(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_invalid_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_command_len: 4").unwrap();
    let err = ClientConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_config_round_trip_through_yaml() {
    let config = ClientConfig {
        address: "modem.local:7000".to_string(),
        downlink_capacity: 64,
        ..ClientConfig::default()
    };
    let yaml = serde_yaml::to_string(&config).unwrap();
    assert_eq!(ClientConfig::from_yaml_str(&yaml).unwrap(), config);
}

#[test]
fn test_connect_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();

    // A fake modem: read one command line, answer it.
    let modem = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut command = Vec::new();
        let mut byte = [0u8; 1];
        while stream.read(&mut byte).unwrap() == 1 {
            command.push(byte[0]);
            if byte[0] == b'\r' {
                break;
            }
        }
        stream.write_all(b"AT-UTPL?\r\n-UTPL:14\r\n\r\n0\r\n").unwrap();
        command
    });

    let config = ClientConfig {
        address,
        read_timeout_ms: 2000,
        ..ClientConfig::default()
    };
    let mut client = MiotyClient::connect(config).expect("connect should succeed");
    assert_eq!(client.transmit_power().unwrap(), 14);

    let command = modem.join().unwrap();
    assert_eq!(command, b"AT-UTPL?\r");
}
