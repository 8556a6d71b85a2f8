use nodeploy::error::{DeployError, ErrorKind};

#[test]
fn display_malformed_config() {
    let err = DeployError::MalformedConfig {
        line: 4,
        content: "PORT 3000".into(),
    };
    assert_eq!(
        err.to_string(),
        "invalid line in config file (line 4): PORT 3000"
    );
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn display_missing_key() {
    let err = DeployError::MissingKey("REPO_URL".into());
    assert_eq!(err.to_string(), "missing configuration key: REPO_URL");
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn display_precondition() {
    let err = DeployError::Precondition("no such folder".into());
    assert_eq!(err.to_string(), "precondition failed: no such folder");
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[test]
fn display_command_failed() {
    let err = DeployError::CommandFailed {
        command: "git clone x".into(),
        status: "exit status 128".into(),
        detail: ": repository not found".into(),
    };
    assert_eq!(
        err.to_string(),
        "command failed: git clone x (exit status 128): repository not found"
    );
    assert_eq!(err.kind(), ErrorKind::ExternalCommand);
}

#[test]
fn display_command_not_found() {
    let err = DeployError::CommandNotFound("pm2".into());
    assert_eq!(err.to_string(), "command not found: pm2");
    assert_eq!(err.kind(), ErrorKind::ExternalCommand);
}

#[test]
fn io_error_is_transparent() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err = DeployError::from(io);
    assert_eq!(err.to_string(), "denied");
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn json_errors_convert() {
    let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err = DeployError::from(source);
    assert!(matches!(err, DeployError::Json(_)));
    assert_eq!(err.kind(), ErrorKind::Io);
}
