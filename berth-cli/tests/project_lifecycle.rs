//! End-to-end create / keys / harden / audit against temporary directories.
//!
//! Port probes hit the real loopback interface; no containers are started.

use std::collections::HashSet;
use std::path::Path;

use berth_cli::audit::{audit_env, Finding};
use berth_cli::project::{env_value, Project};
use berth_cli::{Cli, CliError};
use berth_core::{Secret, Service};
use berth_synth::{decode_claims, verify};
use chrono::Utc;
use clap::Parser;

async fn berth(args: &[&str]) -> Result<(), CliError> {
    let mut argv = vec!["berth", "--probe-host", "127.0.0.1", "--probe-timeout-ms", "100"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).expect("arguments parse").run().await
}

async fn create(dir: &Path) {
    let dir = dir.to_str().expect("utf-8 path");
    berth(&["create", dir, "--base-port", "20000"]).await.expect("create succeeds");
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("file readable")
}

#[tokio::test]
async fn create_writes_a_complete_project() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path().join("demo");
    create(&root).await;

    let project = Project::new(&root).expect("project");
    assert!(project.is_complete());
    assert!(root.join("README.md").is_file());
    assert!(project.reset_script_path().is_file());
    assert!(project.db_data_path().is_dir());

    let env = read(&project.env_path());
    let ports: Vec<u16> = Service::ALL
        .iter()
        .map(|s| env_value(&env, s.env_key()).expect("port written").parse().expect("numeric port"))
        .collect();
    let distinct: HashSet<u16> = ports.iter().copied().collect();
    assert_eq!(distinct.len(), ports.len(), "ports must be pairwise distinct: {ports:?}");
    assert!(ports[0] >= 20000);

    let secret = Secret::new(env_value(&env, "JWT_SECRET").expect("secret written"));
    assert_eq!(secret.len(), 48);
    for (field, role) in [("ANON_KEY", "anon"), ("SERVICE_ROLE_KEY", "service_role")] {
        let key = env_value(&env, field).expect("key written");
        assert!(verify(key, &secret), "{field} must verify under JWT_SECRET");
        assert_eq!(decode_claims(key).expect("claims decode").role, role);
    }

    let findings = audit_env(&env, Utc::now());
    assert_eq!(findings, vec![Finding::PhoneSignupEnabled]);
}

#[cfg(unix)]
#[tokio::test]
async fn reset_script_is_executable() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path().join("demo");
    create(&root).await;
    let mode = std::fs::metadata(root.join("reset.sh")).expect("metadata").permissions().mode();
    assert_eq!(mode & 0o111, 0o111);
}

#[tokio::test]
async fn create_refuses_existing_directory() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path().join("demo");
    std::fs::create_dir(&root).expect("mkdir");
    std::fs::write(root.join("keep.txt"), "mine").expect("write");

    let err = berth(&["create", root.to_str().expect("utf-8 path")]).await.expect_err("must refuse");
    assert!(matches!(err, CliError::Precondition { .. }));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(read(&root.join("keep.txt")), "mine");
    assert!(!root.join(".env").exists());
}

#[tokio::test]
async fn exhausted_ports_leave_nothing_behind() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let occupied = listener.local_addr().expect("local_addr").port().to_string();

    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path().join("demo");
    let err = berth(&[
        "create",
        root.to_str().expect("utf-8 path"),
        "--base-port",
        &occupied,
        "--max-probe-attempts",
        "1",
    ])
    .await
    .expect_err("occupied base with a single attempt must fail");

    assert_eq!(err.exit_code(), 4);
    assert!(!root.exists(), "no partial project may remain");
}

#[tokio::test]
async fn keys_rotation_replaces_secret_and_keys() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path().join("demo");
    create(&root).await;
    let env_path = root.join(".env");
    let before = read(&env_path);

    berth(&["keys", "--env-file", env_path.to_str().expect("utf-8 path")]).await.expect("keys succeeds");
    let after = read(&env_path);

    let old_secret = env_value(&before, "JWT_SECRET").expect("old secret");
    let new_secret = Secret::new(env_value(&after, "JWT_SECRET").expect("new secret"));
    assert_ne!(old_secret, new_secret.expose());

    let old_anon = env_value(&before, "ANON_KEY").expect("old key");
    let new_anon = env_value(&after, "ANON_KEY").expect("new key");
    assert!(!verify(old_anon, &new_secret), "old key must not verify under the new secret");
    assert!(verify(new_anon, &new_secret));

    assert_eq!(
        env_value(&before, "POSTGRES_PASSWORD"),
        env_value(&after, "POSTGRES_PASSWORD"),
        "unrelated fields stay untouched"
    );
    assert_eq!(before.lines().count(), after.lines().count());

    let backups: Vec<_> = std::fs::read_dir(&root)
        .expect("read_dir")
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with(".env.bak."))
        .collect();
    assert_eq!(backups.len(), 1);
    assert_eq!(read(&backups[0].path()), before);
}

#[tokio::test]
async fn keys_with_missing_env_file_is_precondition() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let missing = tmp.path().join(".env");
    let err = berth(&["keys", "--env-file", missing.to_str().expect("utf-8 path")])
        .await
        .expect_err("must fail");
    assert!(matches!(err, CliError::Precondition { .. }));
}

#[tokio::test]
async fn keys_with_zero_secret_length_is_usage_error() {
    let err = berth(&["keys", "--secret-length", "0"]).await.expect_err("must fail");
    assert!(matches!(err, CliError::InvalidArgument(_)), "got {err:?}");
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn audit_fails_until_hardened() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path().join("demo");
    create(&root).await;
    let dir = root.to_str().expect("utf-8 path");

    let err = berth(&["audit", dir]).await.expect_err("fresh project has findings");
    assert!(matches!(err, CliError::AuditFailed { count: 1 }));
    assert_eq!(err.exit_code(), 3);

    berth(&["harden", dir, "--dashboard-user", "admin", "--dashboard-password", "correct-horse"])
        .await
        .expect("harden succeeds");

    let env = read(&root.join(".env"));
    assert_eq!(env_value(&env, "DASHBOARD_USERNAME"), Some("admin"));
    assert_eq!(env_value(&env, "ENABLE_PHONE_AUTOCONFIRM"), Some("false"));
    assert!(root.join("security_checklist.md").is_file());

    berth(&["audit", dir]).await.expect("hardened project is clean");
}

#[tokio::test]
async fn harden_requires_a_project() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let err = berth(&["harden", tmp.path().join("nope").to_str().expect("utf-8 path")])
        .await
        .expect_err("must fail");
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn harden_rejects_short_password() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path().join("demo");
    create(&root).await;
    let before = read(&root.join(".env"));

    let err = berth(&["harden", root.to_str().expect("utf-8 path"), "--dashboard-password", "short"])
        .await
        .expect_err("must fail");
    assert!(matches!(err, CliError::InvalidArgument(_)));
    assert_eq!(read(&root.join(".env")), before);
}
