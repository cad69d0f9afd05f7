use anyhow::Result;
use classgate::cli::{commands, dispatch};
use classgate::directory::{JsonFileStore, SessionStore, UserDirectory};
use std::path::Path;

fn run(store: &Path, args: &[&str]) -> Result<()> {
    let store = store.to_string_lossy().to_string();
    let mut argv = vec!["classgate", "--store", store.as_str()];
    argv.extend_from_slice(args);
    let matches = commands::new().try_get_matches_from(argv)?;
    dispatch::handler(&matches)?.execute()
}

#[test]
fn bootstrap_login_manage_logout() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("classgate.json");

    run(
        &path,
        &[
            "bootstrap", "-u", "root", "-e", "root@school.test", "--password", "secret1", "-n",
            "Root",
        ],
    )?;
    run(
        &path,
        &[
            "login", "-e", "root@school.test", "--password", "secret1", "-r", "administrator",
        ],
    )?;
    run(&path, &["whoami"])?;
    run(
        &path,
        &[
            "user", "add", "-u", "kid", "-e", "kid@school.test", "--password", "secret1", "-n",
            "Kid", "-r", "student",
        ],
    )?;
    run(&path, &["--json", "user", "list"])?;

    let store = JsonFileStore::new(&path);
    assert_eq!(store.list()?.len(), 2);
    assert!(store.load_session()?.is_some());

    run(&path, &["logout"])?;
    assert!(store.load_session()?.is_none());
    assert!(run(&path, &["whoami"]).is_err());
    Ok(())
}

#[test]
fn wrong_role_is_reported_with_code() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("classgate.json");
    run(
        &path,
        &[
            "bootstrap", "-u", "root", "-e", "root@school.test", "--password", "secret1", "-n",
            "Root",
        ],
    )?;
    let err = run(
        &path,
        &["login", "-e", "root@school.test", "--password", "secret1", "-r", "student"],
    )
    .err()
    .map(|err| err.to_string());
    assert_eq!(
        err,
        Some("Role does not match this account (ROLE_MISMATCH)".to_string())
    );
    Ok(())
}

#[test]
fn permissions_by_role_needs_no_session() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("classgate.json");
    run(&path, &["permissions", "--role", "student"])?;
    assert!(run(&path, &["permissions"]).is_err());
    Ok(())
}
