mod common;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use common::write_account;
use steam_grid_ripper::error::GridError;
use steam_grid_ripper::userdata::{Account, ensure_grid_dir, find_accounts, resolve_account};

#[test]
fn only_numeric_directories_are_accounts() {
    let temp = tempfile::tempdir().unwrap();
    let base = temp.path();
    write_account(base, "200", None);
    write_account(base, "100", None);
    write_account(base, "anonymous", None);
    std::fs::write(base.join("300"), b"not a dir").unwrap();

    let accounts = find_accounts(base).unwrap();
    let ids: Vec<_> = accounts.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["100", "200"]);
}

#[test]
fn first_account_wins_unless_one_is_named() {
    let temp = tempfile::tempdir().unwrap();
    let base = temp.path();
    write_account(base, "99", None);
    write_account(base, "1000", None);

    // Lexicographic, so "1000" sorts before "99".
    assert_eq!(resolve_account(base, None).unwrap().id, "1000");
    assert_eq!(resolve_account(base, Some("99")).unwrap().id, "99");
    assert_matches!(
        resolve_account(base, Some("42")),
        Err(GridError::AccountNotFound(_))
    );
}

#[test]
fn missing_or_empty_userdata_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("userdata");
    assert!(find_accounts(&missing).unwrap().is_empty());
    assert_matches!(
        resolve_account(&missing, None),
        Err(GridError::UserdataNotFound(_))
    );

    std::fs::create_dir_all(missing.join("not-numeric")).unwrap();
    assert_matches!(
        resolve_account(&missing, None),
        Err(GridError::UserdataNotFound(_))
    );
}

#[test]
fn grid_dir_is_created_once() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().join("12345")).unwrap();
    let account = Account::new("12345", root);

    let grid = ensure_grid_dir(&account).unwrap();
    assert!(grid.as_std_path().is_dir());
    assert!(grid.ends_with("config/grid"));
    std::fs::write(grid.join("keep.txt"), b"x").unwrap();

    let again = ensure_grid_dir(&account).unwrap();
    assert_eq!(grid, again);
    assert!(again.join("keep.txt").as_std_path().exists());
}
