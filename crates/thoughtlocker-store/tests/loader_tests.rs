use rusqlite::Connection;
use thoughtlocker::PromptSpec;
use thoughtlocker_store::{LoadReport, StoreError, apply_specs, repository, schema};

fn create_conn() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    schema::migrations().to_latest(&mut conn).unwrap();
    conn
}

fn spec(name: &str, instruction: &str) -> PromptSpec {
    let mut spec = PromptSpec::new(name, instruction);
    spec.provider = Some("openai".into());
    spec
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        .unwrap()
}

#[test]
fn apply_counts_created_updated_and_unchanged() {
    let mut conn = create_conn();

    let first = apply_specs(&mut conn, &[spec("a", "one"), spec("b", "two")]).unwrap();
    assert_eq!(
        first,
        LoadReport {
            created: 2,
            updated: 0,
            unchanged: 0
        }
    );

    let second = apply_specs(&mut conn, &[spec("a", "one"), spec("b", "changed")]).unwrap();
    assert_eq!(
        second,
        LoadReport {
            created: 0,
            updated: 1,
            unchanged: 1
        }
    );

    assert_eq!(count(&conn, "prompt_spec_versions"), 3);
}

#[test]
fn apply_fills_in_missing_checksums() {
    let mut conn = create_conn();
    let bare = spec("a", "one");
    assert!(bare.checksum.is_none());

    apply_specs(&mut conn, &[bare.clone()]).unwrap();

    let stored = repository::get_by_name(&conn, "a").unwrap().unwrap();
    assert_eq!(stored.checksum, Some(bare.compute_checksum()));
}

#[test]
fn failure_mid_batch_rolls_back_everything() {
    let mut conn = create_conn();
    conn.execute_batch(
        "CREATE TRIGGER reject_boom BEFORE INSERT ON prompt_specs
         WHEN NEW.name = 'boom'
         BEGIN SELECT RAISE(ABORT, 'boom rejected'); END;",
    )
    .unwrap();

    let result = apply_specs(&mut conn, &[spec("a", "one"), spec("boom", "two")]);

    assert!(matches!(result, Err(StoreError::Database(_))));
    assert_eq!(count(&conn, "prompt_specs"), 0);
    assert_eq!(count(&conn, "prompt_spec_versions"), 0);
}

#[test]
fn failed_history_append_rolls_back_the_main_write() {
    let mut conn = create_conn();
    conn.execute_batch(
        "CREATE TRIGGER reject_history BEFORE INSERT ON prompt_spec_versions
         BEGIN SELECT RAISE(ABORT, 'history rejected'); END;",
    )
    .unwrap();

    assert!(apply_specs(&mut conn, &[spec("a", "one")]).is_err());
    assert_eq!(count(&conn, "prompt_specs"), 0);
}
