use std::io::Write;

use thoughtlocker::{LoadError, PromptSpec, SearchQuery, VersionAction};
use thoughtlocker_store::{LoadReport, Locker, StoreError};

const GREETER: &str = "\
greeter:
  description: d
  provider: openai
  model: gpt-x
  web_search: false
  reasoning_effort: low
  context_size: small
  temperature: 0.5
  max_output_tokens: 100
  system_instruction: Be nice.
  aliases: [hello]
  tags: [chat]
";

fn create_locker() -> Locker {
    Locker::open_in_memory().unwrap()
}

fn report(created: u64, updated: u64, unchanged: u64) -> LoadReport {
    LoadReport {
        created,
        updated,
        unchanged,
    }
}

#[test]
fn seeding_into_empty_store_creates_records() {
    let locker = create_locker();

    assert_eq!(locker.seed_from_str(GREETER).unwrap(), report(1, 0, 0));
    assert_eq!(
        locker.get("greeter").unwrap().system_instruction,
        "Be nice."
    );
}

#[test]
fn reseeding_identical_input_changes_nothing() {
    let locker = create_locker();
    locker.seed_from_str(GREETER).unwrap();

    assert_eq!(locker.seed_from_str(GREETER).unwrap(), report(0, 0, 1));
    assert_eq!(locker.history("greeter").unwrap().len(), 1);
}

#[test]
fn reseeding_changed_required_field_updates() {
    let locker = create_locker();
    locker.seed_from_str(GREETER).unwrap();

    let changed = GREETER.replace("temperature: 0.5", "temperature: 0.9");
    assert_eq!(locker.seed_from_str(&changed).unwrap(), report(0, 1, 0));

    let history = locker.history("greeter").unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].action, VersionAction::Update);
    assert_eq!(history[1].spec.temperature, Some(0.9));
}

#[test]
fn reseeding_metadata_only_change_is_skipped() {
    let locker = create_locker();
    locker.seed_from_str(GREETER).unwrap();

    let retagged = GREETER.replace("tags: [chat]", "tags: [chat, new]");
    assert_eq!(locker.seed_from_str(&retagged).unwrap(), report(0, 0, 1));
    assert_eq!(locker.get("greeter").unwrap().tags, Some(vec!["chat".into()]));
}

#[test]
fn invalid_batch_writes_nothing() {
    let locker = create_locker();
    let batch = format!(
        "{GREETER}broken:
  description: missing everything else
"
    );

    let err = locker.seed_from_str(&batch).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Load(LoadError::MissingField { ref name, .. }) if name == "broken"
    ));
    assert!(locker.try_get("greeter").unwrap().is_none());
}

#[test]
fn non_mapping_input_is_rejected() {
    let locker = create_locker();
    let err = locker.seed_from_str("- just\n- a list\n").unwrap_err();
    assert!(matches!(err, StoreError::Load(LoadError::InvalidRoot)));
}

#[test]
fn get_reports_not_found_and_try_get_returns_none() {
    let locker = create_locker();

    assert!(matches!(
        locker.get("missing"),
        Err(StoreError::NotFound(ref key)) if key == "missing"
    ));
    assert!(locker.try_get("missing").unwrap().is_none());
    assert!(matches!(
        locker.get_system_instruction("missing"),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn lookups_accept_aliases() {
    let locker = create_locker();
    locker.seed_from_str(GREETER).unwrap();

    assert_eq!(locker.get("hello").unwrap().name, "greeter");
    assert_eq!(locker.get_system_instruction("hello").unwrap(), "Be nice.");
}

#[test]
fn upsert_runs_in_its_own_transaction() {
    let locker = create_locker();
    let spec = PromptSpec::new("direct", "Hi.");

    let first = locker.upsert(&spec).unwrap();
    let second = locker.upsert(&spec).unwrap();

    assert_eq!(first.action, VersionAction::Insert);
    assert_eq!(second.action, VersionAction::Update);
    assert_eq!(second.version_seq, 2);
}

#[test]
fn list_and_search_go_through_the_locker() {
    let locker = create_locker();
    locker.seed_from_str(GREETER).unwrap();

    assert_eq!(locker.list(None).unwrap().len(), 1);
    assert!(locker.list(Some(false)).unwrap().is_empty());
    assert_eq!(
        locker
            .search(&SearchQuery::new().text("NICE").tag("chat"))
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn close_is_idempotent_and_blocks_further_use() {
    let locker = create_locker();
    assert!(locker.list(None).is_ok());

    locker.close();
    locker.close();

    assert!(matches!(locker.list(None), Err(StoreError::Closed)));
    assert!(matches!(locker.get("x"), Err(StoreError::Closed)));
}

#[test]
fn file_backed_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("prompts.db");
    let yaml_path = dir.path().join("prompts.yaml");
    std::fs::File::create(&yaml_path)
        .unwrap()
        .write_all(GREETER.as_bytes())
        .unwrap();

    let locker = Locker::open(&db_path).unwrap();
    assert_eq!(locker.seed_from_yaml(&yaml_path).unwrap(), report(1, 0, 0));
    locker.close();

    let reopened = Locker::open(&db_path).unwrap();
    assert_eq!(reopened.get("greeter").unwrap().provider.as_deref(), Some("openai"));
    assert_eq!(
        reopened.seed_from_yaml(&yaml_path).unwrap(),
        report(0, 0, 1)
    );
}

#[test]
fn missing_yaml_file_is_a_load_error() {
    let locker = create_locker();
    let dir = tempfile::tempdir().unwrap();
    let err = locker
        .seed_from_yaml(&dir.path().join("nope.yaml"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Load(LoadError::Io { .. })));
}
