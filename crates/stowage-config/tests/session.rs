use std::time::Duration;

use serde_json::json;
use stowage_config::{
    ConfigError, Configuration, Credential, Draft, ERROR_DISPLAY, SUCCESS_DISPLAY,
    SettingsSession, commit, validate,
};
use stowage_test_support::fixtures::{blank_config, configured_config};
use stowage_test_support::mocks::{FakeStack, PrefixHasher, RecordingBackend};

fn session_over(stack: &FakeStack, current: Configuration) -> SettingsSession {
    SettingsSession::open(current, stack.deps())
}

#[tokio::test]
async fn first_time_setup_hashes_and_sends_merged_document() -> anyhow::Result<()> {
    let stack = FakeStack::new(blank_config());
    let mut session = session_over(&stack, blank_config());
    assert!(session.needs_initial_setup());

    let draft = session.draft_mut();
    draft.set_instance("home-1")?;
    let index = draft.add_user();
    draft.set_user_name(index, "alice")?;
    draft.begin_password_edit(index)?;
    draft.set_user_password(index, "secret123")?;

    let committed = session.submit().await?;

    assert_eq!(stack.hasher.calls(), ["secret123"]);
    let sent = stack.backend.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        serde_json::to_value(&sent[0])?,
        json!({
            "instance": "home-1",
            "auth": {
                "disabled": false,
                "users": [{"name": "alice", "passwordHash": "h:secret123"}]
            },
            "otherField": "X"
        })
    );
    assert!(!serde_json::to_string(&sent[0])?.contains("needsHashing"));

    committed.reload.await?;
    assert_eq!(stack.reloader.count(), 1);
    assert_eq!(
        stack.notifier.successes(),
        [("Settings updated".to_string(), SUCCESS_DISPLAY)]
    );
    assert!(stack.notifier.errors().is_empty());
    Ok(())
}

#[tokio::test]
async fn enabled_auth_without_users_never_reaches_backend() -> anyhow::Result<()> {
    let stack = FakeStack::new(blank_config());
    let mut session = session_over(&stack, blank_config());
    session.draft_mut().set_instance("home-1")?;

    let err = session.submit().await.unwrap_err();

    assert!(matches!(err, ConfigError::InvalidAuthState));
    assert!(stack.backend.sent().is_empty());
    assert_eq!(stack.reloader.count(), 0);
    let errors = stack.notifier.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1, ERROR_DISPLAY);
    assert!(errors[0].0.starts_with("Operation error: At least one user"));
    Ok(())
}

#[tokio::test]
async fn disabled_auth_commits_with_or_without_users() -> anyhow::Result<()> {
    let stack = FakeStack::new(blank_config());
    let mut session = session_over(&stack, blank_config());
    session.draft_mut().set_instance("open-box")?;
    session.draft_mut().set_auth_disabled(true);
    let committed = session.submit().await?;
    assert!(committed.config.auth.disabled);
    assert!(committed.config.auth.users.is_empty());

    let stack = FakeStack::new(configured_config());
    let mut session = session_over(&stack, configured_config());
    session.draft_mut().set_auth_disabled(true);
    let committed = session.submit().await?;
    assert_eq!(committed.config.auth.users.len(), 1);
    assert!(stack.hasher.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_instance_is_rejected_before_hashing() -> anyhow::Result<()> {
    for bad in ["home 1", "home/1", ""] {
        let stack = FakeStack::new(blank_config());
        let mut session = session_over(&stack, blank_config());
        let draft = session.draft_mut();
        draft.set_instance(bad)?;
        let index = draft.add_user();
        draft.set_user_name(index, "alice")?;
        draft.set_user_password(index, "pw")?;

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, ConfigError::FieldValidation(_)), "{bad:?}");
        assert!(stack.hasher.calls().is_empty());
        assert!(stack.backend.sent().is_empty());
    }
    Ok(())
}

#[tokio::test]
async fn hash_failure_aborts_and_retry_rehashes_same_set() -> anyhow::Result<()> {
    let stack = FakeStack::new(configured_config());
    let mut session = session_over(&stack, configured_config());
    let draft = session.draft_mut();
    draft.set_user_password(0, "alice-new")?;
    let bob = draft.add_user();
    draft.set_user_name(bob, "bob")?;
    draft.set_user_password(bob, "bob-pass")?;
    let before = session.draft().clone();

    stack.hasher.fail_on(Some("bob-pass"));
    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, ConfigError::HashService { ref user, .. } if user == "bob"));
    assert!(stack.backend.sent().is_empty());
    assert_eq!(session.draft(), &before);
    assert_eq!(session.current(), &configured_config());

    stack.hasher.fail_on(None);
    session.submit().await?;
    assert_eq!(
        stack.hasher.calls(),
        ["alice-new", "bob-pass", "alice-new", "bob-pass"]
    );
    let sent = stack.backend.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].auth.users[0].password_hash, "h:alice-new");
    assert_eq!(sent[0].auth.users[1].password_hash, "h:bob-pass");
    Ok(())
}

#[tokio::test]
async fn passthrough_fields_are_sent_verbatim() -> anyhow::Result<()> {
    let original = configured_config();
    let stack = FakeStack::new(original.clone());
    let mut session = session_over(&stack, original.clone());
    session.draft_mut().set_user_password(0, "rotated")?;
    session.submit().await?;

    let sent = stack.backend.sent();
    assert_eq!(
        sent[0].passthrough.keys().collect::<Vec<_>>(),
        original.passthrough.keys().collect::<Vec<_>>()
    );
    for key in original.passthrough.keys() {
        assert_eq!(
            sent[0].passthrough.get(key),
            original.passthrough.get(key),
            "pass-through field {key} changed"
        );
    }
    Ok(())
}

#[tokio::test]
async fn non_canonical_numbers_reach_backend_byte_for_byte() -> anyhow::Result<()> {
    let current: Configuration = serde_json::from_str(
        r#"{"instance":"home-1","auth":{"disabled":false,"users":[{"name":"alice","passwordHash":"$argon2id$alice"}]},"ratio":1.50,"big":1e3,"huge":18446744073709551616}"#,
    )?;
    let mut draft = Draft::from_config(&current);
    draft.set_user_password(0, "rotated")?;
    let validated = validate(&draft).map_err(ConfigError::from)?;

    let backend = RecordingBackend::new(current.clone());
    commit(&current, &validated, &PrefixHasher::default(), &backend).await?;

    let body = serde_json::to_string(&backend.sent()[0])?;
    assert!(
        body.ends_with(r#""ratio":1.50,"big":1e3,"huge":18446744073709551616}"#),
        "unexpected body {body}"
    );
    Ok(())
}

#[tokio::test]
async fn server_reply_becomes_canonical_state() -> anyhow::Result<()> {
    fn bump_modno(mut config: Configuration) -> Configuration {
        config
            .passthrough
            .insert("modno", &8)
            .expect("integer serialises");
        config
    }
    let backend = RecordingBackend::new(configured_config()).with_canonicalize(bump_modno);
    let stack = FakeStack::with_backend(backend);
    let mut session = session_over(&stack, configured_config());
    session.draft_mut().set_user_password(0, "rotated")?;

    let committed = session.submit().await?;

    assert_eq!(stack.backend.sent()[0].passthrough.get("modno"), Some("7"));
    assert_eq!(committed.config.passthrough.get("modno"), Some("8"));
    assert_eq!(session.current(), &committed.config);
    assert_eq!(
        session.draft().users()[0].credential,
        Credential::Hashed("h:rotated".into())
    );
    assert!(session.draft().instance_locked());
    Ok(())
}

#[tokio::test]
async fn commit_failure_leaves_state_for_retry() -> anyhow::Result<()> {
    let stack = FakeStack::new(configured_config());
    let mut session = session_over(&stack, configured_config());
    session.draft_mut().set_user_password(0, "rotated")?;
    let before = session.draft().clone();

    stack.backend.fail_with(Some("config modno mismatch"));
    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, ConfigError::Commit { .. }));
    assert_eq!(session.draft(), &before);
    assert_eq!(session.current(), &configured_config());
    assert!(stack.notifier.errors()[0].0.contains("config modno mismatch"));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(stack.reloader.count(), 0);

    stack.backend.fail_with(None);
    session.submit().await?;
    assert_eq!(stack.backend.sent().len(), 2);
    Ok(())
}

#[tokio::test]
async fn duplicate_user_names_are_rejected_locally() -> anyhow::Result<()> {
    let stack = FakeStack::new(configured_config());
    let mut session = session_over(&stack, configured_config());
    let draft = session.draft_mut();
    let index = draft.add_user();
    draft.set_user_name(index, "alice")?;
    draft.set_user_password(index, "second")?;

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateUserName { ref name } if name == "alice"));
    assert!(stack.hasher.calls().is_empty());
    assert!(stack.backend.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn draft_from_another_document_cannot_rename_instance() -> anyhow::Result<()> {
    let mut draft = Draft::from_config(&blank_config());
    draft.set_instance("elsewhere")?;
    let index = draft.add_user();
    draft.set_user_name(index, "bob")?;
    draft.set_user_password(index, "b-pass")?;
    let validated = validate(&draft).map_err(ConfigError::from)?;

    let current = configured_config();
    let hasher = PrefixHasher::default();
    let backend = RecordingBackend::new(current.clone());
    let err = commit(&current, &validated, &hasher, &backend)
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::ImmutableField { field: "instance" }));
    assert!(hasher.calls().is_empty());
    assert!(backend.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn load_reads_backend_and_cancel_has_no_side_effects() -> anyhow::Result<()> {
    let stack = FakeStack::new(configured_config());
    let mut session = SettingsSession::load(stack.deps()).await?;
    assert_eq!(session.current(), &configured_config());
    session.draft_mut().set_auth_disabled(true);
    session.cancel();

    assert!(stack.backend.sent().is_empty());
    assert!(stack.hasher.calls().is_empty());
    assert!(stack.notifier.successes().is_empty());
    assert!(stack.notifier.errors().is_empty());
    Ok(())
}

#[tokio::test]
async fn standalone_commit_hashes_merges_and_replaces() -> anyhow::Result<()> {
    let current = configured_config();
    let mut draft = Draft::from_config(&current);
    draft.set_user_password(0, "rotated")?;
    let validated = validate(&draft).map_err(ConfigError::from)?;

    let hasher = PrefixHasher::default();
    let backend = RecordingBackend::new(current.clone());
    let accepted = commit(&current, &validated, &hasher, &backend).await?;

    assert_eq!(hasher.calls(), ["rotated"]);
    assert_eq!(backend.sent(), [accepted.clone()]);
    assert_eq!(accepted.auth.users[0].password_hash, "h:rotated");
    assert_eq!(accepted.passthrough, current.passthrough);
    Ok(())
}
