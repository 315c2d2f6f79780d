use stowage_i18n::{I18nConfig, I18nError, LocaleCode, init, registry, translate, translate_with};

#[test]
fn registry_initialises_once_and_serves_lookups() -> Result<(), I18nError> {
    assert_eq!(translate("settings.updated"), "Settings updated");

    init(I18nConfig::bundled(LocaleCode::Zh)?)?;
    assert_eq!(registry().active_locale(), "zh");
    assert_eq!(translate("settings.updated"), "设置已更新");
    assert_eq!(
        translate_with("error.duplicate_user", &[("name", "alice")]),
        "User name 'alice' is configured more than once"
    );

    let second = init(I18nConfig::bundled(LocaleCode::En)?);
    assert!(matches!(second, Err(I18nError::AlreadyInitialized)));
    assert_eq!(registry().active_locale(), "zh");
    Ok(())
}
