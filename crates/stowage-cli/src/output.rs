//! Output renderers and formatting helpers for CLI commands.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::anyhow;
use serde::Serialize;
use stowage_config::{Configuration, Draft};
use stowage_i18n::{translate, translate_with};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

fn to_json<T: Serialize>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

/// Render the committed configuration. Pass-through fields are listed by key only.
pub(crate) fn format_config(config: &Configuration, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(config),
        OutputFormat::Table => {
            let unset = translate("show.unset");
            let instance = if config.instance.is_empty() {
                unset.as_str()
            } else {
                config.instance.as_str()
            };
            let mut out = String::new();
            let _ = writeln!(out, "{}: {instance}", translate("show.instance"));
            let _ = writeln!(
                out,
                "{}: {}",
                translate("show.auth_disabled"),
                config.auth.disabled
            );
            let _ = writeln!(out, "{}:", translate("show.users"));
            if config.auth.users.is_empty() {
                let _ = writeln!(out, "  {}", translate("show.none"));
            }
            for user in &config.auth.users {
                let _ = writeln!(out, "  {}", user.name);
            }
            if !config.passthrough.is_empty() {
                let keys: Vec<&str> = config.passthrough.keys().collect();
                let _ = writeln!(out, "other fields: {}", keys.join(", "));
            }
            Ok(out)
        }
    }
}

/// Render the draft preview with pending passwords masked.
pub(crate) fn format_preview(draft: &Draft, format: OutputFormat) -> CliResult<String> {
    let body = to_json(&draft.preview())?;
    Ok(match format {
        OutputFormat::Json => body,
        OutputFormat::Table => format!("{}\n{body}", translate("settings.preview_title")),
    })
}

/// Localized initial-setup notice pointing at the recovery file.
pub(crate) fn format_setup_notice(recovery_path: Option<&Path>) -> String {
    let path = recovery_path.map_or_else(
        || translate("show.unset"),
        |path| path.display().to_string(),
    );
    format!(
        "{}\n{}\n{}",
        translate("setting.setup.title"),
        translate("setting.setup.body"),
        translate_with("setting.setup.recovery", &[("path", path.as_str())])
    )
}

pub(crate) fn print(text: &str) {
    println!("{}", text.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_test_support::fixtures::{blank_config, configured_config};

    #[test]
    fn table_lists_users_and_passthrough_keys() -> CliResult<()> {
        let text = format_config(&configured_config(), OutputFormat::Table)?;
        assert!(text.contains("Instance: home-1"));
        assert!(text.contains("  alice"));
        assert!(text.contains("other fields: modno"));
        assert!(!text.contains("$argon2id"));
        Ok(())
    }

    #[test]
    fn table_marks_missing_values() -> CliResult<()> {
        let text = format_config(&blank_config(), OutputFormat::Table)?;
        assert!(text.contains("Instance: (unset)"));
        assert!(text.contains("(none)"));
        Ok(())
    }

    #[test]
    fn json_output_is_the_wire_document() -> CliResult<()> {
        let text = format_config(&configured_config(), OutputFormat::Json)?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|err| CliError::failure(anyhow!("{err}")))?;
        assert_eq!(value["auth"]["users"][0]["name"], "alice");
        assert_eq!(value["modno"], 7);
        Ok(())
    }

    #[test]
    fn preview_masks_pending_passwords() -> CliResult<()> {
        let mut draft = Draft::from_config(&configured_config());
        draft.set_user_password(0, "hunter2")?;
        let text = format_preview(&draft, OutputFormat::Table)?;
        assert!(text.starts_with("Pending changes"));
        assert!(!text.contains("hunter2"));
        assert!(text.contains("needsHashing"));
        Ok(())
    }

    #[test]
    fn setup_notice_names_recovery_file() {
        let notice = format_setup_notice(Some(Path::new("/etc/stowage/config.json")));
        assert!(notice.starts_with("Initial setup!"));
        assert!(notice.contains("(typically /etc/stowage/config.json)"));
        assert!(format_setup_notice(None).contains("(typically (unset))"));
    }
}
