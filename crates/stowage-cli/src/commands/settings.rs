use std::io::{self, IsTerminal};

use anyhow::anyhow;
use stowage_config::{ConfigError, Draft, SettingsSession, validate};
use stowage_i18n::{translate, translate_with};

use crate::cli::{AppContext, EditArgs};
use crate::client::{CliError, CliResult};
use crate::output::{format_config, format_preview, format_setup_notice, print};

pub(crate) async fn handle_settings_show(ctx: &AppContext) -> CliResult<()> {
    let session = SettingsSession::load(ctx.deps.clone()).await?;
    print(&format_config(session.current(), ctx.output)?);
    if session.needs_initial_setup() {
        eprintln!("{}", format_setup_notice(ctx.recovery_path.as_deref()));
    }
    session.cancel();
    Ok(())
}

pub(crate) async fn handle_settings_edit(ctx: &AppContext, args: EditArgs) -> CliResult<()> {
    let mut session = SettingsSession::load(ctx.deps.clone()).await?;
    if session.needs_initial_setup() {
        eprintln!("{}", format_setup_notice(ctx.recovery_path.as_deref()));
    }

    apply_edits(session.draft_mut(), &args)?;

    if args.dry_run {
        print(&format_preview(session.draft(), ctx.output)?);
        validate(session.draft()).map_err(ConfigError::from)?;
        session.cancel();
        eprintln!("{}", translate("settings.cancelled"));
        return Ok(());
    }

    let committed = session.submit().await?;
    committed
        .reload
        .await
        .map_err(|err| CliError::failure(anyhow!("reload task failed: {err}")))?;
    print(&format_config(&committed.config, ctx.output)?);
    Ok(())
}

/// Apply command-line edits to the draft in a fixed order: instance, auth
/// toggle, removals, additions, password changes.
pub(crate) fn apply_edits(draft: &mut Draft, args: &EditArgs) -> CliResult<()> {
    if let Some(instance) = &args.instance {
        draft.set_instance(instance.as_str())?;
    }
    if args.disable_auth {
        draft.set_auth_disabled(true);
    } else if args.enable_auth {
        draft.set_auth_disabled(false);
    }

    for name in &args.remove_users {
        let index = find_user(draft, name)?;
        draft.remove_user(index)?;
    }

    for name in &args.add_users {
        let password = resolve_password(name, args.password.as_deref())?;
        let index = draft.add_user();
        draft.set_user_name(index, name.as_str())?;
        draft.set_user_password(index, password)?;
    }

    for name in &args.set_passwords {
        let index = find_user(draft, name)?;
        let password = resolve_password(name, args.password.as_deref())?;
        draft.begin_password_edit(index)?;
        draft.set_user_password(index, password)?;
    }
    Ok(())
}

fn find_user(draft: &Draft, name: &str) -> CliResult<usize> {
    draft
        .user_index(name)
        .ok_or_else(|| CliError::validation(translate_with("error.unknown_user", &[("name", name)])))
}

pub(crate) fn resolve_password(name: &str, provided: Option<&str>) -> CliResult<String> {
    if let Some(value) = provided {
        if value.is_empty() {
            return Err(CliError::validation(translate(
                "validation.user.password_required",
            )));
        }
        return Ok(value.to_string());
    }

    if io::stdin().is_terminal() {
        let password = rpassword::prompt_password(format!("Password for {name}: ")).map_err(
            |err| CliError::failure(anyhow!("failed to read password from stdin: {err}")),
        )?;
        if password.is_empty() {
            return Err(CliError::validation(translate(
                "validation.user.password_required",
            )));
        }
        Ok(password)
    } else {
        Err(CliError::validation(format!(
            "password for '{name}' required; supply via --password or STOWAGE_PASSWORD when running non-interactively"
        )))
    }
}
