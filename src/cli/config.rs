use std::path::Path;

use anyhow::{anyhow, bail, Result};
use clap::Subcommand;
use serde_json::Value;

use crate::{
    phone::normalize_e164,
    settings::{
        store::{SettingsHandle, SettingsStore},
        Settings,
    },
};

pub const INVALID_PHONE: &str =
    "Enter a valid phone number with +country code. Example: +358401234567";

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    #[command(about = "Print the current settings")]
    Show,
    #[command(about = "Print where the settings are stored")]
    Path,
    #[command(about = "Restore every setting to its default")]
    Reset,
    #[command(about = "Change a single setting. Weekdays are set with notify_days.<mon..sun>")]
    Set { key: String, value: String },
}

pub async fn process_config_command(dir: &Path, command: ConfigCommand) -> Result<()> {
    let mut settings = SettingsHandle::open(SettingsStore::new(dir)).await;
    match command {
        ConfigCommand::Show => {
            println!("{}", settings.current().to_document()?);
        }
        ConfigCommand::Path => {
            println!("{}", settings.store().path().display());
        }
        ConfigCommand::Reset => {
            settings.save(Settings::default()).await?;
            println!("Settings were reset");
        }
        ConfigCommand::Set { key, value } => {
            let updated = apply_setting(&settings.current(), &key, &value)?;
            settings.save(updated).await?;
            println!("{key} updated");
        }
    }
    Ok(())
}

/// Returns `settings` with `key` set to `raw`. The value is parsed according to the kind of the
/// current value and the result is validated like any loaded document. Sms can't be enabled
/// without a usable phone number.
pub fn apply_setting(settings: &Settings, key: &str, raw: &str) -> Result<Settings> {
    let Value::Object(mut document) = serde_json::to_value(settings)? else {
        bail!("Settings are not an object");
    };

    let (head, tail) = match key.split_once('.') {
        Some((head, tail)) => (head, Some(tail)),
        None => (key, None),
    };
    let mut slot = document
        .get_mut(head)
        .ok_or_else(|| anyhow!("Unknown setting {key:?}"))?;
    if let Some(tail) = tail {
        slot = slot
            .as_object_mut()
            .and_then(|v| v.get_mut(tail))
            .ok_or_else(|| anyhow!("Unknown setting {key:?}"))?;
    }

    let raw = raw.trim();
    *slot = match slot {
        Value::Object(_) => bail!("{key} is a group, set one of its keys. Example: {key}.mon"),
        Value::Bool(_) => Value::Bool(parse_flag(raw)?),
        Value::Number(_) => Value::from(
            raw.parse::<i64>()
                .map_err(|_| anyhow!("{key} expects a whole number, got {raw:?}"))?,
        ),
        _ if key == "sms_phone_e164" => {
            if raw.is_empty() {
                Value::from("")
            } else {
                Value::from(normalize_e164(raw).ok_or_else(|| anyhow!(INVALID_PHONE))?)
            }
        }
        _ => Value::from(raw),
    };

    let updated = Settings::from_map(document).validated();
    if updated.enable_sms_clock_out_reminder && normalize_e164(&updated.sms_phone_e164).is_none() {
        bail!(INVALID_PHONE);
    }
    Ok(updated)
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(anyhow!("Expected true or false, got {raw:?}")),
    }
}
