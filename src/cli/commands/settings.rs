//! Settings commands.
//!
//! - `hub settings get <key>` - Print one setting
//! - `hub settings set <key> <value>` - Change one setting
//! - `hub settings list` - Print every setting
//! - `hub settings reset` - Restore defaults

use crate::cli::SettingsCommands;
use crate::error::Result;
use crate::hub::Hub;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Serialize)]
struct SettingOutput<'a> {
    key: &'a str,
    value: Option<&'a str>,
}

#[derive(Serialize)]
struct ResetOutput {
    reset: bool,
    count: usize,
}

/// Execute a settings command.
///
/// # Errors
///
/// Returns [`crate::Error::NotInitialized`] or a storage error.
pub fn execute(command: &SettingsCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut hub = super::open_hub(db_path)?;
    let result = run(&mut hub, command, json);
    super::close(hub);
    result
}

fn run(hub: &mut Hub, command: &SettingsCommands, json: bool) -> Result<()> {
    match command {
        SettingsCommands::Get { key } => {
            let value = hub.settings().value(key);
            if json {
                super::print_json(&SettingOutput { key, value })
            } else {
                match value {
                    Some(value) => println!("{value}"),
                    None => println!("(not set)"),
                }
                Ok(())
            }
        }
        SettingsCommands::Set { key, value } => {
            hub.save_setting(key, value)?;
            if json {
                super::print_json(&SettingOutput {
                    key,
                    value: Some(value.as_str()),
                })
            } else {
                println!("Set {key} = {value}");
                Ok(())
            }
        }
        SettingsCommands::List => {
            let all: BTreeMap<&str, &str> = hub.settings().all();
            if json {
                return super::print_json(&all);
            }
            let width = all.keys().map(|k| k.len()).max().unwrap_or(0);
            for (key, value) in &all {
                println!("  {key:<width$}  {value}");
            }
            Ok(())
        }
        SettingsCommands::Reset => {
            let count = hub.reset_settings()?;
            if json {
                super::print_json(&ResetOutput { reset: true, count })
            } else {
                println!("Restored {count} default settings");
                Ok(())
            }
        }
    }
}
