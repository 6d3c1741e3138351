//! Command handlers for the flextk CLI

pub mod auth;
pub mod cloud;
pub mod config;
pub mod doctor;
pub mod drive;
pub mod media;
pub mod pay;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Command;
use clap_complete::{generate, Shell as ClapShell};
use dialoguer::{Input, Password};
use flextk_core::{load_config, ConfigFile, SecretBox};

/// Handle completion command
pub fn handle_completion(shell: &str, cmd: &mut Command) -> Result<()> {
    let shell_type = match shell.to_lowercase().as_str() {
        "bash" => ClapShell::Bash,
        "zsh" => ClapShell::Zsh,
        "fish" => ClapShell::Fish,
        "elvish" => ClapShell::Elvish,
        "powershell" => ClapShell::PowerShell,
        _ => {
            println!("Unknown shell: {}", shell);
            println!("Available shells: bash, zsh, fish, elvish, powershell");
            return Ok(());
        }
    };

    generate(shell_type, cmd, "flextk", &mut std::io::stdout());
    Ok(())
}

/// Load the config and unlock it with the given or prompted password
pub fn unlock(password: Option<&str>) -> Result<(ConfigFile, SecretBox)> {
    let config = load_config()?;

    if config.match_password.is_none() {
        anyhow::bail!("No password set yet. Run 'flextk config set-password' first.");
    }

    let password = match password {
        Some(p) => p.to_string(),
        None => prompt_password("Configuration password")?,
    };

    let secrets = SecretBox::new(&password)?;
    secrets.verify(&config)?;

    Ok((config, secrets))
}

/// Prompt for a hidden password
pub fn prompt_password(prompt: &str) -> Result<String> {
    Ok(Password::new().with_prompt(prompt).interact()?)
}

/// Use the given value or prompt for one
pub fn prompt_or(value: Option<&str>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v.to_string()),
        None => Ok(Input::<String>::new().with_prompt(prompt).interact_text()?),
    }
}

/// Human-readable byte count
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;

    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Compact timestamp for tables, `-` when missing
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
        assert_eq!(format_bytes(0), "0 B");
    }

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).single();
        assert_eq!(format_date(date), "2024-05-01 12:30:00");
        assert_eq!(format_date(None), "-");
    }
}
