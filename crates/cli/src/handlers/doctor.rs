//! Handlers for the `doctor` command group

use anyhow::Result;
use flextk_core::media::tools::ALL_TOOLS;
use flextk_core::{config_exists, get_config_path, load_config};

/// Check the configuration file and probe the media tools
pub async fn handle_check() -> Result<()> {
    println!("{}", console::style("Checking flextk installation...").bold());
    println!();

    println!("Configuration:");
    if config_exists() {
        let config = load_config()?;
        println!("  ✅ Config file: {}", get_config_path()?.display());
        if config.match_password.is_some() {
            println!("  ✅ Password is set");
        } else {
            println!("  ⚠️  No password set (run 'flextk config set-password')");
        }
    } else {
        println!("  ⚠️  No config file yet (run 'flextk config set-password')");
    }

    println!();
    println!("Media tools:");
    for tool in ALL_TOOLS {
        if tool.is_installed().await {
            println!("  ✅ {}", tool);
        } else {
            println!("  ⚠️  {} not found. {}", tool, tool.install_hint());
        }
    }

    Ok(())
}
