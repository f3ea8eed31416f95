//! `parley config`: print the effective configuration.

use std::path::Path;

use console::style;
use parley_infra::config::{load_config, render_config};

/// Print the configuration loaded from `path` as TOML on stdout.
///
/// Credentials are never part of the file, so nothing secret is printed.
pub async fn show_config(path: &Path) -> anyhow::Result<()> {
    let config = load_config(path).await?;
    let rendered = render_config(&config)?;

    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, defaults)", path.display())
    };
    eprintln!("{} {}", style("#").dim(), style(source).dim());
    print!("{rendered}");
    Ok(())
}
