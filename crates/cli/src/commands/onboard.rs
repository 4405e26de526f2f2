//! `alfred onboard` — write a starter configuration file.

use alfred_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let dir = AppConfig::config_dir();
    let path = dir.join("config.toml");

    if path.exists() {
        println!("  Config already exists at {}", path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&dir)?;
    std::fs::write(&path, AppConfig::default_toml())?;

    println!("  Wrote starter config to {}", path.display());
    println!("  Add your API keys there (or set ALFRED_API_KEYS) and run `alfred chat`.");
    Ok(())
}
