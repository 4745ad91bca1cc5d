use std::fs;

use lifeboard::config::{Config, CONFIG_FILE};

#[test]
fn config_defaults_when_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config::load_from_dir(dir.path());

    assert_eq!(config.archive.hide_days, 7);
    assert_eq!(config.calendar.start_hour, 8);
    assert_eq!(config.calendar.end_hour, 18);
    assert_eq!(config.dashboard.upcoming_days, 7);
    assert_eq!(config.display.breadcrumb_max_len, 50);
}

#[test]
fn config_overrides_from_toml() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let toml = r#"
[archive]
hide_days = 14

[calendar]
start_hour = 6
event_minutes = 30

[dashboard]
highlights = 3
"#;
    fs::write(dir.path().join(CONFIG_FILE), toml)?;

    let config = Config::load_from_dir(dir.path());

    assert_eq!(config.archive.hide_days, 14);
    assert_eq!(config.calendar.start_hour, 6);
    assert_eq!(config.calendar.end_hour, 18);
    assert_eq!(config.calendar.event_minutes, 30);
    assert_eq!(config.dashboard.highlights, 3);
    assert_eq!(config.dashboard.due_soon_days, 3);

    Ok(())
}

#[test]
fn invalid_config_falls_back_to_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(
        dir.path().join(CONFIG_FILE),
        "[calendar]\nstart_hour = 20\nend_hour = 9\n",
    )?;

    assert!(Config::load(&dir.path().join(CONFIG_FILE)).is_err());
    assert_eq!(Config::load_from_dir(dir.path()), Config::default());

    Ok(())
}

#[test]
fn saved_config_loads_back() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(CONFIG_FILE);
    let mut config = Config::default();
    config.archive.hide_days = 30;
    config.save(&path)?;

    assert_eq!(Config::load(&path)?, config);
    Ok(())
}
