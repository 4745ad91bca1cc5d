//! lb init command implementation
//!
//! Creates the data directory, writes a default config and seeds the task tree.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::Context;
use crate::config::{Config, CONFIG_FILE};
use crate::engine::InitReport;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct InitSummary {
    data_dir: PathBuf,
    created_config: bool,
    tasks: InitReport,
}

pub fn run(ctx: &Context) -> Result<()> {
    let data_dir = ctx.data_dir()?;
    std::fs::create_dir_all(&data_dir)?;

    let config_path = data_dir.join(CONFIG_FILE);
    let created_config = if config_path.exists() {
        if !config_path.is_file() {
            return Err(Error::InvalidConfig(format!(
                "{CONFIG_FILE} exists but is not a file: {}",
                config_path.display()
            )));
        }
        false
    } else {
        Config::default().save(&config_path)?;
        true
    };

    let (_engine, report) = ctx.open_engine_with_report()?;

    let header = if report.seeded || created_config {
        "lb init: initialized data directory"
    } else {
        "lb init: nothing to do"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("data dir", data_dir.display().to_string());
    human.push_summary("config", if created_config { "created" } else { "kept" });
    human.push_summary(
        "tasks",
        if report.seeded {
            format!("{} seeded", report.loaded)
        } else {
            format!("{} loaded", report.loaded)
        },
    );
    human.push_next_step("lb ls");

    emit_success(
        ctx.output(),
        "init",
        &InitSummary {
            data_dir,
            created_config,
            tasks: report,
        },
        Some(&human),
    )
}
