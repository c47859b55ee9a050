use crate::config::{CONFIG_FILE_NAME, GroomConfig, SprintSettings, TeamCapacity};
use crate::error::GroomError;
use anyhow::{Context, Result};
use colored::Colorize;

pub fn handle_init(
    velocity: u32,
    team_size: u32,
    ready_max_effort: u32,
    goals: Vec<String>,
    force: bool,
) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config_path = cwd.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        return Err(GroomError::AlreadyInitialized(config_path.display().to_string()).into());
    }

    let config = GroomConfig {
        team: TeamCapacity {
            velocity,
            team_size,
            ..TeamCapacity::default()
        },
        sprint: SprintSettings {
            goals,
            ready_max_effort,
        },
        ..GroomConfig::default()
    };
    config.validate().context("Invalid init options")?;
    config.save(&config_path)?;

    println!("{} groom project in {}", "Initialized".green(), cwd.display());
    println!("  Config:   {}", config_path.display());
    println!(
        "  Velocity: {} pts/sprint, team of {}",
        config.team.velocity, config.team.team_size
    );
    if !config.sprint.goals.is_empty() {
        println!("  Goals:    {}", config.sprint.goals.join("; "));
    }

    Ok(())
}
