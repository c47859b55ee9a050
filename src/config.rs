use crate::error::{GroomError, Result};
use crate::pipeline::themes::Theme;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".groom.yml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroomConfig {
    #[serde(default)]
    pub team: TeamCapacity,

    #[serde(default)]
    pub sprint: SprintSettings,

    #[serde(default)]
    pub scoring: ScoringWeights,

    #[serde(default)]
    pub clustering: ClusterSettings,

    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub ingest: IngestSettings,

    /// Extra themes appended after the built-in table
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub themes: Vec<Theme>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamCapacity {
    /// Story points the team completes per sprint
    #[serde(default = "default_velocity")]
    pub velocity: u32,

    #[serde(default = "default_team_size")]
    pub team_size: u32,

    /// Planning horizon in sprints
    #[serde(default = "default_sprints")]
    pub sprints: u32,
}

fn default_velocity() -> u32 {
    45
}

fn default_team_size() -> u32 {
    8
}

fn default_sprints() -> u32 {
    12
}

impl Default for TeamCapacity {
    fn default() -> Self {
        Self {
            velocity: default_velocity(),
            team_size: default_team_size(),
            sprints: default_sprints(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintSettings {
    #[serde(default)]
    pub goals: Vec<String>,

    /// Largest effort an item may carry and still count as sprint-ready
    #[serde(default = "default_ready_max_effort")]
    pub ready_max_effort: u32,
}

fn default_ready_max_effort() -> u32 {
    8
}

impl Default for SprintSettings {
    fn default() -> Self {
        Self {
            goals: Vec::new(),
            ready_max_effort: default_ready_max_effort(),
        }
    }
}

/// Weights behind effort, ROI, risk and priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Allowed effort values, strictly increasing
    pub effort_scale: Vec<u32>,

    pub bug_effort: u32,
    pub story_effort: u32,
    pub feature_effort: u32,
    pub spike_effort: u32,

    /// Time-box for research items
    pub spike_effort_ceiling: u32,

    pub max_scope_steps: u32,

    pub bug_impact: u32,
    pub story_impact: u32,
    pub feature_impact: u32,
    pub spike_impact: u32,

    pub revenue_impact: u32,
    pub urgency_impact: u32,
    pub reach_impact: u32,

    /// ROI points per scale step below the largest effort
    pub efficiency_step: u32,

    pub goal_boost: u32,
    pub max_goal_matches: u32,

    pub critical_threshold: i32,
    pub high_threshold: i32,
    pub medium_threshold: i32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            effort_scale: vec![1, 2, 3, 5, 8, 13, 21],
            bug_effort: 2,
            story_effort: 5,
            feature_effort: 8,
            spike_effort: 3,
            spike_effort_ceiling: 5,
            max_scope_steps: 2,
            bug_impact: 40,
            story_impact: 45,
            feature_impact: 40,
            spike_impact: 20,
            revenue_impact: 20,
            urgency_impact: 10,
            reach_impact: 5,
            efficiency_step: 5,
            goal_boost: 15,
            max_goal_matches: 2,
            critical_threshold: 6,
            high_threshold: 4,
            medium_threshold: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSettings {
    /// Minimum similarity for an item to join an existing epic
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Added to similarity when item and cluster share a theme
    #[serde(default = "default_theme_bonus")]
    pub theme_bonus: f64,
}

fn default_threshold() -> f64 {
    0.35
}

fn default_theme_bonus() -> f64 {
    0.5
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            theme_bonus: default_theme_bonus(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Run per-item rewriting and scoring on the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Wall-clock budget per stage; exceeding it fails the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_budget_ms: Option<u64>,
}

fn default_parallel() -> bool {
    true
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            stage_budget_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestSettings {
    /// Assign generated ids to records that arrive without one
    #[serde(default)]
    pub generate_missing_ids: bool,

    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    #[serde(default = "default_id_length")]
    pub id_length: usize,
}

fn default_id_prefix() -> String {
    "RAW-".to_string()
}

fn default_id_length() -> usize {
    5
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            generate_missing_ids: false,
            id_prefix: default_id_prefix(),
            id_length: default_id_length(),
        }
    }
}

impl GroomConfig {
    /// Find `.groom.yml` upward from `start_path` and load it.
    pub fn load(start_path: &Path) -> Result<(Self, PathBuf)> {
        let config_path = Self::find_config_file(start_path)?;
        let config = Self::load_from(&config_path)?;
        let project_root = config_path
            .parent()
            .ok_or_else(|| GroomError::Config("Config file has no parent directory".to_string()))?
            .to_path_buf();
        Ok((config, project_root))
    }

    /// Like [`GroomConfig::load`], but falls back to defaults rooted at
    /// `start_path` when no config file exists.
    pub fn load_or_default(start_path: &Path) -> Result<(Self, PathBuf)> {
        match Self::load(start_path) {
            Err(GroomError::NotInitialized) => {
                tracing::debug!(path = %start_path.display(), "No config found, using defaults");
                Ok((Self::default(), start_path.to_path_buf()))
            }
            other => other,
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GroomConfig = serde_yaml::from_str(&content)
            .map_err(|e| GroomError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn find_config_file(start_path: &Path) -> Result<PathBuf> {
        let mut current = start_path.to_path_buf();
        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Ok(config_path);
            }
            if !current.pop() {
                return Err(GroomError::NotInitialized);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let scale = &self.scoring.effort_scale;
        if scale.is_empty() {
            return Err(GroomError::Config("effort_scale cannot be empty".to_string()));
        }
        if scale[0] == 0 || scale.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GroomError::Config(
                "effort_scale must be positive and strictly increasing".to_string(),
            ));
        }
        if !scale.contains(&self.scoring.spike_effort_ceiling) {
            return Err(GroomError::Config(format!(
                "spike_effort_ceiling {} is not on the effort scale",
                self.scoring.spike_effort_ceiling
            )));
        }
        if self.team.velocity == 0 {
            return Err(GroomError::Config("team velocity must be positive".to_string()));
        }
        let threshold = self.clustering.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(GroomError::Config(format!(
                "clustering threshold {} must be in (0, 1]",
                threshold
            )));
        }
        for theme in &self.themes {
            if theme.epic.trim().is_empty() || theme.keywords.is_empty() {
                return Err(GroomError::Config(format!(
                    "theme '{}' needs an epic name and at least one keyword",
                    theme.key
                )));
            }
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
