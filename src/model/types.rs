use crate::error::{GroomError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    #[serde(rename = "User Story", alias = "UserStory")]
    UserStory,
    Bug,
    Feature,
    Spike,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::UserStory => write!(f, "User Story"),
            ItemType::Bug => write!(f, "Bug"),
            ItemType::Feature => write!(f, "Feature"),
            ItemType::Spike => write!(f, "Spike"),
        }
    }
}

impl FromStr for ItemType {
    type Err = GroomError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace([' ', '-', '_'], "").as_str() {
            "userstory" | "story" => Ok(ItemType::UserStory),
            "bug" | "defect" => Ok(ItemType::Bug),
            "feature" | "feat" => Ok(ItemType::Feature),
            "spike" | "research" => Ok(ItemType::Spike),
            _ => Err(GroomError::Parse(format!("Invalid item type: {}", s))),
        }
    }
}

/// Backlog priority, totally ordered `Critical > High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Numeric rank, higher is more important.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 3,
            Priority::High => 2,
            Priority::Medium => 1,
            Priority::Low => 0,
        }
    }

    pub fn from_rank(rank: u8) -> Self {
        match rank {
            0 => Priority::Low,
            1 => Priority::Medium,
            2 => Priority::High,
            _ => Priority::Critical,
        }
    }

    /// One tier lower, saturating at `Low`.
    pub fn demoted(self) -> Self {
        Priority::from_rank(self.rank().saturating_sub(1))
    }

    pub fn is_high(self) -> bool {
        matches!(self, Priority::Critical | Priority::High)
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Critical => write!(f, "Critical"),
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low => write!(f, "Low"),
        }
    }
}

impl FromStr for Priority {
    type Err = GroomError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "critical" | "p0" => Ok(Priority::Critical),
            "high" | "p1" => Ok(Priority::High),
            "medium" | "normal" | "p2" => Ok(Priority::Medium),
            "low" | "p3" => Ok(Priority::Low),
            _ => Err(GroomError::Parse(format!("Invalid priority: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Risk {
    High,
    Medium,
    Low,
}

impl Risk {
    pub fn rank(self) -> u8 {
        match self {
            Risk::High => 2,
            Risk::Medium => 1,
            Risk::Low => 0,
        }
    }
}

impl Ord for Risk {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Risk {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Risk::High => write!(f, "High"),
            Risk::Medium => write!(f, "Medium"),
            Risk::Low => write!(f, "Low"),
        }
    }
}

impl FromStr for Risk {
    type Err = GroomError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Risk::High),
            "medium" => Ok(Risk::Medium),
            "low" => Ok(Risk::Low),
            _ => Err(GroomError::Parse(format!("Invalid risk: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_total_order() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);

        let mut all = vec![Priority::Low, Priority::Critical, Priority::Medium, Priority::High];
        all.sort();
        assert_eq!(
            all,
            vec![Priority::Low, Priority::Medium, Priority::High, Priority::Critical]
        );
    }

    #[test]
    fn test_priority_demoted_saturates() {
        assert_eq!(Priority::Critical.demoted(), Priority::High);
        assert_eq!(Priority::Low.demoted(), Priority::Low);
    }

    #[test]
    fn test_item_type_parse_aliases() {
        assert_eq!("User Story".parse::<ItemType>().unwrap(), ItemType::UserStory);
        assert_eq!("user_story".parse::<ItemType>().unwrap(), ItemType::UserStory);
        assert_eq!("research".parse::<ItemType>().unwrap(), ItemType::Spike);
        assert!("epic".parse::<ItemType>().is_err());
    }

    #[test]
    fn test_item_type_serializes_display_name() {
        let json = serde_json::to_string(&ItemType::UserStory).unwrap();
        assert_eq!(json, "\"User Story\"");
        let back: ItemType = serde_json::from_str("\"UserStory\"").unwrap();
        assert_eq!(back, ItemType::UserStory);
    }

    #[test]
    fn test_risk_order() {
        assert!(Risk::High > Risk::Medium);
        assert!(Risk::Medium > Risk::Low);
        assert_eq!("HIGH".parse::<Risk>().unwrap(), Risk::High);
    }
}
