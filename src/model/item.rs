use super::types::{ItemType, Priority, Risk};
use serde::{Deserialize, Serialize};

/// A groomed backlog entry, the terminal artifact of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedItem {
    pub id: String,

    /// Id of the raw ticket this entry came from. Equals `id` unless decomposed.
    pub source_id: String,

    pub title: String,

    #[serde(rename = "type")]
    pub item_type: ItemType,

    pub epic: String,
    pub priority: Priority,
    pub effort: u32,
    pub roi: u8,
    pub risk: Risk,

    #[serde(default)]
    pub flags: Vec<String>,

    pub acceptance: Vec<String>,

    #[serde(default)]
    pub dependencies: Vec<String>,

    pub ai_generated: bool,
}

impl ProcessedItem {
    /// Add a flag unless already present. Keeps insertion order.
    pub fn add_flag(&mut self, flag: impl Into<String>) -> bool {
        push_unique(&mut self.flags, flag.into())
    }

    /// Add a dependency unless already present. Keeps insertion order.
    pub fn add_dependency(&mut self, dependency: impl Into<String>) -> bool {
        push_unique(&mut self.dependencies, dependency.into())
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub fn depends_on(&self, id: &str) -> bool {
        self.dependencies.iter().any(|d| d == id)
    }

    pub fn is_decomposed(&self) -> bool {
        self.id != self.source_id
    }
}

pub(crate) fn push_unique(list: &mut Vec<String>, value: String) -> bool {
    if list.contains(&value) {
        return false;
    }
    list.push(value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProcessedItem {
        ProcessedItem {
            id: "BUG-002".to_string(),
            source_id: "BUG-002".to_string(),
            title: "Fix checkout button failure on mobile / iPhone".to_string(),
            item_type: ItemType::Bug,
            epic: "Checkout Flow".to_string(),
            priority: Priority::Critical,
            effort: 3,
            roi: 95,
            risk: Risk::Medium,
            flags: vec!["Revenue Impact".to_string()],
            acceptance: vec!["a".to_string(), "b".to_string()],
            dependencies: vec![],
            ai_generated: true,
        }
    }

    #[test]
    fn test_add_flag_is_unique_and_ordered() {
        let mut item = sample();
        assert!(item.add_flag("Browser Specific"));
        assert!(!item.add_flag("Revenue Impact"));
        assert_eq!(item.flags, vec!["Revenue Impact", "Browser Specific"]);
    }

    #[test]
    fn test_add_dependency_is_unique() {
        let mut item = sample();
        assert!(item.add_dependency("SPIKE-004"));
        assert!(!item.add_dependency("SPIKE-004"));
        assert!(item.depends_on("SPIKE-004"));
    }

    #[test]
    fn test_serializes_camel_case_fields() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["type"], "Bug");
        assert_eq!(json["sourceId"], "BUG-002");
        assert_eq!(json["aiGenerated"], true);
        assert_eq!(json["priority"], "Critical");
    }
}
