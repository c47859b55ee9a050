use crate::model::ProcessedItem;
use regex::Regex;

/// Filter over processed items with optional field and regex support
#[derive(Debug, Clone)]
pub enum SearchQuery {
    /// Case-insensitive substring search
    Simple(String),
    Regex(Regex),
    Field {
        field: SearchField,
        pattern: Box<SearchQuery>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Epic,
    Flag,
    Dependency,
    Id,
    Priority,
    Type,
    Risk,
}

impl SearchQuery {
    /// Parse a filter string
    /// Supports:
    /// - Simple: "checkout" -> searches title, epic, id and flags
    /// - Field-specific: "epic:payments" -> searches epic only
    /// - Regex: "regex:^Fix" -> regex search
    /// - Combined: "title:regex:^Fix" -> regex in title field
    pub fn parse(query: &str) -> Result<Self, String> {
        if query.is_empty() {
            return Err("Empty query".to_string());
        }

        if let Some((field_str, pattern)) = query.split_once(':') {
            if let Ok(field) = field_str.parse::<SearchField>() {
                let sub_query = Self::parse(pattern)?;
                return Ok(SearchQuery::Field {
                    field,
                    pattern: Box::new(sub_query),
                });
            }

            if field_str == "regex" {
                let regex = Regex::new(pattern).map_err(|e| format!("Invalid regex: {}", e))?;
                return Ok(SearchQuery::Regex(regex));
            }
        }

        Ok(SearchQuery::Simple(query.to_string()))
    }

    pub fn matches(&self, item: &ProcessedItem) -> bool {
        match self {
            SearchQuery::Field { field, pattern } => field
                .values(item)
                .iter()
                .any(|value| pattern.matches_text(value)),
            _ => [
                SearchField::Title,
                SearchField::Epic,
                SearchField::Id,
                SearchField::Flag,
            ]
            .iter()
            .flat_map(|field| field.values(item))
            .any(|value| self.matches_text(&value)),
        }
    }

    fn matches_text(&self, text: &str) -> bool {
        match self {
            SearchQuery::Simple(p) => text.to_lowercase().contains(&p.to_lowercase()),
            SearchQuery::Regex(r) => r.is_match(text),
            // nested fields are not meaningful
            SearchQuery::Field { .. } => false,
        }
    }
}

impl SearchField {
    fn values(self, item: &ProcessedItem) -> Vec<String> {
        match self {
            SearchField::Title => vec![item.title.clone()],
            SearchField::Epic => vec![item.epic.clone()],
            SearchField::Flag => item.flags.clone(),
            SearchField::Dependency => item.dependencies.clone(),
            SearchField::Id => vec![item.id.clone(), item.source_id.clone()],
            SearchField::Priority => vec![item.priority.to_string()],
            SearchField::Type => vec![item.item_type.to_string()],
            SearchField::Risk => vec![item.risk.to_string()],
        }
    }
}

impl std::str::FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "title" => Ok(SearchField::Title),
            "epic" => Ok(SearchField::Epic),
            "flag" | "flags" => Ok(SearchField::Flag),
            "dep" | "deps" | "dependency" => Ok(SearchField::Dependency),
            "id" => Ok(SearchField::Id),
            "priority" => Ok(SearchField::Priority),
            "type" => Ok(SearchField::Type),
            "risk" => Ok(SearchField::Risk),
            _ => Err(format!("Unknown field: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemType, Priority, Risk};

    fn create_test_item() -> ProcessedItem {
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
            flags: vec!["Revenue Impact".to_string(), "Browser Specific".to_string()],
            acceptance: vec!["a".to_string(), "b".to_string()],
            dependencies: vec!["Mobile testing framework".to_string()],
            ai_generated: true,
        }
    }

    #[test]
    fn test_simple_search() {
        let item = create_test_item();
        assert!(SearchQuery::parse("checkout").unwrap().matches(&item));
        assert!(SearchQuery::parse("revenue").unwrap().matches(&item));
        assert!(SearchQuery::parse("bug-002").unwrap().matches(&item));
        assert!(!SearchQuery::parse("onboarding").unwrap().matches(&item));
    }

    #[test]
    fn test_field_specific_search() {
        let item = create_test_item();
        assert!(SearchQuery::parse("epic:checkout").unwrap().matches(&item));
        assert!(!SearchQuery::parse("epic:iphone").unwrap().matches(&item));
        assert!(SearchQuery::parse("flag:browser").unwrap().matches(&item));
        assert!(SearchQuery::parse("dep:testing").unwrap().matches(&item));
        assert!(SearchQuery::parse("priority:critical").unwrap().matches(&item));
        assert!(SearchQuery::parse("type:bug").unwrap().matches(&item));
        assert!(SearchQuery::parse("risk:medium").unwrap().matches(&item));
        assert!(!SearchQuery::parse("risk:low").unwrap().matches(&item));
    }

    #[test]
    fn test_regex_search() {
        let item = create_test_item();
        assert!(SearchQuery::parse("regex:^Fix").unwrap().matches(&item));
        assert!(SearchQuery::parse("title:regex:mobile / \\w+").unwrap().matches(&item));
        assert!(!SearchQuery::parse("epic:regex:^Fix").unwrap().matches(&item));
        assert!(SearchQuery::parse("regex:[invalid").is_err());
    }

    #[test]
    fn test_type_matches_display_name() {
        let mut item = create_test_item();
        item.item_type = ItemType::UserStory;
        assert!(SearchQuery::parse("type:user story").unwrap().matches(&item));
    }

    #[test]
    fn test_unknown_prefix_is_plain_text() {
        let item = create_test_item();
        let query = SearchQuery::parse("mobile / iphone").unwrap();
        assert!(matches!(query, SearchQuery::Simple(_)));
        assert!(query.matches(&item));
        assert!(SearchQuery::parse("").is_err());
    }
}
