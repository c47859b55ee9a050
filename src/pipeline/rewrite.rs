//! Rewrites raw tickets into standard backlog entries.
//!
//! Classification follows intent signals with a fixed precedence: bug
//! language wins over research language, which wins over feature language;
//! anything else is a user story. A description listing several unrelated
//! asks is decomposed into one entry per ask.

use super::cluster::title_case;
use super::signals::{Signals, is_signal_word, jaccard, keywords};
use super::themes::{Theme, best_match};
use crate::error::{GroomError, Result};
use crate::model::{ItemType, RawItem, push_unique};
use std::collections::BTreeSet;

pub const FLAG_REVENUE: &str = "Revenue Impact";
pub const FLAG_URGENT: &str = "Urgent";
pub const FLAG_BROWSER: &str = "Browser Specific";
pub const FLAG_PRIVACY: &str = "Data Privacy";
pub const FLAG_ML: &str = "ML Integration";
pub const FLAG_EXTERNAL: &str = "External Dependency";
pub const FLAG_RESEARCH: &str = "Research Only";

const MIN_SEGMENT_KEYWORDS: usize = 2;
const MAX_SEGMENT_OVERLAP: f64 = 0.2;
const SUBJECT_WORDS: usize = 4;
const MIN_CRITERIA: usize = 2;

const MOBILE_PLATFORMS: &[&str] = &["mobile", "iPhone", "iPad", "iOS", "Android", "tablet"];

/// A classified, rewritten entry that has not been scored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenItem {
    pub id: String,
    pub source_id: String,
    pub title: String,
    pub item_type: ItemType,
    pub epic: String,
    pub flags: Vec<String>,
    pub acceptance: Vec<String>,
    pub dependencies: Vec<String>,
    pub ai_generated: bool,

    /// Signals of the text this entry was written from; the scorer reads them
    pub signals: Signals,
}

/// Classify by intent signal precedence.
pub fn classify(signals: &Signals) -> ItemType {
    if signals.bug > 0 {
        ItemType::Bug
    } else if signals.spike > 0 {
        ItemType::Spike
    } else if signals.feature > signals.story {
        ItemType::Feature
    } else {
        ItemType::UserStory
    }
}

pub struct Rewriter<'a> {
    themes: &'a [Theme],

    /// Ids already used by the batch; decomposed parts never take one
    reserved: BTreeSet<String>,
}

impl<'a> Rewriter<'a> {
    pub fn new(themes: &'a [Theme]) -> Self {
        Self {
            themes,
            reserved: BTreeSet::new(),
        }
    }

    pub fn with_reserved_ids(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.reserved.extend(ids);
        self
    }

    /// Rewrite one raw item into one or more entries tagged with `epic`.
    pub fn rewrite(&self, item: &RawItem, epic: &str) -> Result<Vec<RewrittenItem>> {
        let signals = Signals::detect(&item.text());
        if signals.is_empty() {
            return Err(GroomError::Unclassifiable {
                id: item.id.clone(),
                reason: "no content keywords or intent signals".to_string(),
            });
        }

        if let Some(segments) = decomposable_segments(&item.description) {
            tracing::debug!(id = %item.id, parts = segments.len(), "Decomposing item");
            let mut suffix = 0;
            let mut parts = Vec::with_capacity(segments.len());
            for segment in &segments {
                let part = RawItem {
                    id: self.part_id(&item.id, &mut suffix),
                    title: segment.clone(),
                    description: String::new(),
                    ..item.clone()
                };
                let signals = Signals::detect(segment);
                parts.push(self.rewrite_single(&part, &item.id, epic, signals));
            }
            return Ok(parts);
        }

        Ok(vec![self.rewrite_single(item, &item.id, epic, signals)])
    }

    /// Next `<source>-<n>` id not taken by a record in the batch.
    ///
    /// The suffix after the last dash is always numeric, so parts of
    /// different sources cannot collide with each other either.
    fn part_id(&self, source_id: &str, suffix: &mut usize) -> String {
        loop {
            *suffix += 1;
            let candidate = format!("{}-{}", source_id, suffix);
            if !self.reserved.contains(&candidate) {
                return candidate;
            }
            tracing::debug!(id = %candidate, "Part id taken by a batch record, skipping");
        }
    }

    fn rewrite_single(
        &self,
        item: &RawItem,
        source_id: &str,
        epic: &str,
        signals: Signals,
    ) -> RewrittenItem {
        let item_type = classify(&signals);
        let theme = best_match(self.themes, &signals.keywords)
            .or_else(|| self.themes.iter().find(|t| t.epic == epic));
        let draft = Draft {
            item,
            epic,
            signals: &signals,
            theme,
        };

        let mut title = draft.title(item_type);
        if title.eq_ignore_ascii_case(item.title.trim()) {
            title = format!("{} for {}", title, epic);
        }

        let acceptance = draft.acceptance(item_type, &title);
        let flags = draft.flags(item_type);
        let dependencies = draft.dependencies(item_type);

        RewrittenItem {
            id: item.id.clone(),
            source_id: source_id.to_string(),
            title,
            item_type,
            epic: epic.to_string(),
            flags,
            acceptance,
            dependencies,
            ai_generated: true,
            signals,
        }
    }
}

/// Segments of a description listing unrelated asks, if it does.
pub fn decomposable_segments(description: &str) -> Option<Vec<String>> {
    let segments = split_segments(description);
    if segments.len() < 2 {
        return None;
    }

    let sets: Vec<BTreeSet<String>> = segments
        .iter()
        .map(|s| keywords(s).into_iter().collect())
        .collect();
    if sets.iter().any(|s| s.len() < MIN_SEGMENT_KEYWORDS) {
        return None;
    }
    for (i, a) in sets.iter().enumerate() {
        for b in &sets[i + 1..] {
            if jaccard(a, b) >= MAX_SEGMENT_OVERLAP {
                return None;
            }
        }
    }
    Some(segments)
}

fn split_segments(description: &str) -> Vec<String> {
    let bullets: Vec<String> = description
        .lines()
        .filter_map(strip_bullet)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if bullets.len() >= 2 {
        return bullets;
    }

    description
        .split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn strip_bullet(line: &str) -> Option<&str> {
    let line = line.trim_start();
    for marker in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest);
        }
    }
    // numbered: "1. " or "1) "
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        return rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") "));
    }
    None
}

/// Everything needed to phrase one entry.
struct Draft<'a> {
    item: &'a RawItem,
    epic: &'a str,
    signals: &'a Signals,
    theme: Option<&'a Theme>,
}

impl Draft<'_> {
    fn title(&self, item_type: ItemType) -> String {
        match item_type {
            ItemType::UserStory => self.story_title(),
            ItemType::Bug => self.bug_title(),
            ItemType::Spike => self.spike_title(),
            ItemType::Feature => self.feature_title(),
        }
    }

    fn story_title(&self) -> String {
        match self.theme.filter(|t| !t.capability.is_empty() && !t.value.is_empty()) {
            Some(theme) => format!(
                "As {} {}, I want {} so that {}",
                article(&theme.role),
                theme.role,
                theme.capability,
                theme.value
            ),
            None => {
                let role = self.fallback_role();
                format!(
                    "As {} {}, I want {} so that I can get my work done without workarounds",
                    article(role),
                    role,
                    self.subject_phrase(&self.signals.keywords)
                )
            }
        }
    }

    fn bug_title(&self) -> String {
        let title_words = keywords(&self.item.title);
        let mut subject = self.subject(&title_words);
        if subject.is_empty() {
            subject = self.subject(&self.signals.keywords);
        }

        // lead with the product area named in the description when the title lacks it
        let area = keywords(&self.item.description).into_iter().find(|w| {
            !subject.contains(w)
                && self
                    .theme
                    .is_some_and(|t| t.keywords.iter().any(|k| k == w))
        });
        if let Some(area) = area {
            subject.insert(0, area);
        }
        subject.truncate(SUBJECT_WORDS);

        let subject = if subject.is_empty() {
            self.epic.to_lowercase()
        } else {
            subject.join(" ")
        };

        if self.signals.platforms.is_empty() {
            format!("Fix {} failure", subject)
        } else {
            format!(
                "Fix {} failure on {}",
                subject,
                self.signals.platforms.join(" / ")
            )
        }
    }

    fn spike_title(&self) -> String {
        let topic = self.subject_phrase(&self.signals.keywords);
        match self.signals.vendors.first() {
            Some(vendor) => {
                let relation = if self.mentions_alternatives() {
                    "beyond"
                } else {
                    "including"
                };
                format!(
                    "Research {} options {} {} and recommend a direction",
                    topic, relation, vendor
                )
            }
            None => format!("Research {} options and recommend a direction", topic),
        }
    }

    fn feature_title(&self) -> String {
        match self.theme.filter(|t| !t.feature.is_empty()) {
            Some(theme) => format!("Implement {}", theme.feature),
            None => format!("Implement {}", self.subject_phrase(&self.signals.keywords)),
        }
    }

    fn flags(&self, item_type: ItemType) -> Vec<String> {
        let s = self.signals;
        let mut flags = Vec::new();
        let mut flag = |on: bool, name: &str| {
            if on {
                push_unique(&mut flags, name.to_string());
            }
        };
        flag(s.revenue > 0, FLAG_REVENUE);
        flag(s.urgency > 0, FLAG_URGENT);
        flag(s.platform > 0, FLAG_BROWSER);
        flag(s.ml > 0, FLAG_ML);
        flag(self.touches_privacy(), FLAG_PRIVACY);
        flag(s.external > 0, FLAG_EXTERNAL);
        flag(item_type == ItemType::Spike, FLAG_RESEARCH);
        flags
    }

    fn dependencies(&self, item_type: ItemType) -> Vec<String> {
        let mut deps = Vec::new();
        // research is unblocked by definition
        if item_type == ItemType::Spike {
            return deps;
        }

        if let Some(theme) = self.theme {
            for dep in &theme.dependencies {
                push_unique(&mut deps, dep.clone());
            }
        }
        for vendor in &self.signals.vendors {
            push_unique(&mut deps, format!("{} API", vendor));
        }
        if item_type == ItemType::Bug && !self.signals.platforms.is_empty() {
            let mobile = self
                .signals
                .platforms
                .iter()
                .any(|p| MOBILE_PLATFORMS.contains(&p.as_str()));
            let label = if mobile {
                "Mobile testing framework"
            } else {
                "Cross-browser test suite"
            };
            push_unique(&mut deps, label.to_string());
        }
        if self.signals.ml > 0 {
            push_unique(&mut deps, "ML infrastructure".to_string());
        }
        if self.touches_privacy() {
            push_unique(&mut deps, "User consent system".to_string());
        }
        deps
    }

    fn acceptance(&self, item_type: ItemType, title: &str) -> Vec<String> {
        let s = self.signals;
        let mut criteria: Vec<String> = Vec::new();

        match item_type {
            ItemType::Bug => {
                let subject = title_case(&self.subject_phrase(&keywords(&self.item.title)));
                criteria.push(
                    "Regression test reproduces the original failure and passes after the fix"
                        .to_string(),
                );
                if s.platforms.is_empty() {
                    criteria.push(format!("{} works end-to-end without errors", subject));
                }
                for platform in &s.platforms {
                    criteria.push(format!("{} works on {}", subject, platform));
                }
                if s.platform > 0 {
                    criteria.push("Cross-browser testing complete".to_string());
                }
            }
            ItemType::Spike => {
                criteria.push("At least 3 options evaluated against agreed criteria".to_string());
                if let Some(vendor) = s.vendors.first() {
                    criteria.push(format!(
                        "Cost and capability comparison against {} complete",
                        vendor
                    ));
                }
                criteria.push("Integration complexity assessed for each option".to_string());
                criteria.push("Recommendation shared with the team".to_string());
                criteria.push("Time-boxed; findings written up even if inconclusive".to_string());
            }
            ItemType::Feature => {
                if let Some(theme) = self.theme {
                    criteria.extend(theme.criteria.iter().cloned());
                }
                criteria.push("Released behind a feature flag".to_string());
                if s.ml > 0 {
                    criteria.push(
                        "A/B test compares the model against a control group".to_string(),
                    );
                }
                if self.touches_privacy() {
                    criteria.push(
                        "GDPR compliance verified for any personal data used".to_string(),
                    );
                }
                criteria.push("User-facing documentation updated".to_string());
            }
            ItemType::UserStory => {
                match self.theme {
                    Some(theme) => criteria.extend(theme.criteria.iter().cloned()),
                    None => {
                        let role = self.fallback_role();
                        criteria.push(format!(
                            "{} is available to every {} from the main flow",
                            title_case(&self.subject_phrase(&s.keywords)),
                            role
                        ));
                    }
                }
                criteria.push("Behaviour covered by automated acceptance tests".to_string());
            }
        }

        let mut out = Vec::new();
        for criterion in criteria {
            if !criterion.eq_ignore_ascii_case(title) {
                push_unique(&mut out, criterion);
            }
        }
        for fallback in [
            "Behaviour covered by automated tests",
            "Reviewed and accepted by the product owner",
        ] {
            if out.len() >= MIN_CRITERIA {
                break;
            }
            push_unique(&mut out, fallback.to_string());
        }
        out
    }

    /// Content words with signal words and vendor names removed.
    fn subject(&self, words: &[String]) -> Vec<String> {
        words
            .iter()
            .filter(|w| !is_signal_word(w))
            .filter(|w| {
                !self
                    .signals
                    .vendors
                    .iter()
                    .any(|v| v.eq_ignore_ascii_case(w))
            })
            .take(SUBJECT_WORDS)
            .cloned()
            .collect()
    }

    fn subject_phrase(&self, words: &[String]) -> String {
        let subject = self.subject(words);
        if subject.is_empty() {
            self.epic.to_lowercase()
        } else {
            subject.join(" ")
        }
    }

    fn fallback_role(&self) -> &'static str {
        let text = self.item.text().to_lowercase();
        if self.signals.admin {
            "admin"
        } else if text.contains("customer") {
            "customer"
        } else {
            "user"
        }
    }

    fn touches_privacy(&self) -> bool {
        self.signals.compliance > 0 || self.signals.ml > 0
    }

    fn mentions_alternatives(&self) -> bool {
        self.signals
            .keywords
            .iter()
            .any(|w| matches!(w.as_str(), "alternative" | "replace" | "replacement" | "instead"))
    }
}

fn article(word: &str) -> &'static str {
    let lower = word.to_lowercase();
    if lower.starts_with("us") || lower.starts_with("uni") {
        return "a";
    }
    match lower.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}
