//! Groups raw items into non-overlapping epics.
//!
//! Single pass over the input in order. Each item is a term-frequency vector
//! over its keywords; it joins the most similar existing cluster when the
//! similarity reaches the threshold and founds a new cluster otherwise.

use super::signals::{keywords, tokenize};
use super::themes::{Theme, best_match};
use crate::config::ClusterSettings;
use crate::model::{Epic, RawItem};
use std::collections::{BTreeMap, HashMap};

const TIE_EPSILON: f64 = 1e-9;
const NAME_KEYWORDS: usize = 2;
const EPIC_KEYWORDS: usize = 5;

/// Epics plus the item id to epic name assignment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clustering {
    pub epics: Vec<Epic>,
    pub assignments: BTreeMap<String, String>,
}

impl Clustering {
    pub fn epic_of(&self, id: &str) -> Option<&str> {
        self.assignments.get(id).map(String::as_str)
    }
}

type TermVector = BTreeMap<String, f64>;

#[derive(Debug)]
struct Cluster {
    members: Vec<String>,
    /// Sum of member vectors. Cosine is scale-invariant, so no averaging.
    centroid: TermVector,
    theme: Option<usize>,
    /// Keyword frequencies in first-seen order
    terms: Vec<(String, usize)>,
}

impl Cluster {
    fn new(id: &str, vector: TermVector, theme: Option<usize>, words: &[String]) -> Self {
        let mut cluster = Self {
            members: Vec::new(),
            centroid: TermVector::new(),
            theme,
            terms: Vec::new(),
        };
        cluster.absorb(id, vector, theme, words);
        cluster
    }

    fn absorb(&mut self, id: &str, vector: TermVector, theme: Option<usize>, words: &[String]) {
        self.members.push(id.to_string());
        for (term, weight) in vector {
            *self.centroid.entry(term).or_insert(0.0) += weight;
        }
        if self.theme.is_none() {
            self.theme = theme;
        }
        for word in words {
            match self.terms.iter_mut().find(|(t, _)| t == word) {
                Some((_, n)) => *n += 1,
                None => self.terms.push((word.clone(), 1)),
            }
        }
    }

    /// Most frequent terms; ties keep first-seen order.
    fn top_terms(&self, n: usize) -> Vec<String> {
        let mut sorted: Vec<&(String, usize)> = self.terms.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.into_iter().take(n).map(|(t, _)| t.clone()).collect()
    }
}

pub struct Clusterer<'a> {
    themes: &'a [Theme],
    settings: &'a ClusterSettings,
}

impl<'a> Clusterer<'a> {
    pub fn new(themes: &'a [Theme], settings: &'a ClusterSettings) -> Self {
        Self { themes, settings }
    }

    pub fn cluster(&self, items: &[RawItem]) -> Clustering {
        let mut clusters: Vec<Cluster> = Vec::new();

        for item in items {
            let text = item.text();
            let words = keywords(&text);
            let vector = term_vector(&text);
            let theme = best_match(self.themes, &words)
                .and_then(|t| self.themes.iter().position(|c| c.key == t.key));

            match self.best_cluster(&clusters, &vector, theme) {
                Some(index) => {
                    tracing::trace!(id = %item.id, cluster = index, "Joined cluster");
                    clusters[index].absorb(&item.id, vector, theme, &words);
                }
                None => {
                    tracing::trace!(id = %item.id, cluster = clusters.len(), "New cluster");
                    clusters.push(Cluster::new(&item.id, vector, theme, &words));
                }
            }
        }

        let names = self.name_clusters(&clusters);
        let mut result = Clustering::default();
        for (cluster, name) in clusters.into_iter().zip(names) {
            for id in &cluster.members {
                result.assignments.insert(id.clone(), name.clone());
            }
            let keywords = cluster.top_terms(EPIC_KEYWORDS);
            result.epics.push(Epic::new(name, cluster.members, keywords));
        }

        tracing::debug!(
            items = items.len(),
            epics = result.epics.len(),
            "Clustered items"
        );
        result
    }

    fn best_cluster(
        &self,
        clusters: &[Cluster],
        vector: &TermVector,
        theme: Option<usize>,
    ) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, cluster) in clusters.iter().enumerate() {
            let score = self.similarity(cluster, vector, theme);
            if score < self.settings.threshold {
                continue;
            }
            best = match best {
                None => Some((index, score)),
                Some((current, current_score)) => {
                    let better = if (score - current_score).abs() < TIE_EPSILON {
                        // equidistant: larger membership wins, then the earlier cluster
                        cluster.members.len() > clusters[current].members.len()
                    } else {
                        score > current_score
                    };
                    if better {
                        Some((index, score))
                    } else {
                        Some((current, current_score))
                    }
                }
            };
        }
        best.map(|(index, _)| index)
    }

    fn similarity(&self, cluster: &Cluster, vector: &TermVector, theme: Option<usize>) -> f64 {
        match (cluster.theme, theme) {
            (Some(a), Some(b)) if a != b => 0.0,
            (Some(_), Some(_)) => {
                cosine_similarity(&cluster.centroid, vector) + self.settings.theme_bonus
            }
            _ => cosine_similarity(&cluster.centroid, vector),
        }
    }

    fn name_clusters(&self, clusters: &[Cluster]) -> Vec<String> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        clusters
            .iter()
            .map(|cluster| {
                let base = self.base_name(cluster);
                let count = seen.entry(base.clone()).or_insert(0);
                *count += 1;
                if *count == 1 {
                    base
                } else {
                    format!("{} ({})", base, count)
                }
            })
            .collect()
    }

    fn base_name(&self, cluster: &Cluster) -> String {
        if let Some(theme) = cluster.theme.and_then(|i| self.themes.get(i)) {
            return theme.epic.clone();
        }
        let top = cluster.top_terms(NAME_KEYWORDS);
        if top.is_empty() {
            return "Uncategorized".to_string();
        }
        top.iter()
            .map(|t| title_case(t))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Cluster `items` with the given theme table and settings.
pub fn cluster(items: &[RawItem], themes: &[Theme], settings: &ClusterSettings) -> Clustering {
    Clusterer::new(themes, settings).cluster(items)
}

fn term_vector(text: &str) -> TermVector {
    let mut vector = TermVector::new();
    for token in tokenize(text) {
        *vector.entry(token).or_insert(0.0) += 1.0;
    }
    vector
}

fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(term, x)| b.get(term).map(|y| x * y))
        .sum();
    let mag_a: f64 = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.values().map(|x| x * x).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

pub(crate) fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::themes::catalog;

    fn raw(id: &str, title: &str, description: &str) -> RawItem {
        RawItem {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            status: String::new(),
            reporter: String::new(),
            source_meta: BTreeMap::new(),
        }
    }

    fn run(items: &[RawItem]) -> Clustering {
        cluster(items, &catalog(&[]), &ClusterSettings::default())
    }

    #[test]
    fn test_distinct_themes_form_distinct_epics() {
        let result = run(&[
            raw("US-001", "onboarding thing", "users confused about app, need help"),
            raw("BUG-002", "button broken mobile", "checkout not working on iphone"),
        ]);
        assert_eq!(result.epic_of("US-001"), Some("User Onboarding"));
        assert_eq!(result.epic_of("BUG-002"), Some("Checkout Flow"));
        assert_eq!(result.epics.len(), 2);
    }

    #[test]
    fn test_same_theme_items_share_epic() {
        let result = run(&[
            raw("A", "checkout button broken", ""),
            raw("B", "cart total wrong at checkout", ""),
        ]);
        assert_eq!(result.epics.len(), 1);
        assert_eq!(result.epics[0].member_ids, vec!["A", "B"]);
    }

    #[test]
    fn test_every_item_in_exactly_one_epic() {
        let items = vec![
            raw("1", "dark mode", "add dark mode toggle"),
            raw("2", "dark theme", "dark mode for settings"),
            raw("3", "export invoices", "billing export"),
            raw("4", "!!!", "..."),
        ];
        let result = run(&items);
        let mut members: Vec<_> = result
            .epics
            .iter()
            .flat_map(|e| e.member_ids.iter().cloned())
            .collect();
        members.sort();
        assert_eq!(members, vec!["1", "2", "3", "4"]);
        assert_eq!(result.assignments.len(), 4);
    }

    #[test]
    fn test_unthemed_names_from_keywords() {
        let result = run(&[
            raw("1", "dark mode", "dark mode toggle"),
            raw("2", "dark mode", "dark mode schedule"),
        ]);
        assert_eq!(result.epics.len(), 1);
        assert_eq!(result.epics[0].name, "Dark Mode");
        assert_eq!(result.epics[0].key, "dark-mode");
    }

    #[test]
    fn test_no_keywords_is_uncategorized() {
        let result = run(&[raw("1", "???", "")]);
        assert_eq!(result.epics[0].name, "Uncategorized");
    }

    #[test]
    fn test_name_collisions_get_suffix() {
        let result = run(&[raw("1", "???", ""), raw("2", "!!!", "")]);
        let names: Vec<_> = result.epics.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Uncategorized", "Uncategorized (2)"]);
    }

    #[test]
    fn test_deterministic() {
        let items = vec![
            raw("1", "checkout slow", "cart takes ages"),
            raw("2", "search filters", "filter by price"),
            raw("3", "checkout error", "payment fails at checkout"),
        ];
        assert_eq!(run(&items), run(&items));
    }

    #[test]
    fn test_cosine_similarity() {
        let a = term_vector("alpha beta");
        let b = term_vector("alpha beta");
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-9);
        let c = term_vector("gamma");
        assert_eq!(cosine_similarity(&a, &c), 0.0);
        assert_eq!(cosine_similarity(&a, &TermVector::new()), 0.0);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("dark"), "Dark");
        assert_eq!(title_case(""), "");
    }
}
