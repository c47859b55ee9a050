//! Lexical analysis shared by every pipeline stage.
//!
//! Two layers: a keyword tokenizer (lowercase, stopwords removed, plurals
//! folded) used for similarity and theme matching, and regex lexicons that
//! count intent and risk signals in the raw text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Split text into content keywords, keeping order and duplicates.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(|w| w.to_lowercase())
        .filter(|w| !is_stopword(w))
        .map(|w| fold_plural(&w))
        .filter(|w| !is_stopword(w))
        .collect()
}

/// Distinct keywords in first-seen order.
pub fn keywords(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tokenize(text)
        .into_iter()
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Jaccard overlap of two keyword sets.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count() as f64;
    let total = a.union(b).count() as f64;
    shared / total
}

fn fold_plural(word: &str) -> String {
    if word.len() > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if ["shes", "ches", "xes", "sses"]
        .iter()
        .any(|suffix| word.ends_with(suffix))
    {
        return word[..word.len() - 2].to_string();
    }
    if word.len() > 3
        && word.ends_with('s')
        && !word.ends_with("ss")
        && !word.ends_with("us")
        && !word.ends_with("is")
    {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

fn is_stopword(word: &str) -> bool {
    matches!(
        word,
        "the"
            | "and"
            | "for"
            | "that"
            | "this"
            | "with"
            | "from"
            | "have"
            | "has"
            | "are"
            | "was"
            | "were"
            | "been"
            | "not"
            | "but"
            | "can"
            | "our"
            | "you"
            | "your"
            | "they"
            | "them"
            | "their"
            | "its"
            | "into"
            | "about"
            | "some"
            | "any"
            | "all"
            | "should"
            | "would"
            | "could"
            | "might"
            | "like"
            | "when"
            | "what"
            | "which"
            | "there"
            | "here"
            | "also"
            | "just"
            | "very"
            | "really"
            | "get"
            | "got"
            | "make"
            | "need"
            | "want"
            | "please"
            | "thing"
            | "stuff"
            | "something"
            | "etc"
            | "does"
            | "doesn"
            | "don"
            | "isn"
            | "aren"
            | "won"
            | "will"
            | "more"
            | "too"
            | "how"
            | "why"
    )
}

fn lexicon(pattern: &str) -> Regex {
    // Patterns are compile-time constants covered by tests
    Regex::new(&format!(r"(?i)\b(?:{})\b", pattern)).expect("valid lexicon pattern")
}

static BUG: LazyLock<Regex> = LazyLock::new(|| {
    lexicon(
        r"broken|broke|not working|doesn'?t work|does not work|stopped working|crash(?:es|ed|ing)?|errors?|fail(?:s|ed|ing|ure)?|bugs?|regression|defect|disabled|stuck|freez(?:e|es|ing)|can'?t|cannot|wrong|glitch",
    )
});

static SPIKE: LazyLock<Regex> = LazyLock::new(|| {
    lexicon(
        r"research|investigat(?:e|ion)|explore|look into|evaluat(?:e|ion)|spike|compare|alternatives?|feasibility|prototype|proof of concept|poc|options",
    )
});

static FEATURE: LazyLock<Regex> = LazyLock::new(|| {
    lexicon(
        r"show|add|implement|build|support|integrat(?:e|ion)|recommendations?|engine|new|enable|allow|export|import|dashboard|automat(?:e|ic|ion)",
    )
});

static STORY: LazyLock<Regex> = LazyLock::new(|| {
    lexicon(
        r"users?|customers?|confused|confusing|need|needs|want|wants|help|onboarding|experience|easier|understand|as an?",
    )
});

static REVENUE: LazyLock<Regex> = LazyLock::new(|| {
    lexicon(
        r"checkout|payments?|cart|purchases?|billing|revenue|conversion|subscriptions?|pricing|orders?|sales|abandonment",
    )
});

static URGENCY: LazyLock<Regex> = LazyLock::new(|| {
    lexicon(r"urgent|asap|blocker|critical|outage|down|production|immediately|hotfix|sev[0-9]")
});

static COMPLIANCE: LazyLock<Regex> = LazyLock::new(|| {
    lexicon(
        r"gdpr|ccpa|privacy|consent|compliance|pii|personal data|hipaa|sox|pci|security|audit|legal",
    )
});

static PLATFORM: LazyLock<Regex> = LazyLock::new(|| {
    lexicon(r"iphone|ipad|ios|android|safari|chrome|firefox|edge|mobile|browsers?|tablet|webview")
});

static EXTERNAL: LazyLock<Regex> = LazyLock::new(|| {
    lexicon(
        r"stripe|paypal|adyen|braintree|twilio|sendgrid|salesforce|auth0|okta|third[- ]party|vendor|external|provider|gateway|webhooks?|sso|oauth",
    )
});

static ML: LazyLock<Regex> = LazyLock::new(|| {
    lexicon(
        r"recommend(?:ation|ations|s|ed)?|personali[sz](?:e|ed|ation)|machine learning|ml|models?|predict(?:ion|ive)?|might like|ai",
    )
});

static UNKNOWN: LazyLock<Regex> = LazyLock::new(|| {
    lexicon(r"thing|stuff|somehow|unclear|maybe|not sure|tbd|etc")
});

static SCOPE: LazyLock<Regex> = LazyLock::new(|| {
    lexicon(
        r"engine|platform|system|redesign|rewrite|migrat(?:e|ion)|overhaul|entire|infrastructure|end[- ]to[- ]end|framework",
    )
});

static REACH: LazyLock<Regex> = LazyLock::new(|| {
    lexicon(r"users?|customers?|everyone|all|conversion|retention|abandonment|churn")
});

static ADMIN: LazyLock<Regex> = LazyLock::new(|| lexicon(r"admins?|administrators?|operators?"));

/// Display names for platforms, in lexicon order.
const PLATFORM_NAMES: &[(&str, &str)] = &[
    ("mobile", "mobile"),
    ("iphone", "iPhone"),
    ("ipad", "iPad"),
    ("ios", "iOS"),
    ("android", "Android"),
    ("safari", "Safari"),
    ("chrome", "Chrome"),
    ("firefox", "Firefox"),
    ("edge", "Edge"),
    ("tablet", "tablet"),
];

const VENDOR_NAMES: &[(&str, &str)] = &[
    ("stripe", "Stripe"),
    ("paypal", "PayPal"),
    ("adyen", "Adyen"),
    ("braintree", "Braintree"),
    ("twilio", "Twilio"),
    ("sendgrid", "SendGrid"),
    ("salesforce", "Salesforce"),
    ("auth0", "Auth0"),
    ("okta", "Okta"),
];

/// Signal counts detected in a piece of raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    pub bug: usize,
    pub spike: usize,
    pub feature: usize,
    pub story: usize,
    pub revenue: usize,
    pub urgency: usize,
    pub compliance: usize,
    pub platform: usize,
    pub external: usize,
    pub ml: usize,
    pub unknowns: usize,
    pub scope: usize,
    pub reach: usize,
    pub admin: bool,

    /// Platform display names in the order they first appear
    pub platforms: Vec<String>,

    /// Known vendor display names in the order they first appear
    pub vendors: Vec<String>,

    /// Distinct content keywords
    pub keywords: Vec<String>,
}

impl Signals {
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        Self {
            bug: count(&BUG, text),
            spike: count(&SPIKE, text),
            feature: count(&FEATURE, text),
            story: count(&STORY, text),
            revenue: count(&REVENUE, text),
            urgency: count(&URGENCY, text),
            compliance: count(&COMPLIANCE, text),
            platform: count(&PLATFORM, text),
            external: count(&EXTERNAL, text),
            ml: count(&ML, text),
            unknowns: count(&UNKNOWN, text),
            scope: count(&SCOPE, text),
            reach: count(&REACH, text),
            admin: ADMIN.is_match(text),
            platforms: names_in(&lower, PLATFORM_NAMES),
            vendors: names_in(&lower, VENDOR_NAMES),
            keywords: keywords(text),
        }
    }

    pub fn keyword_set(&self) -> BTreeSet<String> {
        self.keywords.iter().cloned().collect()
    }

    /// True when nothing in the text can drive a classification.
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
            && self.bug == 0
            && self.spike == 0
            && self.feature == 0
            && self.story == 0
    }
}

fn count(re: &Regex, text: &str) -> usize {
    re.find_iter(text).count()
}

fn names_in(lower: &str, table: &[(&str, &str)]) -> Vec<String> {
    let words: Vec<&str> = lower.split(|c: char| !c.is_alphanumeric()).collect();
    let mut found: Vec<(usize, String)> = table
        .iter()
        .filter_map(|(needle, display)| {
            words
                .iter()
                .position(|w| w == needle)
                .map(|pos| (pos, display.to_string()))
        })
        .collect();
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, name)| name).collect()
}

/// Words that carry a signal but say nothing about the subject of a ticket.
pub fn is_signal_word(word: &str) -> bool {
    matches!(
        word,
        "broken"
            | "broke"
            | "working"
            | "work"
            | "crash"
            | "crashing"
            | "error"
            | "fail"
            | "failing"
            | "failed"
            | "failure"
            | "bug"
            | "fix"
            | "issue"
            | "problem"
            | "wrong"
            | "stuck"
            | "research"
            | "investigate"
            | "investigation"
            | "explore"
            | "look"
            | "evaluate"
            | "spike"
            | "compare"
            | "alternative"
            | "feasibility"
            | "prototype"
            | "option"
            | "user"
            | "confused"
            | "help"
            | "show"
            | "add"
            | "implement"
            | "build"
            | "urgent"
            | "asap"
            | "new"
            | "maybe"
            | "somehow"
            | "unclear"
    ) || PLATFORM_NAMES.iter().any(|(needle, _)| *needle == word)
}
