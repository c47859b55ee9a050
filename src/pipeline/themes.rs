//! Product themes used to name epics and phrase rewritten items.

use serde::{Deserialize, Serialize};

/// A recognizable product area.
///
/// Keywords are matched against folded keywords from [`super::signals`], so
/// they should be lowercase and singular.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub key: String,
    pub epic: String,
    pub keywords: Vec<String>,

    #[serde(default = "default_role")]
    pub role: String,

    /// Story capability, e.g. "a guided onboarding tour"
    #[serde(default)]
    pub capability: String,

    /// Story value, e.g. "I can understand key features quickly"
    #[serde(default)]
    pub value: String,

    /// Feature phrase used after "Implement"
    #[serde(default)]
    pub feature: String,

    #[serde(default)]
    pub criteria: Vec<String>,

    #[serde(default)]
    pub dependencies: Vec<String>,
}

fn default_role() -> String {
    "user".to_string()
}

impl Theme {
    /// Number of theme keywords present in `keywords`.
    pub fn affinity(&self, keywords: &[String]) -> usize {
        self.keywords
            .iter()
            .filter(|k| keywords.iter().any(|w| w == *k))
            .count()
    }
}

/// Built-in themes followed by any project-defined extras.
pub fn catalog(extra: &[Theme]) -> Vec<Theme> {
    let mut themes = builtin();
    themes.extend(extra.iter().cloned());
    themes
}

/// Best-matching theme: most keyword hits, ties go to the earlier entry.
pub fn best_match<'a>(themes: &'a [Theme], keywords: &[String]) -> Option<&'a Theme> {
    let mut best: Option<(&Theme, usize)> = None;
    for theme in themes {
        let hits = theme.affinity(keywords);
        if hits == 0 {
            continue;
        }
        match best {
            Some((_, best_hits)) if best_hits >= hits => {}
            _ => best = Some((theme, hits)),
        }
    }
    best.map(|(theme, _)| theme)
}

#[allow(clippy::too_many_arguments)]
fn theme(
    key: &str,
    epic: &str,
    keywords: &[&str],
    role: &str,
    capability: &str,
    value: &str,
    feature: &str,
    criteria: &[&str],
    dependencies: &[&str],
) -> Theme {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
    Theme {
        key: key.to_string(),
        epic: epic.to_string(),
        keywords: owned(keywords),
        role: role.to_string(),
        capability: capability.to_string(),
        value: value.to_string(),
        feature: feature.to_string(),
        criteria: owned(criteria),
        dependencies: owned(dependencies),
    }
}

fn builtin() -> Vec<Theme> {
    vec![
        theme(
            "onboarding",
            "User Onboarding",
            &[
                "onboarding", "onboard", "tour", "tutorial", "walkthrough", "confused",
                "confusing", "signup", "welcome",
            ],
            "new user",
            "a guided onboarding tour",
            "I can understand key features quickly",
            "a guided onboarding tour",
            &[
                "Tour highlights the core features in order",
                "Tour can be skipped at any point and resumed from settings",
                "Analytics events record tour starts, skips and completions",
            ],
            &["Analytics service", "Feature flag system"],
        ),
        theme(
            "checkout",
            "Checkout Flow",
            &["checkout", "cart", "basket", "purchase", "order", "buy"],
            "customer",
            "a checkout that completes on every device",
            "I can finish my purchase without friction",
            "a streamlined checkout flow",
            &[
                "Checkout completes end-to-end on supported devices",
                "Order confirmation is shown and emailed after payment",
            ],
            &[],
        ),
        theme(
            "payments",
            "Payments",
            &["payment", "billing", "invoice", "gateway", "refund", "stripe", "paypal", "pay"],
            "customer",
            "to pay with my preferred payment method",
            "I can complete purchases in my market",
            "an additional payment provider",
            &[
                "Payments succeed in the sandbox for each supported method",
                "Failed payments surface a retryable error to the customer",
            ],
            &["Payment gateway"],
        ),
        theme(
            "personalization",
            "Personalization",
            &[
                "recommendation", "recommend", "personalize", "personalized",
                "personalization", "suggestion",
            ],
            "shopper",
            "recommendations that match my interests",
            "I discover relevant products faster",
            "a smart product recommendations engine",
            &[
                "Recommendation model deployed behind a feature flag",
                "A/B test compares recommendation click-through against control",
            ],
            &["ML infrastructure", "Analytics pipeline"],
        ),
        theme(
            "search",
            "Search & Discovery",
            &["search", "filter", "find", "query", "discovery", "sort"],
            "user",
            "to find what I am looking for with search and filters",
            "I spend less time browsing",
            "faceted search with filters",
            &[
                "Results return within 500 ms for the 95th percentile",
                "Empty searches show suggestions instead of a blank page",
            ],
            &["Search index"],
        ),
        theme(
            "authentication",
            "Authentication",
            &[
                "login",
                "logout",
                "password",
                "signin",
                "auth",
                "authentication",
                "sso",
                "mfa",
                "2fa",
            ],
            "returning user",
            "to sign in quickly and securely",
            "my account stays protected without slowing me down",
            "single sign-on support",
            &[
                "Sign-in succeeds with valid credentials and fails with a clear message otherwise",
                "Sessions expire after the configured idle timeout",
            ],
            &["Identity provider"],
        ),
        theme(
            "notifications",
            "Notifications",
            &["notification", "email", "alert", "reminder", "sms", "inbox"],
            "user",
            "timely notifications about activity that matters to me",
            "I never miss an important update",
            "configurable notification preferences",
            &[
                "Notifications are delivered within one minute of the trigger",
                "Users can opt out per notification channel",
            ],
            &["Messaging service"],
        ),
        theme(
            "performance",
            "Performance",
            &["slow", "performance", "latency", "speed", "lag", "timeout", "load"],
            "user",
            "pages that load quickly",
            "I can work without waiting",
            "response caching for slow pages",
            &[
                "Page load time stays under 2 seconds on a mid-range device",
                "Performance budget is enforced in CI",
            ],
            &["Monitoring dashboards"],
        ),
        theme(
            "reporting",
            "Reporting & Analytics",
            &["report", "dashboard", "analytic", "metric", "chart", "export", "kpi"],
            "product manager",
            "a dashboard of the metrics I track",
            "I can make decisions from current data",
            "a self-serve reporting dashboard",
            &[
                "Dashboard figures match the source data for a sampled day",
                "Reports can be exported as CSV",
            ],
            &["Analytics pipeline"],
        ),
        theme(
            "global",
            "Global Expansion",
            &[
                "international", "localization", "localisation", "language", "currency",
                "translation", "i18n", "global", "country", "region",
            ],
            "international customer",
            "the product in my language and currency",
            "I can use it comfortably in my market",
            "localization for new markets",
            &[
                "All user-facing strings are externalized for translation",
                "Prices render in the customer's local currency",
            ],
            &["Translation service"],
        ),
        theme(
            "account",
            "Account Settings",
            &["profile", "setting", "preference", "avatar", "account"],
            "user",
            "to manage my profile and preferences",
            "the product reflects how I like to work",
            "self-service account settings",
            &[
                "Changes to settings persist across sessions and devices",
                "Invalid input is rejected with a field-level message",
            ],
            &[],
        ),
    ]
}
