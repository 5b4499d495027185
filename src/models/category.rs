// Agent category, inferred from the free-text agent label.
//
// The label is whatever the peer reported as its software version, so there is no
// canonical value to match on. Matching is a plain case-sensitive substring test and
// downstream reports depend on these exact rules; keep them as they are.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const VENUS_PATTERNS: [&str; 3] = ["venus", "droplet", "market"];
const LOTUS_PATTERNS: [&str; 2] = ["lotus", "boost"];

/// Declaration order is the sort priority used by diffs (later sorts first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(rename = "others", alias = "other")]
    Other,
    Lotus,
    Venus,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Other => "others",
            Category::Lotus => "lotus",
            Category::Venus => "venus",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "venus" => Ok(Category::Venus),
            "lotus" => Ok(Category::Lotus),
            "other" | "others" => Ok(Category::Other),
            _ => Err(format!("unknown category {s:?}")),
        }
    }
}

/// Venus patterns are checked first, so "lotus-market" is Venus. Empty label is Other.
pub fn classify(label: &str) -> Category {
    if VENUS_PATTERNS.iter().any(|p| label.contains(p)) {
        Category::Venus
    } else if LOTUS_PATTERNS.iter().any(|p| label.contains(p)) {
        Category::Lotus
    } else {
        Category::Other
    }
}
