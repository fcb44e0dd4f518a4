//! Keyword classification of free-text labels into the closed taxonomies.
//!
//! Matching is case-sensitive substring containment. Rules are checked top to
//! bottom and the first hit wins; no hit means `Other`.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Climate-technology field (기술분야).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Reduction,
    Adaptation,
    Convergence,
    Other,
}

/// Institution scale or type (규모).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    Large,
    Medium,
    Small,
    Research,
    Other,
}

/// Field rules, in priority order.
pub const FIELD_RULES: &[(&[&str], Field)] = &[
    (&["감축"], Field::Reduction),
    (&["적응"], Field::Adaptation),
    (&["융복합", "융합"], Field::Convergence),
];

/// Scale rules, in priority order. "소규모" sits before "연구", so a label
/// such as "중소규모 연구소" is `Small`.
pub const SCALE_RULES: &[(&[&str], Scale)] = &[
    (&["대기업", "대규모"], Scale::Large),
    (&["중기업", "중규모"], Scale::Medium),
    (&["소기업", "소규모"], Scale::Small),
    (&["연구"], Scale::Research),
];

fn first_match<T: Copy>(text: &str, rules: &[(&[&str], T)], fallback: T) -> T {
    let text = text.trim();
    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, value)| *value)
        .unwrap_or(fallback)
}

pub fn classify_field(text: &str) -> Field {
    first_match(text, FIELD_RULES, Field::Other)
}

pub fn classify_scale(text: &str) -> Scale {
    first_match(text, SCALE_RULES, Scale::Other)
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Reduction,
        Field::Adaptation,
        Field::Convergence,
        Field::Other,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Field::Reduction => "reduction",
            Field::Adaptation => "adaptation",
            Field::Convergence => "convergence",
            Field::Other => "other",
        }
    }

    /// Display label used by the dashboard.
    pub fn label_ko(&self) -> &'static str {
        match self {
            Field::Reduction => "감축",
            Field::Adaptation => "적응",
            Field::Convergence => "융복합",
            Field::Other => "기타",
        }
    }
}

impl Scale {
    pub const ALL: [Scale; 5] = [
        Scale::Large,
        Scale::Medium,
        Scale::Small,
        Scale::Research,
        Scale::Other,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Scale::Large => "large",
            Scale::Medium => "medium",
            Scale::Small => "small",
            Scale::Research => "research",
            Scale::Other => "other",
        }
    }

    pub fn label_ko(&self) -> &'static str {
        match self {
            Scale::Large => "대기업",
            Scale::Medium => "중기업",
            Scale::Small => "소기업",
            Scale::Research => "연구기관",
            Scale::Other => "기타",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.id() == s)
            .ok_or_else(|| format!("unknown field id `{}`", s))
    }
}

impl FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scale::ALL
            .into_iter()
            .find(|sc| sc.id() == s)
            .ok_or_else(|| format!("unknown scale id `{}`", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_keywords() {
        assert_eq!(classify_field("감축 기술"), Field::Reduction);
        assert_eq!(classify_field("  적응기술 "), Field::Adaptation);
        assert_eq!(classify_field("융합기술"), Field::Convergence);
        assert_eq!(classify_field("융복합"), Field::Convergence);
        assert_eq!(classify_field("합계"), Field::Other);
        assert_eq!(classify_field(""), Field::Other);
    }

    #[test]
    fn field_rule_order_breaks_ties() {
        // both "감축" and "적응" present: the earlier rule wins
        assert_eq!(classify_field("적응 및 감축"), Field::Reduction);
    }

    #[test]
    fn field_is_deterministic() {
        for text in ["감축", "적응", "융합", "N/A", "reduction", "🌍", "융 합"] {
            let first = classify_field(text);
            assert_eq!(first, classify_field(text));
            assert!(Field::ALL.contains(&first));
        }
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(classify_field("Reduction"), Field::Other);
    }

    #[test]
    fn scale_keywords() {
        assert_eq!(classify_scale("대기업"), Scale::Large);
        assert_eq!(classify_scale("대규모 사업체"), Scale::Large);
        assert_eq!(classify_scale("중기업"), Scale::Medium);
        assert_eq!(classify_scale("소기업"), Scale::Small);
        assert_eq!(classify_scale("공공연구기관"), Scale::Research);
        assert_eq!(classify_scale("스타트업"), Scale::Other);
    }

    #[test]
    fn mixed_small_research_label_resolves_to_small() {
        // "중소규모" contains "소규모" (rule 3) before "연구" (rule 4) is tried
        assert_eq!(classify_scale("중소규모 연구소"), Scale::Small);
    }

    #[test]
    fn ids_round_trip() {
        for f in Field::ALL {
            assert_eq!(f.id().parse::<Field>(), Ok(f));
        }
        for s in Scale::ALL {
            assert_eq!(s.to_string().parse::<Scale>(), Ok(s));
        }
        assert!("감축".parse::<Field>().is_err());
    }
}
