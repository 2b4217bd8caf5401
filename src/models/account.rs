use serde::Deserialize;

/// Window over which a user's top items are computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopTimeRange {
    /// Roughly the last four weeks
    ShortTerm,
    /// Roughly the last six months
    #[default]
    MediumTerm,
    LongTerm,
}

impl TopTimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopTimeRange::ShortTerm => "short_term",
            TopTimeRange::MediumTerm => "medium_term",
            TopTimeRange::LongTerm => "long_term",
        }
    }
}
