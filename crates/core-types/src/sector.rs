// In crates/core-types/src/sector.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// One of the fixed desk coverage areas that submit a daily recap.
///
/// The declaration order is the canonical presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sector {
    #[serde(rename = "Australia IG")]
    AustraliaIg,
    #[serde(rename = "Japan IG")]
    JapanIg,
    #[serde(rename = "China IG")]
    ChinaIg,
    #[serde(rename = "SEA IG")]
    SeaIg,
    #[serde(rename = "India IG")]
    IndiaIg,
    #[serde(rename = "Sovs")]
    Sovs,
}

impl Sector {
    /// Every sector, in canonical order.
    pub const ALL: [Sector; 6] = [
        Sector::AustraliaIg,
        Sector::JapanIg,
        Sector::ChinaIg,
        Sector::SeaIg,
        Sector::IndiaIg,
        Sector::Sovs,
    ];

    /// The cardinality of the sector set. A date is complete once this many
    /// distinct sectors have submitted.
    pub const COUNT: usize = Self::ALL.len();

    /// The display label, which is also the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            Sector::AustraliaIg => "Australia IG",
            Sector::JapanIg => "Japan IG",
            Sector::ChinaIg => "China IG",
            Sector::SeaIg => "SEA IG",
            Sector::IndiaIg => "India IG",
            Sector::Sovs => "Sovs",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Sector {
    type Err = Error;

    /// Accepts the label in any case, with spaces, dashes or underscores
    /// between the words (`"SEA IG"`, `"sea-ig"`, `"sea_ig"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Sector::ALL
            .into_iter()
            .find(|sector| normalize(sector.label()) == wanted)
            .ok_or_else(|| Error::UnknownSector(s.to_string()))
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// The sector part of a historical filter: everything, or a single sector.
///
/// Travels as a string: `"All"` or a sector label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SectorFilter {
    #[default]
    All,
    Only(Sector),
}

impl SectorFilter {
    pub fn matches(&self, sector: Sector) -> bool {
        match self {
            SectorFilter::All => true,
            SectorFilter::Only(wanted) => *wanted == sector,
        }
    }
}

impl FromStr for SectorFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(SectorFilter::All)
        } else {
            s.parse().map(SectorFilter::Only)
        }
    }
}

impl TryFrom<String> for SectorFilter {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SectorFilter> for String {
    fn from(filter: SectorFilter) -> Self {
        match filter {
            SectorFilter::All => "All".to_string(),
            SectorFilter::Only(sector) => sector.label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_str() {
        for sector in Sector::ALL {
            assert_eq!(sector.label().parse::<Sector>().unwrap(), sector);
        }
    }

    #[test]
    fn parses_cli_friendly_spellings() {
        assert_eq!("australia-ig".parse::<Sector>().unwrap(), Sector::AustraliaIg);
        assert_eq!("SEA_IG".parse::<Sector>().unwrap(), Sector::SeaIg);
        assert_eq!("sovs".parse::<Sector>().unwrap(), Sector::Sovs);
        assert!(matches!("Korea IG".parse::<Sector>(), Err(Error::UnknownSector(_))));
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&Sector::IndiaIg).unwrap();
        assert_eq!(json, "\"India IG\"");
        let back: Sector = serde_json::from_str("\"Japan IG\"").unwrap();
        assert_eq!(back, Sector::JapanIg);
    }

    #[test]
    fn sector_filter_parses_all_and_single() {
        assert_eq!("All".parse::<SectorFilter>().unwrap(), SectorFilter::All);
        assert_eq!(
            "china-ig".parse::<SectorFilter>().unwrap(),
            SectorFilter::Only(Sector::ChinaIg)
        );
        assert!(SectorFilter::All.matches(Sector::Sovs));
        assert!(!SectorFilter::Only(Sector::Sovs).matches(Sector::JapanIg));
    }

    #[test]
    fn sector_filter_json_forms() {
        let all: SectorFilter = serde_json::from_str("\"All\"").unwrap();
        assert_eq!(all, SectorFilter::All);
        let only: SectorFilter = serde_json::from_str("\"Sovs\"").unwrap();
        assert_eq!(only, SectorFilter::Only(Sector::Sovs));
        assert_eq!(serde_json::to_string(&SectorFilter::All).unwrap(), "\"All\"");
    }
}
