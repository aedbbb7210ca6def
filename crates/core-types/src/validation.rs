// In crates/core-types/src/validation.rs

use crate::types::{ApacComments, SectorRecap};
use crate::{Error, Result};

/// Submission rules applied before anything reaches the store.
///
/// A failure blocks the submit action; the store never validates on its own.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

impl Validate for SectorRecap {
    fn validate(&self) -> Result<()> {
        require("marketMovesAndFlows", &self.market_moves_and_flows)?;
        require("marketCommentary", &self.market_commentary)
    }
}

impl Validate for ApacComments {
    fn validate(&self) -> Result<()> {
        require("marketCommentary", self.commentary())
    }
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::Validation { field })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Metrics, Sector};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
    }

    #[test]
    fn sector_recap_needs_both_text_fields() {
        let mut recap = SectorRecap::new(Sector::ChinaIg, date(), Metrics::zero());
        assert_eq!(
            recap.validate(),
            Err(Error::Validation { field: "marketMovesAndFlows" })
        );

        recap.market_moves_and_flows = "NA".into();
        recap.market_commentary = "   ".into();
        assert_eq!(recap.validate(), Err(Error::Validation { field: "marketCommentary" }));

        recap.market_commentary = "Pullback, closing +3/-1".into();
        assert!(recap.validate().is_ok());
    }

    #[test]
    fn apac_comments_need_commentary() {
        let mut comments = ApacComments::from_totals(Metrics::zero(), date());
        assert!(comments.validate().is_err());
        comments.market_commentary = Some("IG unch to 2bps tighter".into());
        assert!(comments.validate().is_ok());
    }
}
