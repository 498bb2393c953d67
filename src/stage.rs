use crate::error::{AppError, AppResult};
use serde::Serialize;

/// Position in the admission funnel, stored as 1..=6 on the stakeholder record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AdmissionStage {
    Inquiry,
    ApplicationStarted,
    SubmittedForms,
    UnderReview,
    AcceptedOffers,
    Enrolled,
}

impl AdmissionStage {
    pub const ALL: [AdmissionStage; 6] = [
        AdmissionStage::Inquiry,
        AdmissionStage::ApplicationStarted,
        AdmissionStage::SubmittedForms,
        AdmissionStage::UnderReview,
        AdmissionStage::AcceptedOffers,
        AdmissionStage::Enrolled,
    ];

    pub fn from_number(n: i64) -> AppResult<Self> {
        match n {
            1 => Ok(AdmissionStage::Inquiry),
            2 => Ok(AdmissionStage::ApplicationStarted),
            3 => Ok(AdmissionStage::SubmittedForms),
            4 => Ok(AdmissionStage::UnderReview),
            5 => Ok(AdmissionStage::AcceptedOffers),
            6 => Ok(AdmissionStage::Enrolled),
            other => Err(AppError::InvalidStage(other)),
        }
    }

    pub fn number(self) -> i64 {
        match self {
            AdmissionStage::Inquiry => 1,
            AdmissionStage::ApplicationStarted => 2,
            AdmissionStage::SubmittedForms => 3,
            AdmissionStage::UnderReview => 4,
            AdmissionStage::AcceptedOffers => 5,
            AdmissionStage::Enrolled => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AdmissionStage::Inquiry => "Inquiry",
            AdmissionStage::ApplicationStarted => "Application Started",
            AdmissionStage::SubmittedForms => "Submitted Forms",
            AdmissionStage::UnderReview => "Under Review",
            AdmissionStage::AcceptedOffers => "Accepted Offers",
            AdmissionStage::Enrolled => "Enrolled/Confirmed",
        }
    }

    /// Label for a raw stage number; out-of-range values render empty.
    pub fn label_for(n: i64) -> &'static str {
        Self::from_number(n).map(Self::label).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn labels_are_total_and_unique() {
        let mut seen = HashSet::new();
        for n in 1..=6 {
            let stage = AdmissionStage::from_number(n).unwrap();
            assert_eq!(stage.number(), n);
            assert!(seen.insert(stage.label()), "duplicate label {}", stage.label());
        }
        assert_eq!(seen.len(), AdmissionStage::ALL.len());
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert!(matches!(
            AdmissionStage::from_number(0),
            Err(AppError::InvalidStage(0))
        ));
        assert!(AdmissionStage::from_number(7).is_err());
        assert_eq!(AdmissionStage::label_for(9), "");
    }

    #[test]
    fn stages_are_linearly_ordered() {
        for pair in AdmissionStage::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }
}
