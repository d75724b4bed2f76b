use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Identifier of one physical scan of a sheet.
///
/// A fresh id is minted for every scan, so a sheet rescanned after a failed
/// interpretation gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetId(Uuid);

impl SheetId {
    /// Generate a new random sheet id.
    #[must_use]
    pub fn new() -> Self {
        SheetId(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SheetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SheetId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(SheetId)
            .map_err(|_| Error::InvalidSheetId(s.to_string()))
    }
}

/// Identifier of an operator-visible batch of sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    #[must_use]
    pub fn new() -> Self {
        BatchId(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BatchId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(BatchId)
            .map_err(|_| Error::InvalidBatchId(s.to_string()))
    }
}

/// Which precincts the scanner is configured to accept ballots for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrecinctSelection {
    AllPrecincts,
    SinglePrecinct { precinct_id: String },
}

/// Election configuration handed to the interpreter as one snapshot.
///
/// The machine reads a fresh copy for every interpretation so a configuration
/// change can never apply halfway through a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionConfig {
    /// Hash of the election definition the ballots were printed for
    pub election_hash: String,
    pub title: String,
    pub precinct_selection: PrecinctSelection,
    /// Test ballots are only accepted in test mode and vice versa
    pub is_test_mode: bool,
}

/// Operator-controlled scanner settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Diagnostic mode: accepted sheets are counted but never ejected
    pub is_shoeshine_mode_enabled: bool,
    pub is_double_feed_detection_disabled: bool,
}

/// Marks per contest: contest id to selected option ids.
pub type Votes = BTreeMap<String, Vec<String>>;

/// Interpretation of one side of a sheet.
///
/// Holds vote content and must never be exposed through the public status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageInterpretation {
    pub page_number: u32,
    pub votes: Votes,
}

/// Why a sheet cannot be tabulated at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidSheetReason {
    UnreadableBallot,
    InvalidElection,
    InvalidPrecinct,
    InvalidTestMode,
    VerticalStreaksDetected,
    Unknown,
}

/// Why a sheet needs voter or poll-worker review before it is counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewReason {
    BlankBallot,
    Overvote { contest_id: String },
    Undervote { contest_id: String },
    UnmarkedWriteIn { contest_id: String },
}

/// Result of interpreting a scanned sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Interpretation {
    ValidSheet {
        sheet_id: SheetId,
        pages: [PageInterpretation; 2],
    },
    InvalidSheet {
        sheet_id: SheetId,
        reason: InvalidSheetReason,
        pages: [PageInterpretation; 2],
    },
    NeedsReviewSheet {
        sheet_id: SheetId,
        reasons: Vec<ReviewReason>,
        pages: [PageInterpretation; 2],
    },
}

impl Interpretation {
    #[must_use]
    pub fn sheet_id(&self) -> SheetId {
        match self {
            Self::ValidSheet { sheet_id, .. }
            | Self::InvalidSheet { sheet_id, .. }
            | Self::NeedsReviewSheet { sheet_id, .. } => *sheet_id,
        }
    }

    #[must_use]
    pub fn pages(&self) -> &[PageInterpretation; 2] {
        match self {
            Self::ValidSheet { pages, .. }
            | Self::InvalidSheet { pages, .. }
            | Self::NeedsReviewSheet { pages, .. } => pages,
        }
    }

    /// Discriminant name, used for logging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ValidSheet { .. } => "ValidSheet",
            Self::InvalidSheet { .. } => "InvalidSheet",
            Self::NeedsReviewSheet { .. } => "NeedsReviewSheet",
        }
    }

    /// Redacted view without any vote content.
    #[must_use]
    pub fn summary(&self) -> InterpretationSummary {
        match self {
            Self::ValidSheet { .. } => InterpretationSummary::ValidSheet,
            Self::InvalidSheet { reason, .. } => {
                InterpretationSummary::InvalidSheet { reason: *reason }
            }
            Self::NeedsReviewSheet { reasons, .. } => InterpretationSummary::NeedsReviewSheet {
                reasons: reasons.clone(),
            },
        }
    }
}

/// Interpretation discriminant plus reasons, safe for public display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InterpretationSummary {
    ValidSheet,
    InvalidSheet { reason: InvalidSheetReason },
    NeedsReviewSheet { reasons: Vec<ReviewReason> },
}

/// One side of a sheet as handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Where the side's image was archived
    pub image: String,
    pub interpretation: PageInterpretation,
}

/// Front and back of a recorded sheet.
pub type SheetPages = [PageRecord; 2];

#[cfg(test)]
mod tests {
    use super::*;

    fn pages_with_votes() -> [PageInterpretation; 2] {
        let mut votes = Votes::new();
        votes.insert("mayor".to_string(), vec!["alice".to_string()]);
        [
            PageInterpretation {
                page_number: 1,
                votes,
            },
            PageInterpretation {
                page_number: 2,
                votes: Votes::new(),
            },
        ]
    }

    #[test]
    fn test_sheet_id_parse_round_trip() {
        let id = SheetId::new();
        let parsed: SheetId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_sheet_id_rejects_garbage() {
        assert!(matches!(
            "not-a-uuid".parse::<SheetId>(),
            Err(Error::InvalidSheetId(_))
        ));
    }

    #[test]
    fn test_sheet_ids_unique() {
        assert_ne!(SheetId::new(), SheetId::new());
    }

    #[test]
    fn test_summary_drops_votes() {
        let interpretation = Interpretation::NeedsReviewSheet {
            sheet_id: SheetId::new(),
            reasons: vec![ReviewReason::Overvote { contest_id: "mayor".to_string() }],
            pages: pages_with_votes(),
        };

        let json = serde_json::to_string(&interpretation.summary()).unwrap();
        assert!(json.contains("NeedsReviewSheet"));
        assert!(json.contains("mayor"));
        assert!(!json.contains("alice"));
    }

    #[test]
    fn test_interpretation_accessors() {
        let sheet_id = SheetId::new();
        let interpretation = Interpretation::InvalidSheet {
            sheet_id,
            reason: InvalidSheetReason::InvalidPrecinct,
            pages: pages_with_votes(),
        };

        assert_eq!(interpretation.sheet_id(), sheet_id);
        assert_eq!(interpretation.type_name(), "InvalidSheet");
        assert_eq!(interpretation.pages()[0].page_number, 1);
        assert_eq!(
            interpretation.summary(),
            InterpretationSummary::InvalidSheet { reason: InvalidSheetReason::InvalidPrecinct }
        );
    }

    #[test]
    fn test_interpretation_tagged_serialization() {
        let interpretation = Interpretation::ValidSheet {
            sheet_id: SheetId::new(),
            pages: pages_with_votes(),
        };
        let value = serde_json::to_value(&interpretation).unwrap();
        assert_eq!(value["type"], "ValidSheet");
    }
}
