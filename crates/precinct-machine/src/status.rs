//! Public status projection.

use crate::context::Context;
use crate::state::{PublicState, State};
use precinct_core::InterpretationSummary;
use serde::Serialize;

/// What the application sees of the controller.
///
/// Carries no vote content and no hardware detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecinctScannerStatus {
    pub state: PublicState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<InterpretationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    pub ballots_counted: u64,
}

impl PrecinctScannerStatus {
    /// Status before the controller has processed anything.
    #[must_use]
    pub fn initial(ballots_counted: u64) -> Self {
        Self {
            state: State::INITIAL.public(),
            interpretation: None,
            error: None,
            ballots_counted,
        }
    }
}

/// Project the internal state and context onto the public status.
#[must_use]
pub fn project(state: &State, ctx: &Context) -> PrecinctScannerStatus {
    let public = state.public();
    PrecinctScannerStatus {
        state: public,
        interpretation: ctx.interpretation.as_ref().map(|i| i.summary()),
        error: ctx
            .error
            .as_ref()
            .filter(|_| public.shows_error())
            .map(|fault| fault.code()),
        ballots_counted: ctx.ballots_counted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MachineFault;
    use crate::state::{ErrorPhase, RejectingPhase};
    use precinct_core::{
        Interpretation, InvalidSheetReason, PageInterpretation, ReviewReason, ScannerErrorKind,
        SheetId, Votes,
    };
    use precinct_hardware::ErrorCode;
    use proptest::prelude::*;

    fn context_with_error(fault: MachineFault) -> Context {
        let mut ctx = Context::new(3);
        ctx.error = Some(fault);
        ctx
    }

    #[test]
    fn test_error_shown_while_rejecting() {
        let ctx = context_with_error(ScannerErrorKind::PaperInBackAfterReconnect.into());
        let status = project(&State::Rejecting(RejectingPhase::Starting), &ctx);

        assert_eq!(status.state, PublicState::Rejecting);
        assert_eq!(status.error, Some("paper_in_back_after_reconnect"));
        assert_eq!(status.ballots_counted, 3);
    }

    #[test]
    fn test_error_hidden_outside_allow_list() {
        let ctx = context_with_error(ScannerErrorKind::ScanningFailed.into());
        assert_eq!(project(&State::NoPaper, &ctx).error, None);
        assert_eq!(project(&State::ReadyToAccept, &ctx).error, None);
    }

    #[test]
    fn test_hardware_error_reported_as_client_error() {
        let ctx = context_with_error(MachineFault::Hardware {
            code: Some(ErrorCode::ScannerError),
            message: "motor fault".to_string(),
        });
        let status = project(&State::Error(ErrorPhase::CoolingOff), &ctx);
        assert_eq!(status.error, Some("client_error"));
    }

    #[test]
    fn test_status_json_shape() {
        let status = PrecinctScannerStatus::initial(0);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "connecting", "ballotsCounted": 0 }));
    }

    fn arb_votes() -> impl Strategy<Value = Votes> {
        prop::collection::btree_map(
            "contest-[a-z]{3,8}",
            prop::collection::vec("choice-[a-z]{4,10}", 1..3),
            1..4,
        )
    }

    fn arb_interpretation() -> impl Strategy<Value = Interpretation> {
        (arb_votes(), arb_votes(), 0u8..3).prop_map(|(front, back, kind)| {
            let sheet_id = SheetId::new();
            let pages = [
                PageInterpretation {
                    page_number: 1,
                    votes: front,
                },
                PageInterpretation {
                    page_number: 2,
                    votes: back,
                },
            ];
            match kind {
                0 => Interpretation::ValidSheet { sheet_id, pages },
                1 => Interpretation::InvalidSheet {
                    sheet_id,
                    reason: InvalidSheetReason::InvalidPrecinct,
                    pages,
                },
                _ => Interpretation::NeedsReviewSheet {
                    sheet_id,
                    reasons: vec![ReviewReason::BlankBallot],
                    pages,
                },
            }
        })
    }

    proptest! {
        #[test]
        fn prop_status_never_contains_votes(interpretation in arb_interpretation()) {
            let mut ctx = Context::new(0);
            ctx.interpretation = Some(interpretation.clone());

            let json = serde_json::to_string(&project(&State::ReadyToAccept, &ctx)).unwrap();

            prop_assert!(!json.contains("votes"));
            prop_assert!(!json.contains("contest-"));
            prop_assert!(!json.contains("choice-"));
            prop_assert!(json.contains(interpretation.type_name()));
        }
    }
}
