//! End-to-end ballot handling against the mock scanner.

mod common;

use common::{Harness, HarnessBuilder, Scripted, ScriptedInterpreter, election};
use precinct_core::{InterpretationSummary, ScannerSettings};
use precinct_hardware::{DoubleSheetDetection, FormMovement, RawStatus};
use precinct_machine::{MachineConfig, ManualScan, PublicState};
use precinct_store::MemorySheetStore;
use rstest::rstest;
use std::collections::HashSet;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_accept_valid_ballot() {
    let mut harness = Harness::idle().await;

    let ready = harness.insert_and_wait(PublicState::ReadyToAccept).await;
    assert_eq!(ready.interpretation, Some(InterpretationSummary::ValidSheet));
    assert_eq!(ready.ballots_counted, 0);

    let accepted = harness.accept_and_clear().await;
    assert_eq!(accepted.ballots_counted, 1);
    assert_eq!(
        harness.device.movements(),
        vec![FormMovement::EjectPaperForward, FormMovement::Stop]
    );

    let adds = harness.store.add_calls().await;
    assert_eq!(adds.len(), 1);
    let stored = harness.store.sheet(adds[0]).await.unwrap();
    assert!(!stored.deleted);
    assert!(!stored.adjudicated);
    assert!(stored.pages[0].image.starts_with("memory:"));

    let idle = harness.scanner.status();
    assert_eq!(idle.state, PublicState::NoPaper);
    assert_eq!(idle.interpretation, None);
    assert_eq!(idle.ballots_counted, 1);
}

#[tokio::test(start_paused = true)]
async fn test_status_never_carries_votes() {
    let mut harness = Harness::idle().await;
    harness.insert_and_wait(PublicState::ReadyToAccept).await;

    let json = serde_json::to_string(&harness.scanner.status()).unwrap();
    assert!(json.contains("ValidSheet"));
    assert!(!json.contains("choice-"));
    assert!(!json.contains("pages"));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_ballot_rejected_and_uncounted() {
    let mut harness = HarnessBuilder::new()
        .interpreter(ScriptedInterpreter::always(Scripted::Invalid))
        .start();
    harness.wait_for(PublicState::NoPaper).await;

    harness.device.insert_sheet();
    harness.wait_for(PublicState::Rejecting).await;
    let rejected = harness.wait_for(PublicState::Rejected).await;
    assert!(matches!(
        rejected.interpretation,
        Some(InterpretationSummary::InvalidSheet { .. })
    ));
    assert_eq!(rejected.ballots_counted, 0);
    assert!(harness.device.status().all_front());

    let adds = harness.store.add_calls().await;
    assert_eq!(adds.len(), 1);
    assert!(harness.store.sheet(adds[0]).await.unwrap().deleted);

    harness.device.remove_paper();
    let idle = harness.wait_for(PublicState::NoPaper).await;
    assert_eq!(idle.error, None);
    assert_eq!(idle.interpretation, None);
}

#[tokio::test(start_paused = true)]
async fn test_review_then_return() {
    let mut harness = HarnessBuilder::new()
        .interpreter(ScriptedInterpreter::always(Scripted::NeedsReview))
        .start();
    harness.wait_for(PublicState::NoPaper).await;

    let review = harness.insert_and_wait(PublicState::NeedsReview).await;
    assert!(matches!(
        review.interpretation,
        Some(InterpretationSummary::NeedsReviewSheet { .. })
    ));

    harness.scanner.return_ballot().unwrap();
    harness.wait_for(PublicState::Returning).await;
    let returned = harness.wait_for(PublicState::Returned).await;
    assert_eq!(returned.ballots_counted, 0);
    assert_eq!(returned.error, None);

    let adds = harness.store.add_calls().await;
    assert_eq!(adds.len(), 1);
    assert!(harness.store.sheet(adds[0]).await.unwrap().deleted);

    harness.device.remove_paper();
    harness.wait_for(PublicState::NoPaper).await;
}

#[tokio::test(start_paused = true)]
async fn test_review_then_accept_is_adjudicated() {
    let mut harness = HarnessBuilder::new()
        .interpreter(ScriptedInterpreter::always(Scripted::NeedsReview))
        .start();
    harness.wait_for(PublicState::NoPaper).await;
    harness.insert_and_wait(PublicState::NeedsReview).await;

    harness.scanner.accept().unwrap();
    harness.wait_for(PublicState::AcceptingAfterReview).await;
    let accepted = harness.wait_for(PublicState::Accepted).await;
    assert_eq!(accepted.ballots_counted, 1);

    let adds = harness.store.add_calls().await;
    let stored = harness.store.sheet(adds[0]).await.unwrap();
    assert!(stored.adjudicated);
    assert!(!stored.deleted);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
#[tokio::test(start_paused = true)]
async fn test_interpretation_retries_are_bounded(#[case] max_attempts: u32) {
    let interpreter = ScriptedInterpreter::always(Scripted::Fail);
    let mut harness = HarnessBuilder::new()
        .interpreter(interpreter.clone())
        .config(MachineConfig::default().max_failed_scan_attempts(max_attempts))
        .start();
    harness.wait_for(PublicState::NoPaper).await;

    harness.device.insert_sheet();
    let rejected = harness.wait_for(PublicState::Rejected).await;

    assert_eq!(rejected.error, Some("interpretation_failed"));
    let expected = max_attempts as usize + 1;
    assert_eq!(harness.device.scan_count(), expected);
    assert_eq!(interpreter.calls(), expected);
    assert!(harness.store.add_calls().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_interpretation_rescans_then_accepts() {
    let interpreter = ScriptedInterpreter::valid().then(Scripted::Fail);
    let mut harness = HarnessBuilder::new().interpreter(interpreter.clone()).start();
    harness.wait_for(PublicState::NoPaper).await;

    harness.device.insert_sheet();
    harness.wait_for(PublicState::ReturningToRescan).await;
    let ready = harness.wait_for(PublicState::ReadyToAccept).await;

    assert_eq!(ready.error, None);
    assert_eq!(interpreter.calls(), 2);
    assert_eq!(harness.device.scan_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_each_sheet_recorded_once() {
    let interpreter = ScriptedInterpreter::valid()
        .then(Scripted::Valid)
        .then(Scripted::Invalid)
        .then(Scripted::Valid);
    let mut harness = HarnessBuilder::new().interpreter(interpreter).start();
    harness.wait_for(PublicState::NoPaper).await;

    harness.insert_and_wait(PublicState::ReadyToAccept).await;
    harness.accept_and_clear().await;

    harness.device.insert_sheet();
    harness.wait_for(PublicState::Rejected).await;
    harness.device.remove_paper();
    harness.wait_for(PublicState::NoPaper).await;

    harness.insert_and_wait(PublicState::ReadyToAccept).await;
    let accepted = harness.accept_and_clear().await;
    assert_eq!(accepted.ballots_counted, 2);

    let adds = harness.store.add_calls().await;
    let unique: HashSet<_> = adds.iter().copied().collect();
    assert_eq!(adds.len(), 3);
    assert_eq!(unique.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_sheet_inserted_during_accept_counts_first() {
    let mut harness = Harness::idle().await;
    harness.insert_and_wait(PublicState::ReadyToAccept).await;

    harness.device.stall_eject(true);
    harness.scanner.accept().unwrap();
    harness.wait_for(PublicState::Accepting).await;
    harness.device.insert_sheet();

    let accepted = harness.wait_for(PublicState::Accepted).await;
    assert_eq!(accepted.ballots_counted, 1);
    assert!(harness.device.movements().contains(&FormMovement::LoadPaper));

    harness.device.stall_eject(false);
    let next = harness.wait_for(PublicState::ReadyToAccept).await;
    assert_eq!(next.ballots_counted, 1);
    assert_eq!(harness.store.add_calls().await.len(), 1);

    let accepted = harness.accept_and_clear().await;
    assert_eq!(accepted.ballots_counted, 2);
}

#[tokio::test(start_paused = true)]
async fn test_shoeshine_mode_counts_without_ejecting() {
    let store = MemorySheetStore::with_election(election());
    store
        .set_scanner_settings(ScannerSettings {
            is_shoeshine_mode_enabled: true,
            ..ScannerSettings::default()
        })
        .await;
    let mut harness = HarnessBuilder::new().store(store).start();
    harness.wait_for(PublicState::NoPaper).await;
    harness.insert_and_wait(PublicState::ReadyToAccept).await;

    harness.scanner.accept().unwrap();
    let accepted = harness.wait_for(PublicState::Accepted).await;
    assert_eq!(accepted.ballots_counted, 1);

    // The same paper comes back around for another pass.
    let again = harness.wait_for(PublicState::ReadyToAccept).await;
    assert_eq!(again.ballots_counted, 1);
    assert_eq!(harness.device.scan_count(), 2);
    assert!(!harness.device.movements().contains(&FormMovement::EjectPaperForward));
    assert_eq!(harness.store.add_calls().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_double_feed_detection_setting_respected() {
    let store = MemorySheetStore::with_election(election());
    store
        .set_scanner_settings(ScannerSettings {
            is_double_feed_detection_disabled: true,
            ..ScannerSettings::default()
        })
        .await;
    let mut harness = HarnessBuilder::new().store(store).start();
    harness.wait_for(PublicState::NoPaper).await;

    harness.insert_and_wait(PublicState::ReadyToAccept).await;

    let options = harness.device.last_scan_options().unwrap();
    assert_eq!(options.double_sheet_detection, DoubleSheetDetection::Disabled);
    assert!(options.hold_after_scan);
}

#[tokio::test(start_paused = true)]
async fn test_manual_scan_waits_for_command() {
    let mut harness = HarnessBuilder::new().gate(ManualScan).start();
    harness.wait_for(PublicState::NoPaper).await;

    harness.insert_and_wait(PublicState::HardwareReadyToScan).await;
    harness.idle_for(Duration::from_secs(5)).await;
    assert_eq!(harness.scanner.status().state, PublicState::HardwareReadyToScan);
    assert_eq!(harness.device.scan_count(), 0);

    harness.scanner.scan().unwrap();
    harness.wait_for(PublicState::ReadyToAccept).await;
    assert_eq!(harness.device.scan_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_commands_ignored_when_idle() {
    let harness = Harness::idle().await;
    let transitions = harness.scanner.history().len();

    harness.scanner.scan().unwrap();
    harness.scanner.accept().unwrap();
    harness.scanner.return_ballot().unwrap();
    harness.idle_for(Duration::from_secs(2)).await;

    assert_eq!(harness.scanner.history().len(), transitions);
    assert_eq!(harness.scanner.status().state, PublicState::NoPaper);
    assert!(harness.device.movements().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_push_scanner_cycle() {
    let mut harness = HarnessBuilder::new().push().start();
    assert!(harness.scanner.supports_ultrasonic());
    harness.wait_for(PublicState::NoPaper).await;

    harness.insert_and_wait(PublicState::ReadyToAccept).await;
    let accepted = harness.accept_and_clear().await;
    assert_eq!(accepted.ballots_counted, 1);
}

#[tokio::test(start_paused = true)]
async fn test_count_resumes_from_store() {
    let mut first = Harness::idle().await;
    first.insert_and_wait(PublicState::ReadyToAccept).await;
    first.accept_and_clear().await;
    let store = first.store.clone();
    first.scanner.shutdown().await.unwrap();

    let mut second = HarnessBuilder::new().store(store).start();
    let idle = second.wait_for(PublicState::NoPaper).await;
    assert_eq!(idle.ballots_counted, 1);
}

#[tokio::test(start_paused = true)]
async fn test_paper_on_both_sides_while_idle() {
    let mut harness = Harness::idle().await;

    harness.device.set_status(RawStatus::paper_on_both_sides());
    harness.wait_for(PublicState::Jammed).await;
    assert!(harness.device.movements().contains(&FormMovement::RetractPaperBackward));

    // The retracted sheet sits at the front and is picked up again.
    harness.wait_for(PublicState::ReadyToAccept).await;
    assert_eq!(harness.device.scan_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_history_records_cycle() {
    let mut harness = Harness::idle().await;
    harness.insert_and_wait(PublicState::ReadyToAccept).await;

    let history = harness.scanner.history();
    let first = history.first().unwrap();
    assert_eq!(first.from.to_string(), "connecting");
    assert_eq!(first.to.to_string(), "checking_initial_paper_status");
    assert!(first.event.starts_with("action:"));

    let last = history.last().unwrap();
    assert_eq!(last.to.to_string(), "ready_to_accept");
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(history.iter().all(|t| !t.event.contains("choice-")));
}
