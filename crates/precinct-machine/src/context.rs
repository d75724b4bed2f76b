//! Mutable record carried alongside the state.

use crate::error::MachineFault;
use precinct_core::{Interpretation, PageRecord, SheetId, SheetPages};
use precinct_hardware::{GrayImage, SharedScannerClient};
use std::path::PathBuf;
use std::sync::Arc;

/// Where one side of a scanned sheet is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    File(PathBuf),
    Memory(Arc<GrayImage>),
}

impl ImageRef {
    /// Location recorded with the sheet.
    #[must_use]
    pub fn location(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Memory(image) => format!("memory:{}x{}", image.width, image.height),
        }
    }
}

/// Archived images of a scanned sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedSheet {
    pub sheet_id: SheetId,
    pub front: ImageRef,
    pub back: ImageRef,
}

/// Controller context.
///
/// Written only by the transition function.
#[derive(Debug, Default)]
pub struct Context {
    /// Present only while connected
    pub client: Option<SharedScannerClient>,
    pub scanned_sheet: Option<ScannedSheet>,
    pub interpretation: Option<Interpretation>,
    pub error: Option<MachineFault>,
    pub failed_scan_attempts: u32,
    pub ballots_counted: u64,
    /// Last sheet handed to the store
    pub recorded_sheet: Option<SheetId>,
}

impl Context {
    #[must_use]
    pub fn new(ballots_counted: u64) -> Self {
        Self {
            ballots_counted,
            ..Self::default()
        }
    }

    /// Forget the current sheet and any error from its cycle.
    pub fn clear_sheet(&mut self) {
        self.scanned_sheet = None;
        self.interpretation = None;
        self.error = None;
    }

    /// Whether the current interpretation has already been recorded.
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        match (&self.interpretation, self.recorded_sheet) {
            (Some(interpretation), Some(recorded)) => interpretation.sheet_id() == recorded,
            _ => false,
        }
    }

    /// Store pages for the current interpretation.
    #[must_use]
    pub fn sheet_pages(&self) -> Option<(SheetId, SheetPages)> {
        let interpretation = self.interpretation.as_ref()?;
        let sheet_id = interpretation.sheet_id();
        let [front, back] = interpretation.pages().clone();
        let (front_image, back_image) = match &self.scanned_sheet {
            Some(sheet) if sheet.sheet_id == sheet_id => {
                (sheet.front.location(), sheet.back.location())
            }
            _ => (String::new(), String::new()),
        };
        Some((
            sheet_id,
            [
                PageRecord {
                    image: front_image,
                    interpretation: front,
                },
                PageRecord {
                    image: back_image,
                    interpretation: back,
                },
            ],
        ))
    }

    /// Loggable view of the context.
    #[must_use]
    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            connected: self.client.is_some(),
            scanned_sheet: self.scanned_sheet.as_ref().map(|sheet| sheet.sheet_id),
            interpretation: self.interpretation.as_ref().map(Interpretation::type_name),
            error: self.error.as_ref().map(MachineFault::code),
            failed_scan_attempts: self.failed_scan_attempts,
            ballots_counted: self.ballots_counted,
        }
    }
}

/// Context fields safe to log. Interpretations are reduced to their type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSummary {
    pub connected: bool,
    pub scanned_sheet: Option<SheetId>,
    pub interpretation: Option<&'static str>,
    pub error: Option<&'static str>,
    pub failed_scan_attempts: u32,
    pub ballots_counted: u64,
}

fn show<T: std::fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map_or_else(|| "none".to_string(), ToString::to_string)
}

impl ContextSummary {
    /// Field-by-field changes from `before` to `self`.
    #[must_use]
    pub fn changes_since(&self, before: &ContextSummary) -> Vec<String> {
        let mut changes = Vec::new();
        if self.connected != before.connected {
            changes.push(format!("connected: {} -> {}", before.connected, self.connected));
        }
        if self.scanned_sheet != before.scanned_sheet {
            changes.push(format!(
                "scanned_sheet: {} -> {}",
                show(&before.scanned_sheet),
                show(&self.scanned_sheet)
            ));
        }
        if self.interpretation != before.interpretation {
            changes.push(format!(
                "interpretation: {} -> {}",
                show(&before.interpretation),
                show(&self.interpretation)
            ));
        }
        if self.error != before.error {
            changes.push(format!("error: {} -> {}", show(&before.error), show(&self.error)));
        }
        if self.failed_scan_attempts != before.failed_scan_attempts {
            changes.push(format!(
                "failed_scan_attempts: {} -> {}",
                before.failed_scan_attempts, self.failed_scan_attempts
            ));
        }
        if self.ballots_counted != before.ballots_counted {
            changes.push(format!(
                "ballots_counted: {} -> {}",
                before.ballots_counted, self.ballots_counted
            ));
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use precinct_core::{PageInterpretation, ScannerErrorKind};

    fn interpretation(sheet_id: SheetId) -> Interpretation {
        Interpretation::ValidSheet {
            sheet_id,
            pages: [
                PageInterpretation {
                    page_number: 1,
                    ..Default::default()
                },
                PageInterpretation {
                    page_number: 2,
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn test_recorded_guard_tracks_sheet() {
        let sheet_id = SheetId::new();
        let mut context = Context::new(0);
        context.interpretation = Some(interpretation(sheet_id));
        assert!(!context.is_recorded());

        context.recorded_sheet = Some(sheet_id);
        assert!(context.is_recorded());

        context.interpretation = Some(interpretation(SheetId::new()));
        assert!(!context.is_recorded());
    }

    #[test]
    fn test_sheet_pages_use_archived_locations() {
        let sheet_id = SheetId::new();
        let mut context = Context::new(0);
        context.scanned_sheet = Some(ScannedSheet {
            sheet_id,
            front: ImageRef::File(PathBuf::from("/images/a-front.pgm")),
            back: ImageRef::File(PathBuf::from("/images/a-back.pgm")),
        });
        context.interpretation = Some(interpretation(sheet_id));

        let (id, pages) = context.sheet_pages().unwrap();
        assert_eq!(id, sheet_id);
        assert_eq!(pages[0].image, "/images/a-front.pgm");
        assert_eq!(pages[1].interpretation.page_number, 2);
    }

    #[test]
    fn test_sheet_pages_require_interpretation() {
        assert!(Context::new(0).sheet_pages().is_none());
    }

    #[test]
    fn test_clear_sheet_keeps_counters() {
        let mut context = Context::new(4);
        context.failed_scan_attempts = 1;
        context.error = Some(ScannerErrorKind::ScanningFailed.into());
        context.interpretation = Some(interpretation(SheetId::new()));

        context.clear_sheet();

        assert!(context.interpretation.is_none());
        assert!(context.error.is_none());
        assert_eq!(context.failed_scan_attempts, 1);
        assert_eq!(context.ballots_counted, 4);
    }

    #[test]
    fn test_summary_diff() {
        let mut context = Context::new(0);
        let before = context.summary();

        context.interpretation = Some(interpretation(SheetId::new()));
        context.ballots_counted = 1;

        let changes = context.summary().changes_since(&before);
        assert_eq!(
            changes,
            vec![
                "interpretation: none -> ValidSheet".to_string(),
                "ballots_counted: 0 -> 1".to_string(),
            ]
        );
    }
}
