//! The request that produced a version, recorded verbatim.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;
use crate::domain::series::{LookbackWindow, SeriesSelector};

fn default_tone() -> String {
    "ministerial".to_string()
}

fn default_length() -> String {
    "one_page".to_string()
}

/// Generation options supplied with a creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefingOptions {
    /// Reference date; the current date when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,

    #[serde(default)]
    pub window: LookbackWindow,

    /// Include secondary/comparison sources such as OECD.
    #[serde(default, alias = "include_oecd")]
    pub include_comparisons: bool,

    #[serde(default = "default_tone")]
    pub tone: String,

    #[serde(default = "default_length")]
    pub length: String,
}

impl Default for BriefingOptions {
    fn default() -> Self {
        Self {
            as_of: None,
            window: LookbackWindow::default(),
            include_comparisons: false,
            tone: default_tone(),
            length: default_length(),
        }
    }
}

impl BriefingOptions {
    pub fn with_window(mut self, window: LookbackWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    pub fn with_comparisons(mut self, include: bool) -> Self {
        self.include_comparisons = include;
        self
    }
}

/// Whether a chat edit rebuilds the data pack or reuses its parent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditPackPolicy {
    /// Reuse the parent version's pack verbatim.
    #[default]
    ReuseParent,
    /// Re-resolve the parent's selectors against the current store.
    Refresh,
}

/// What happens when generated citations still fail to ground after the
/// corrective retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundingFailurePolicy {
    /// Reject the request; no version is written.
    #[default]
    Reject,
    /// Commit the deterministic fallback document instead.
    FallbackToStub,
}

/// Whether a version was created from scratch or as a chat edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionKind {
    Create,
    Edit,
}

/// Inputs that produced a version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub kind: RevisionKind,
    pub topic: String,
    pub instruction: String,
    pub selectors: Vec<SeriesSelector>,
    pub options: BriefingOptions,
    /// Pack policy applied to an edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_policy: Option<EditPackPolicy>,
}

impl InputSpec {
    /// Spec for a creation request.
    pub fn create(
        topic: impl Into<String>,
        instruction: impl Into<String>,
        selectors: Vec<SeriesSelector>,
        options: BriefingOptions,
    ) -> Self {
        Self {
            kind: RevisionKind::Create,
            topic: topic.into(),
            instruction: instruction.into(),
            selectors,
            options,
            pack_policy: None,
        }
    }

    /// Spec for an edit of `parent`, carrying its selectors and options.
    pub fn edit(parent: &InputSpec, instruction: impl Into<String>, policy: EditPackPolicy) -> Self {
        Self {
            kind: RevisionKind::Edit,
            topic: parent.topic.clone(),
            instruction: instruction.into(),
            selectors: parent.selectors.clone(),
            options: parent.options.clone(),
            pack_policy: Some(policy),
        }
    }

    /// Validates the request before any work is done.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.topic.trim().is_empty() {
            return Err(ValidationError::empty_field("topic"));
        }
        if self.instruction.trim().is_empty() {
            return Err(ValidationError::empty_field("instruction"));
        }
        if self.selectors.is_empty() {
            return Err(ValidationError::empty_field("selectors"));
        }
        let mut seen = HashSet::new();
        for selector in &self.selectors {
            selector.validate()?;
            if !seen.insert(selector) {
                return Err(ValidationError::invalid_format(
                    "selectors",
                    format!("{} is selected more than once", selector.label()),
                ));
            }
        }
        self.options.window.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::SeriesSource;

    fn spec() -> InputSpec {
        InputSpec::create(
            "inflation",
            "Summarise the latest CPI print",
            vec![SeriesSelector::new(SeriesSource::Ons, "L522")],
            BriefingOptions::default(),
        )
    }

    #[test]
    fn options_default_from_empty_json() {
        let options: BriefingOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, BriefingOptions::default());
        assert_eq!(options.window, LookbackWindow::periods(24));
        assert_eq!(options.tone, "ministerial");
        assert_eq!(options.length, "one_page");
    }

    #[test]
    fn options_accept_include_oecd_alias() {
        let options: BriefingOptions = serde_json::from_str(r#"{"include_oecd": true}"#).unwrap();
        assert!(options.include_comparisons);
    }

    #[test]
    fn valid_spec_passes() {
        assert!(spec().validate().is_ok());
    }

    #[test]
    fn blank_instruction_is_rejected() {
        let mut s = spec();
        s.instruction = " ".to_string();
        assert_eq!(s.validate(), Err(ValidationError::empty_field("instruction")));
    }

    #[test]
    fn no_selectors_is_rejected() {
        let mut s = spec();
        s.selectors.clear();
        assert_eq!(s.validate(), Err(ValidationError::empty_field("selectors")));
    }

    #[test]
    fn duplicate_selector_is_rejected() {
        let mut s = spec();
        s.selectors.push(SeriesSelector::new(SeriesSource::Ons, "L522"));
        assert!(s.validate().is_err());
    }

    #[test]
    fn oversized_window_is_rejected() {
        let mut s = spec();
        s.options.window = LookbackWindow::periods(500);
        assert!(matches!(s.validate(), Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn edit_spec_inherits_parent_inputs() {
        let parent = spec();
        let edit = InputSpec::edit(&parent, "shorten", EditPackPolicy::Refresh);
        assert_eq!(edit.kind, RevisionKind::Edit);
        assert_eq!(edit.selectors, parent.selectors);
        assert_eq!(edit.pack_policy, Some(EditPackPolicy::Refresh));
        assert_eq!(edit.instruction, "shorten");
    }

    #[test]
    fn policies_default_to_reuse_and_reject() {
        assert_eq!(EditPackPolicy::default(), EditPackPolicy::ReuseParent);
        assert_eq!(GroundingFailurePolicy::default(), GroundingFailurePolicy::Reject);
        assert_eq!(
            serde_json::to_string(&GroundingFailurePolicy::FallbackToStub).unwrap(),
            "\"fallback_to_stub\""
        );
    }
}
