//! Preset import flow control.
//!
//! `Idle → ConflictsDetected → ResolutionChosen → Applied`. Cancelling from
//! `ConflictsDetected` returns to `Idle`; `Applied` is terminal. Imports
//! without conflicts go straight from `Idle` to `ResolutionChosen`.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::Preset;
use crate::presets::{detect_conflicts, plan_import, ConflictResolution, ImportPlan, PresetConflict};

/// Counts of what an applied import changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub inserted: usize,
    pub updated: usize,
    pub backed_up: usize,
    pub skipped: usize,
}

/// Conflict review step: the batch plus the choices made so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictReview {
    pub incoming: Vec<Preset>,
    pub existing: Vec<Preset>,
    pub conflicts: Vec<PresetConflict>,
    pub default_resolution: ConflictResolution,
    pub overrides: HashMap<usize, ConflictResolution>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImportFlow {
    #[default]
    Idle,
    ConflictsDetected(ConflictReview),
    ResolutionChosen(ImportPlan),
    Applied(ImportOutcome),
}

impl ImportFlow {
    #[must_use]
    pub const fn state_name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ConflictsDetected(_) => "reviewing conflicts",
            Self::ResolutionChosen(_) => "ready to apply",
            Self::Applied(_) => "applied",
        }
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            action,
            state: self.state_name(),
        }
    }

    /// Start an import. Conflicts move the flow into review; otherwise the plan is ready.
    pub fn begin(
        &mut self,
        incoming: Vec<Preset>,
        existing: Vec<Preset>,
        default_resolution: ConflictResolution,
    ) -> Result<()> {
        if !matches!(self, Self::Idle) {
            return Err(self.invalid("start an import"));
        }

        let conflicts = detect_conflicts(&incoming, &existing);
        *self = if conflicts.is_empty() {
            Self::ResolutionChosen(plan_import(
                &incoming,
                &existing,
                default_resolution,
                &HashMap::new(),
            ))
        } else {
            tracing::debug!("Import has {} conflicting presets", conflicts.len());
            Self::ConflictsDetected(ConflictReview {
                incoming,
                existing,
                conflicts,
                default_resolution,
                overrides: HashMap::new(),
            })
        };
        Ok(())
    }

    /// Change the fallback resolution during review
    pub fn set_default_resolution(&mut self, resolution: ConflictResolution) -> Result<()> {
        match self {
            Self::ConflictsDetected(review) => {
                review.default_resolution = resolution;
                Ok(())
            }
            _ => Err(self.invalid("change the default resolution")),
        }
    }

    /// Pick a resolution for one conflicting item
    pub fn override_item(&mut self, index: usize, resolution: ConflictResolution) -> Result<()> {
        match self {
            Self::ConflictsDetected(review) => {
                if !review.conflicts.iter().any(|conflict| conflict.index == index) {
                    return Err(Error::InvalidInput(format!(
                        "import item {index} has no conflict to resolve"
                    )));
                }
                review.overrides.insert(index, resolution);
                Ok(())
            }
            _ => Err(self.invalid("override a conflict")),
        }
    }

    /// Finish review and compute the plan
    pub fn choose(&mut self) -> Result<()> {
        let plan = match self {
            Self::ConflictsDetected(review) => plan_import(
                &review.incoming,
                &review.existing,
                review.default_resolution,
                &review.overrides,
            ),
            _ => return Err(self.invalid("confirm resolutions")),
        };
        *self = Self::ResolutionChosen(plan);
        Ok(())
    }

    /// Abandon the review
    pub fn cancel(&mut self) -> Result<()> {
        if !matches!(self, Self::ConflictsDetected(_)) {
            return Err(self.invalid("cancel"));
        }
        *self = Self::Idle;
        Ok(())
    }

    /// The plan ready to apply
    #[must_use]
    pub const fn plan(&self) -> Option<&ImportPlan> {
        match self {
            Self::ResolutionChosen(plan) => Some(plan),
            _ => None,
        }
    }

    /// Record that the plan was executed
    pub fn mark_applied(&mut self, outcome: ImportOutcome) -> Result<()> {
        if !matches!(self, Self::ResolutionChosen(_)) {
            return Err(self.invalid("apply"));
        }
        *self = Self::Applied(outcome);
        Ok(())
    }
}
