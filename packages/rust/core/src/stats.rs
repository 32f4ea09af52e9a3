//! Per-run lookup counters.

use itemenrich_shared::EnrichStep;

/// Counters for one enrichment step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepTally {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichStats {
    /// Number of records that went through the enricher.
    pub records: usize,
    pub namespace: StepTally,
    pub namespace_settings: StepTally,
    pub metadata: StepTally,
    pub settings: StepTally,
}

impl EnrichStats {
    pub fn step(&self, step: EnrichStep) -> &StepTally {
        match step {
            EnrichStep::Namespace => &self.namespace,
            EnrichStep::NamespaceSettings => &self.namespace_settings,
            EnrichStep::Metadata => &self.metadata,
            EnrichStep::Settings => &self.settings,
        }
    }

    fn step_mut(&mut self, step: EnrichStep) -> &mut StepTally {
        match step {
            EnrichStep::Namespace => &mut self.namespace,
            EnrichStep::NamespaceSettings => &mut self.namespace_settings,
            EnrichStep::Metadata => &mut self.metadata,
            EnrichStep::Settings => &mut self.settings,
        }
    }

    pub(crate) fn record_outcome(&mut self, step: EnrichStep, ok: bool) {
        let tally = self.step_mut(step);
        tally.attempted += 1;
        if ok {
            tally.succeeded += 1;
        } else {
            tally.failed += 1;
        }
    }

    /// Failed lookups across all steps.
    pub fn failures(&self) -> usize {
        EnrichStep::ALL.iter().map(|s| self.step(*s).failed).sum()
    }

    /// Lookups attempted across all steps.
    pub fn attempts(&self) -> usize {
        EnrichStep::ALL.iter().map(|s| self.step(*s).attempted).sum()
    }
}
