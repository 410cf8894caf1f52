//! Per-run record of stage responses.

use std::collections::BTreeMap;

/// Responses recorded for each stage index during one run.
///
/// Entries are only inserted or overwritten; a skipped stage simply has no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutputs {
    by_stage: BTreeMap<usize, String>,
}

impl StageOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stage_index: usize, response: impl Into<String>) {
        self.by_stage.insert(stage_index, response.into());
    }

    pub fn get(&self, stage_index: usize) -> Option<&str> {
        self.by_stage.get(&stage_index).map(String::as_str)
    }

    pub fn contains(&self, stage_index: usize) -> bool {
        self.by_stage.contains_key(&stage_index)
    }

    pub fn len(&self) -> usize {
        self.by_stage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_stage.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_overwrites_previous_response() {
        let mut outputs = StageOutputs::new();
        outputs.record(2, "first");
        outputs.record(2, "second");
        assert_eq!(outputs.get(2), Some("second"));
        assert_eq!(outputs.len(), 1);
        assert!(!outputs.contains(1));
    }
}
