//! The fixed eight-stage walkthrough catalog.
//!
//! Stages are referenced by their 1-based index. Stage `k`'s template may only
//! reference the vision and the outputs of stages `1..k`; the threader enforces
//! this by binding nothing else when rendering.

/// Number of stages in the walkthrough.
pub const STAGE_COUNT: usize = 8;

/// Immutable definition of a single walkthrough stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDefinition {
    /// 1-based position in the walkthrough.
    pub index: usize,
    /// Display name, also used as the fallback document header.
    pub name: &'static str,
    pub system_instruction: &'static str,
    /// minijinja template rendered by the context threader.
    pub prompt_template: &'static str,
    /// Document always written under the project root when the stage is applied.
    pub fallback_path: &'static str,
}

impl StageDefinition {
    /// Fallback document body: a header with the display name, then the raw response.
    pub fn fallback_content(&self, response: &str) -> String {
        format!("# {}\n\n{}", self.name, response)
    }
}

pub fn output_key(index: usize) -> String {
    format!("step{index}")
}

/// Look up a stage by its 1-based index.
pub fn stage(index: usize) -> Option<&'static StageDefinition> {
    index.checked_sub(1).and_then(|i| STAGES.get(i))
}

/// Fixed fallback document path for a stage index.
pub fn fallback_path(index: usize) -> Option<&'static str> {
    stage(index).map(|s| s.fallback_path)
}

pub fn all() -> &'static [StageDefinition] {
    &STAGES
}

static STAGES: [StageDefinition; STAGE_COUNT] = [
    StageDefinition {
        index: 1,
        name: "1) Context & Constraints Clarification",
        system_instruction: "You are a specialized solutions architect. The user will describe a domain or challenge.\n\
            Step 1: Summarize the user's domain, goals, and constraints thoroughly. Then, confirm your understanding of them.\n\
            Additionally, collect any unusual references or lesser-known methods you can recall that might apply.\n\
            DO NOT disclaim feasibility. Provide a crisp summary of what the user wants, plus a short list of unique references from outside the mainstream.",
        prompt_template: include_str!("prompts/stage1.md"),
        fallback_path: "doc/CONTEXT_CONSTRAINTS.md",
    },
    StageDefinition {
        index: 2,
        name: "2) Divergent Brainstorm of Solutions",
        system_instruction: "Step 2: Provide multiple new or radical solutions that incorporate the domain constraints and your cross-domain references.\n\n\
            Generate at least 5 distinct solutions.\n\
            Each solution must be novel, mixing known ideas in uncommon ways.\n\
            Avoid disclaimers like 'I'm only an AI' or 'This might not be feasible.' The user wants plausible near-future expansions.\n\
            Label them \"Solution A, B, C, etc.\"",
        prompt_template: include_str!("prompts/stage2.md"),
        fallback_path: "doc/DIVERGENT_SOLUTIONS.md",
    },
    StageDefinition {
        index: 3,
        name: "3) Deep-Dive on Each Idea's Mechanism",
        system_instruction: "Step 3: For each proposed solution, deep-dive into how it might work. This includes:\n\n\
            Underlying logic or theoretical basis.\n\
            Potential synergy with domain constraints.\n\
            A short example scenario or test application.\n\
            A rough list of pros/cons.\n\
            No disclaimers or feasibility disclaimers. Remain solution-focused.",
        prompt_template: include_str!("prompts/stage3.md"),
        fallback_path: "doc/DEEP_DIVE_MECHANISMS.md",
    },
    StageDefinition {
        index: 4,
        name: "4) Self-Critique for Gaps & Synergy",
        system_instruction: "Step 4: Critically review each solution for missing details, potential synergy across solutions, or expansions.\n\n\
            Identify any incomplete sub-points.\n\
            Suggest expansions or merges that might create an even stronger approach.\n\
            No disclaimers about the entire project's feasibility. Just refine or unify solutions.",
        prompt_template: include_str!("prompts/stage4.md"),
        fallback_path: "doc/SELF_CRITIQUE_SYNERGY.md",
    },
    StageDefinition {
        index: 5,
        name: "5) Merged Breakthrough Blueprint",
        system_instruction: "Step 5: Provide a final 'Merged Breakthrough Blueprint.' This blueprint is a synergy of the best or boldest features from the prior solutions, shaped into a coherent design.\n\n\
            Summarize the blueprint in 3-5 paragraphs, focusing on how it pushes beyond standard practice.\n\
            Emphasize real near-future expansions, not disclaimers.\n\
            Output the blueprint in `=== File: doc/BREAKTHROUGH_BLUEPRINT.md ===`",
        prompt_template: include_str!("prompts/stage5.md"),
        fallback_path: "doc/BREAKTHROUGH_BLUEPRINT.md",
    },
    StageDefinition {
        index: 6,
        name: "6) Implementation Path & Risk Minimization",
        system_instruction: "Step 6: Lay out an implementation or prototyping path. For each step, identify key resources needed.\n\
            No disclaimers about overall feasibility. Just ways to mitigate risk or handle challenges.\n\
            Output the implementation path in `=== File: doc/IMPLEMENTATION_PATH.md ===`",
        prompt_template: include_str!("prompts/stage6.md"),
        fallback_path: "doc/IMPLEMENTATION_PATH.md",
    },
    StageDefinition {
        index: 7,
        name: "7) Cross-Checking with Prior Knowledge",
        system_instruction: "Step 7: Attempt to cross-check if any known open-source or industrial projects come close to your blueprint, and highlight differences.\n\n\
            If no direct references exist, you can say it's presumably novel.\n\
            Avoid disclaimers; remain solution-based.\n\
            Output the cross-check in `=== File: doc/NOVELTY_CHECK.md ===`",
        prompt_template: include_str!("prompts/stage7.md"),
        fallback_path: "doc/NOVELTY_CHECK.md",
    },
    StageDefinition {
        index: 8,
        name: "8) Q&A or Additional Elaborations",
        system_instruction: "Step 8: The user may have specific follow-up questions. Provide direct expansions or clarifications, always focusing on near-future feasibility. Refrain from disclaimers. Always produce constructive expansions.\n\
            Output any elaborations in `=== File: doc/ELABORATIONS.md ===`",
        prompt_template: include_str!("prompts/stage8.md"),
        fallback_path: "doc/ELABORATIONS.md",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_indices_are_contiguous() {
        let indices: Vec<usize> = all().iter().map(|s| s.index).collect();
        assert_eq!(indices, (1..=STAGE_COUNT).collect::<Vec<_>>());
    }

    #[test]
    fn lookup_is_one_based() {
        assert!(stage(0).is_none());
        assert!(stage(STAGE_COUNT + 1).is_none());
        assert_eq!(stage(1).map(|s| s.index), Some(1));
        assert_eq!(stage(8).map(|s| s.index), Some(8));
    }

    #[test]
    fn fallback_paths_are_fixed_and_unique() {
        assert_eq!(fallback_path(1), Some("doc/CONTEXT_CONSTRAINTS.md"));
        assert_eq!(fallback_path(5), Some("doc/BREAKTHROUGH_BLUEPRINT.md"));
        assert_eq!(fallback_path(8), Some("doc/ELABORATIONS.md"));

        let unique: HashSet<&str> = all().iter().map(|s| s.fallback_path).collect();
        assert_eq!(unique.len(), STAGE_COUNT);
        assert!(all().iter().all(|s| s.fallback_path.starts_with("doc/")));
    }

    #[test]
    fn fallback_content_starts_with_display_name() {
        let blueprint = stage(5).expect("stage 5");
        let content = blueprint.fallback_content("body");
        assert_eq!(content, "# 5) Merged Breakthrough Blueprint\n\nbody");
    }
}
