//! Interactive name resolution.
//!
//! Duplicate or overlong names are settled by asking the operator. With
//! `--yes` the deterministic suffix resolver answers instead.

use dialoguer::Input;
use indicatif::ProgressBar;

use sitemover_core::model::MAX_NAME_LEN;
use sitemover_core::{EntityKind, NameResolver, SuffixResolver};

/// Asks on the terminal. An empty answer (or a closed terminal) declines.
pub struct PromptResolver {
    bar: ProgressBar,
}

impl PromptResolver {
    /// Prompts are drawn with `bar` suspended so the two don't interleave.
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }

    fn ask(&self, prompt: String) -> Option<String> {
        self.bar.suspend(|| {
            Input::<String>::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .validate_with(|input: &String| -> Result<(), String> {
                    if input.chars().count() > MAX_NAME_LEN {
                        Err(format!("names are limited to {MAX_NAME_LEN} characters"))
                    } else {
                        Ok(())
                    }
                })
                .interact_text()
                .ok()
                .map(|answer| answer.trim().to_owned())
                .filter(|answer| !answer.is_empty())
        })
    }
}

impl NameResolver for PromptResolver {
    fn resolve_duplicate(&mut self, kind: EntityKind, name: &str) -> Option<String> {
        self.ask(format!(
            "{kind} '{name}' already exists. New name (empty to skip)"
        ))
    }

    fn shorten(&mut self, kind: EntityKind, name: &str) -> Option<String> {
        self.ask(format!(
            "{kind} name '{name}' is longer than {MAX_NAME_LEN} characters. New name (empty to skip)"
        ))
    }
}

/// Resolver chosen by `--yes`.
pub enum Resolver {
    Prompt(PromptResolver),
    Suffix(SuffixResolver),
}

impl Resolver {
    pub fn for_run(yes: bool, bar: ProgressBar) -> Self {
        if yes {
            Self::Suffix(SuffixResolver::new())
        } else {
            Self::Prompt(PromptResolver::new(bar))
        }
    }
}

impl NameResolver for Resolver {
    fn resolve_duplicate(&mut self, kind: EntityKind, name: &str) -> Option<String> {
        match self {
            Self::Prompt(r) => r.resolve_duplicate(kind, name),
            Self::Suffix(r) => r.resolve_duplicate(kind, name),
        }
    }

    fn shorten(&mut self, kind: EntityKind, name: &str) -> Option<String> {
        match self {
            Self::Prompt(r) => r.shorten(kind, name),
            Self::Suffix(r) => r.shorten(kind, name),
        }
    }
}
