// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::model::WatchRule;

/// An ordered glob list with `!` negation, compiled into include/exclude sets.
///
/// Patterns are matched against forward-slash paths relative to some root
/// (the source root for copy/command/watch patterns, the output root for
/// clean patterns). A path matches when it matches at least one include
/// pattern and no exclude pattern, e.g.:
///
/// ```text
/// ["**/*.html", "!includes/**/*.html"]
/// ```
#[derive(Clone)]
pub struct PatternSet {
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternSet").finish_non_exhaustive()
    }
}

impl PatternSet {
    /// Compile a pattern list. Entries starting with `!` become excludes.
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let mut include = GlobSetBuilder::new();
        let mut exclude = GlobSetBuilder::new();
        let mut has_exclude = false;

        for pat in patterns {
            if let Some(negated) = pat.strip_prefix('!') {
                let glob = Glob::new(negated)
                    .with_context(|| format!("invalid glob pattern: {pat}"))?;
                exclude.add(glob);
                has_exclude = true;
            } else {
                let glob =
                    Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
                include.add(glob);
            }
        }

        Ok(Self {
            include: include.build()?,
            exclude: if has_exclude {
                Some(exclude.build()?)
            } else {
                None
            },
        })
    }

    /// True if `rel_path` matches an include pattern and no exclude pattern.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Compiled form of one `[[watch]]` rule, in registration order.
#[derive(Debug, Clone)]
pub struct RuleProfile {
    /// Position in the config's `[[watch]]` array.
    pub index: usize,
    /// Tasks to run on match, in declared order.
    pub tasks: Vec<String>,
    /// Inform the reload collaborator after a successful dispatch.
    pub live_reload: bool,
    patterns: PatternSet,
}

impl RuleProfile {
    /// True if this rule is interested in the given source-root-relative path.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.patterns.matches(rel_path)
    }
}

/// Compile every watch rule into a [`RuleProfile`], preserving order.
pub fn build_rule_profiles(rules: &[WatchRule]) -> Result<Vec<RuleProfile>> {
    let mut profiles = Vec::with_capacity(rules.len());

    for (index, rule) in rules.iter().enumerate() {
        let patterns = PatternSet::compile(&rule.files)
            .with_context(|| format!("building globset for watch rule #{}", index + 1))?;
        profiles.push(RuleProfile {
            index,
            tasks: rule.tasks.clone(),
            live_reload: rule.live_reload,
            patterns,
        });
    }

    Ok(profiles)
}
