//! Cross-rule longest-match preservation.
//!
//! TextMate tries patterns in order and takes the first match, while ANTLR
//! takes the longest. Two correction passes approximate ANTLR's behavior:
//! automatic reordering when one rule's fixed text extends another's, and
//! configured conflict groups that merge rules into a single pattern with
//! ordered alternation.

use crate::config::RuleConflict;
use crate::diagnostics::Diagnostics;
use rowan::TextRange;

use super::TokenPattern;
use super::keywords::{has_suffix_anchor, is_word_char};

/// Reorders patterns so that when rule B can match a strict extension of rule
/// A's text and A's pattern would claim the shorter prefix, B comes first.
pub(crate) fn reorder_for_longest_match(patterns: &mut Vec<TokenPattern>) {
    let mut guard = patterns.len() * patterns.len() + 1;
    loop {
        guard = guard.saturating_sub(1);
        let Some((from, to)) = find_misordered_pair(patterns) else {
            break;
        };
        if guard == 0 {
            break;
        }
        let pattern = patterns.remove(from);
        patterns.insert(to, pattern);
    }
}

fn find_misordered_pair(patterns: &[TokenPattern]) -> Option<(usize, usize)> {
    for i in 0..patterns.len() {
        for j in i + 1..patterns.len() {
            if must_precede(&patterns[j], &patterns[i]) {
                return Some((j, i));
            }
        }
    }
    None
}

/// `longer` must precede `shorter` when some text of `longer` strictly
/// extends a text of `shorter` and `shorter`'s pattern would match that
/// prefix (its boundary anchor, if any, does not reject the cut).
fn must_precede(longer: &TokenPattern, shorter: &TokenPattern) -> bool {
    let (Some(long_texts), Some(short_texts)) = (&longer.texts, &shorter.texts) else {
        return false;
    };
    let anchored = has_suffix_anchor(short_texts);

    for short in short_texts.iter().filter(|t| !t.is_empty()) {
        for long in long_texts.iter() {
            if long.len() <= short.len() || !long.starts_with(short.as_str()) {
                continue;
            }
            let last = short.chars().next_back().expect("non-empty");
            let next = long[short.len()..].chars().next().expect("strict extension");
            let boundary_at_cut = is_word_char(last) != is_word_char(next);
            if !anchored || boundary_at_cut {
                return true;
            }
        }
    }
    false
}

/// Applies configured conflict groups: members are merged into one pattern
/// whose alternation follows the declared priority order, with one capture
/// group per member carrying that member's scope.
pub(crate) fn apply_rule_conflicts(
    mut patterns: Vec<TokenPattern>,
    conflicts: &[RuleConflict],
    diagnostics: &mut Diagnostics,
    grammar_span: TextRange,
) -> Vec<TokenPattern> {
    for conflict in conflicts {
        let mut member_positions = Vec::new();
        for name in &conflict.rules {
            match patterns
                .iter()
                .position(|p| p.rule_name.as_deref() == Some(name) || &p.key == name)
            {
                Some(pos) => member_positions.push(pos),
                None => diagnostics
                    .warning(
                        format!("rule conflict mentions unknown rule `{name}`"),
                        grammar_span,
                    )
                    .emit(),
            }
        }
        if member_positions.len() < 2 {
            continue;
        }

        let insert_at = member_positions.iter().copied().min().expect("non-empty");
        let mut members = Vec::with_capacity(member_positions.len());
        member_positions.sort_unstable_by(|a, b| b.cmp(a));
        for pos in &member_positions {
            members.push(patterns.remove(*pos));
        }
        // Removal walked from the back; restore declared order.
        members.sort_by_key(|m| {
            conflict
                .rules
                .iter()
                .position(|n| m.rule_name.as_deref() == Some(n) || &m.key == n)
        });

        patterns.insert(insert_at.min(patterns.len()), merge_patterns(members));
    }
    patterns
}

/// One pattern per group: ordered alternation of capturing branches, scope
/// attached per branch through `captures`.
fn merge_patterns(members: Vec<TokenPattern>) -> TokenPattern {
    let key = members
        .iter()
        .map(|m| m.key.as_str())
        .collect::<Vec<_>>()
        .join("-");
    let regex = members
        .iter()
        .map(|m| format!("({})", m.regex))
        .collect::<Vec<_>>()
        .join("|");
    let captures = members
        .iter()
        .enumerate()
        .map(|(i, m)| ((i + 1).to_string(), m.scope.clone()))
        .collect();

    TokenPattern {
        key,
        rule_name: None,
        scope: String::new(),
        regex,
        texts: None,
        captures,
    }
}
