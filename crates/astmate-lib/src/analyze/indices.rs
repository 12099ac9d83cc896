//! Counter-based index assignment for rule contexts.
//!
//! Two counters advance together along each traversal path: the overall child
//! counter and one counter per referenced token/rule type. Optionality makes
//! a counter ambiguous for *subsequent* siblings (the optional element's own
//! index stays definite); repetition makes it unbounded; block branches are
//! analyzed independently from the current state and merged by unanimous
//! vote.

use std::collections::HashMap;

use crate::diagnostics::Diagnostics;
use crate::grammar::{Alternative, ElementId, ElementKind, Grammar, Rule, SyntaxElement};

use super::{Analysis, ElementAnnotation, ElementIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Count {
    Exact(u32),
    Unbounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Counter {
    count: Count,
    ambiguous: bool,
}

impl Default for Counter {
    fn default() -> Self {
        Self {
            count: Count::Exact(0),
            ambiguous: false,
        }
    }
}

impl Counter {
    /// The index the next element of this type would receive, if definite.
    fn next_index(&self) -> Option<u32> {
        if self.ambiguous {
            return None;
        }
        match self.count {
            Count::Exact(n) => Some(n),
            Count::Unbounded => None,
        }
    }

    fn increment(&mut self) {
        if let Count::Exact(n) = self.count {
            self.count = Count::Exact(n + 1);
        }
    }

    fn make_unbounded(&mut self) {
        self.count = Count::Unbounded;
        self.ambiguous = true;
    }
}

/// Counter state along one traversal path.
#[derive(Debug, Clone, Default)]
struct PathState {
    child: Counter,
    per_type: HashMap<String, Counter>,
}

/// Merges branch end-states: unanimous counts survive; disagreement takes the
/// maximum and turns ambiguous. Branches whose path never saw a type don't
/// vote on it.
fn merge(states: Vec<PathState>) -> PathState {
    debug_assert!(!states.is_empty(), "merge of zero branches");

    let child = merge_counters(states.iter().map(|s| s.child));

    let mut keys: Vec<&String> = states.iter().flat_map(|s| s.per_type.keys()).collect();
    keys.sort();
    keys.dedup();

    let mut per_type = HashMap::new();
    for key in keys {
        let voters = states.iter().filter_map(|s| s.per_type.get(key).copied());
        per_type.insert(key.clone(), merge_counters(voters));
    }

    PathState { child, per_type }
}

fn merge_counters(counters: impl Iterator<Item = Counter>) -> Counter {
    let counters: Vec<Counter> = counters.collect();
    debug_assert!(!counters.is_empty());

    let unanimous = counters.windows(2).all(|w| w[0].count == w[1].count);
    let count = if unanimous {
        counters[0].count
    } else {
        counters
            .iter()
            .map(|c| c.count)
            .max_by(|a, b| match (a, b) {
                (Count::Unbounded, Count::Unbounded) => std::cmp::Ordering::Equal,
                (Count::Unbounded, _) => std::cmp::Ordering::Greater,
                (_, Count::Unbounded) => std::cmp::Ordering::Less,
                (Count::Exact(x), Count::Exact(y)) => x.cmp(y),
            })
            .unwrap_or(Count::Exact(0))
    };
    Counter {
        count,
        ambiguous: counters.iter().any(|c| c.ambiguous) || !unanimous,
    }
}

/// Analyzes one rule's contexts. Rules with labeled alternatives get one
/// context per alternative; otherwise the whole alternative list is one
/// context.
pub fn analyze_rule_contexts(
    grammar: &Grammar,
    rule: &Rule,
    analysis: &mut Analysis,
    diagnostics: &mut Diagnostics,
) {
    if rule.all_alternatives_labeled() {
        for alt in &rule.body.alternatives {
            analyze_context(grammar, std::slice::from_ref(alt), analysis, diagnostics);
        }
    } else {
        analyze_context(grammar, &rule.body.alternatives, analysis, diagnostics);
    }
}

fn analyze_context(
    grammar: &Grammar,
    alternatives: &[Alternative],
    analysis: &mut Analysis,
    diagnostics: &mut Diagnostics,
) {
    let mut members = Vec::new();
    let mut finals = Vec::with_capacity(alternatives.len());
    {
        let mut walker = Walker {
            grammar,
            analysis: &mut *analysis,
            diagnostics,
            members: &mut members,
        };
        for alt in alternatives {
            let mut state = PathState::default();
            walker.walk(&alt.elements, &mut state, false, false);
            finals.push(state);
        }
    }
    let merged = merge(finals);

    for (id, key) in members {
        let singleton = merged
            .per_type
            .get(&key)
            .is_some_and(|c| c.count == Count::Exact(1));
        analysis.set_only_of_type(id, singleton);
    }
}

struct Walker<'a> {
    grammar: &'a Grammar,
    analysis: &'a mut Analysis,
    diagnostics: &'a mut Diagnostics,
    /// Countable elements seen in this context, with their type keys.
    members: &'a mut Vec<(ElementId, String)>,
}

impl Walker<'_> {
    fn walk(
        &mut self,
        elements: &[SyntaxElement],
        state: &mut PathState,
        in_optional: bool,
        in_repeated: bool,
    ) {
        for element in elements {
            match &element.kind {
                ElementKind::Literal(_) | ElementKind::TokenRef(_) | ElementKind::RuleRef(_) => {
                    let key = self.type_key(element);
                    self.count_atom(element, key, state, in_optional, in_repeated);
                }
                ElementKind::Block(list) => {
                    debug_assert!(
                        !list.alternatives.is_empty(),
                        "block with no alternatives in rule body"
                    );
                    let block_optional = in_optional || element.suffix.is_optional();
                    let block_repeated = in_repeated || element.suffix.is_repeated();

                    let mut finals = Vec::with_capacity(list.alternatives.len());
                    for alt in &list.alternatives {
                        let mut branch = state.clone();
                        self.walk(&alt.elements, &mut branch, block_optional, block_repeated);
                        finals.push(branch);
                    }
                    *state = merge(finals);
                }
                ElementKind::Dot => {
                    // A wildcard consumes a child but has no addressable type.
                    let repeated = in_repeated || element.suffix.is_repeated();
                    let index = if repeated {
                        ElementIndex::default()
                    } else {
                        ElementIndex {
                            index_by_type: None,
                            child_index: state.child.next_index(),
                        }
                    };
                    self.analysis.insert(
                        element.id,
                        ElementAnnotation {
                            index,
                            is_only_of_type: false,
                        },
                    );
                    if repeated {
                        state.child.make_unbounded();
                    } else {
                        state.child.increment();
                        if in_optional || element.suffix.is_optional() {
                            state.child.ambiguous = true;
                        }
                    }
                }
                ElementKind::Empty => {}
                ElementKind::CharSet { .. } => {
                    self.diagnostics
                        .warning(
                            "character sets are not valid in parser rules; element skipped",
                            element.span,
                        )
                        .emit();
                }
            }
        }
    }

    fn count_atom(
        &mut self,
        element: &SyntaxElement,
        key: String,
        state: &mut PathState,
        in_optional: bool,
        in_repeated: bool,
    ) {
        let repeated = in_repeated || element.suffix.is_repeated();
        let optional = in_optional || element.suffix.is_optional();

        let type_counter = state.per_type.entry(key.clone()).or_default();

        if repeated {
            self.analysis.insert(
                element.id,
                ElementAnnotation {
                    index: ElementIndex::default(),
                    is_only_of_type: false,
                },
            );
            type_counter.make_unbounded();
            state.child.make_unbounded();
        } else {
            // The element's own index is definite even when optional;
            // ambiguity only affects what comes after it.
            let index = ElementIndex {
                index_by_type: type_counter.next_index(),
                child_index: state.child.next_index(),
            };
            self.analysis.insert(
                element.id,
                ElementAnnotation {
                    index,
                    is_only_of_type: false,
                },
            );
            type_counter.increment();
            state.child.increment();
            if optional {
                type_counter.ambiguous = true;
                state.child.ambiguous = true;
            }
        }

        self.members.push((element.id, key));
    }

    /// The counter key for an atom. Literals share a key with their token
    /// alias when one exists, since both produce the same token type at
    /// runtime.
    fn type_key(&self, element: &SyntaxElement) -> String {
        match &element.kind {
            ElementKind::TokenRef(name) | ElementKind::RuleRef(name) => name.clone(),
            ElementKind::Literal(text) => self
                .grammar
                .token_alias_for_literal(text)
                .map(|rule| rule.name.clone())
                .unwrap_or_else(|| format!("'{text}'")),
            _ => unreachable!("type_key called on non-countable element"),
        }
    }
}
