//! Structural analysis of compound kinds.
//!
//! [`flatten`] turns a kind tree into numerator and denominator tallies of
//! non-compound kinds, [`un_flatten`] rebuilds a canonical tree from them and
//! [`simplify`] combines both with cancellation of shared factors.

use std::collections::BTreeMap;

use crate::error::KindResult;
use crate::kind::{Kind, Operation};
use crate::registry::CompoundFactories;

/// Multiset of non-compound kinds, ordered by interning id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KindTally {
    entries: BTreeMap<u64, (Kind, usize)>,
}

impl KindTally {
    /// Creates an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` occurrences of `kind`.
    pub fn insert(&mut self, kind: Kind, count: usize) {
        if count == 0 {
            return;
        }
        self.entries.entry(kind.id()).or_insert((kind, 0)).1 += count;
    }

    /// Removes up to `count` occurrences of `kind`.
    pub fn remove(&mut self, kind: &Kind, count: usize) {
        if let Some(entry) = self.entries.get_mut(&kind.id()) {
            entry.1 = entry.1.saturating_sub(count);
            if entry.1 == 0 {
                self.entries.remove(&kind.id());
            }
        }
    }

    /// Occurrences of `kind`.
    pub fn count(&self, kind: &Kind) -> usize {
        self.entries.get(&kind.id()).map_or(0, |(_, n)| *n)
    }

    /// Distinct kinds with their counts, in interning order.
    pub fn iter(&self) -> impl Iterator<Item = (&Kind, usize)> {
        self.entries.values().map(|(kind, n)| (kind, *n))
    }

    /// Number of distinct kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Total number of occurrences.
    pub fn total(&self) -> usize {
        self.entries.values().map(|(_, n)| n).sum()
    }

    /// Returns `true` if the tally is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn expand(&self) -> Vec<Kind> {
        self.iter()
            .flat_map(|(kind, n)| std::iter::repeat(kind.clone()).take(n))
            .collect()
    }
}

impl FromIterator<(Kind, usize)> for KindTally {
    fn from_iter<I: IntoIterator<Item = (Kind, usize)>>(iter: I) -> Self {
        let mut tally = KindTally::new();
        for (kind, count) in iter {
            tally.insert(kind, count);
        }
        tally
    }
}

/// Numerator and denominator of a flattened kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Flattened {
    /// Factors multiplied together.
    pub numerator: KindTally,
    /// Factors divided out.
    pub denominator: KindTally,
}

/// Decomposes `kind` into tallies of non-compound kinds.
///
/// Products add both operands to the current side, quotients send the
/// right operand to the opposite side. Non-compound kinds flatten to
/// themselves.
pub fn flatten(kind: &Kind) -> Flattened {
    let mut flattened = Flattened::default();
    let mut numerator_stack = vec![kind.clone()];
    let mut denominator_stack: Vec<Kind> = Vec::new();

    while !numerator_stack.is_empty() || !denominator_stack.is_empty() {
        if let Some(next) = numerator_stack.pop() {
            match next.as_compound() {
                Some(c) => {
                    numerator_stack.push(c.left().clone());
                    match c.op() {
                        Operation::Mul => numerator_stack.push(c.right().clone()),
                        Operation::Div => denominator_stack.push(c.right().clone()),
                    }
                }
                None => flattened.numerator.insert(next, 1),
            }
        }

        if let Some(next) = denominator_stack.pop() {
            match next.as_compound() {
                Some(c) => {
                    denominator_stack.push(c.left().clone());
                    match c.op() {
                        Operation::Mul => denominator_stack.push(c.right().clone()),
                        Operation::Div => numerator_stack.push(c.right().clone()),
                    }
                }
                None => flattened.denominator.insert(next, 1),
            }
        }
    }

    flattened
}

/// Multiplies `operands` together by repeatedly pairing off the tail of the
/// list, which keeps the tree balanced.
fn build_product(factories: &dyn CompoundFactories, operands: Vec<Kind>) -> KindResult<Option<Kind>> {
    let mut reduced = operands;
    while reduced.len() > 1 {
        let mut to_reduce = std::mem::take(&mut reduced);
        while let Some(next) = to_reduce.pop() {
            let combined = match to_reduce.pop() {
                Some(with) => factories.mul(&next, &with)?,
                None => next,
            };
            reduced.push(combined);
        }
    }
    Ok(reduced.pop())
}

/// Rebuilds a kind from numerator and denominator tallies.
///
/// An empty numerator becomes the unitless kind; an empty denominator leaves
/// the numerator product as is.
pub fn un_flatten(
    numerator: &KindTally,
    denominator: &KindTally,
    factories: &dyn CompoundFactories,
) -> KindResult<Kind> {
    let top = match build_product(factories, numerator.expand())? {
        Some(kind) => kind,
        None => factories.unitless()?,
    };
    match build_product(factories, denominator.expand())? {
        Some(bottom) => factories.div(&top, &bottom),
        None => Ok(top),
    }
}

/// Drops unitless factors. A numerator consisting only of unitless factors
/// keeps a single one.
fn collapse_unitless(tally: &KindTally, keep_lone: bool) -> (KindTally, bool) {
    let only_entry = tally.len() == 1;
    let mut modified = false;
    let mut collapsed = KindTally::new();

    for (kind, count) in tally.iter() {
        if !kind.is_unitless() {
            collapsed.insert(kind.clone(), count);
        } else if keep_lone && only_entry {
            collapsed.insert(kind.clone(), 1);
            modified |= count != 1;
        } else {
            modified = true;
        }
    }

    (collapsed, modified)
}

/// Cancels factors present on both sides. Returns `true` if anything cancelled.
fn cancel_shared(numerator: &mut KindTally, denominator: &mut KindTally) -> bool {
    let shared: Vec<(Kind, usize)> = denominator
        .iter()
        .filter_map(|(kind, below)| {
            let above = numerator.count(kind);
            (above > 0).then(|| (kind.clone(), above.min(below)))
        })
        .collect();

    for (kind, count) in &shared {
        numerator.remove(kind, *count);
        denominator.remove(kind, *count);
    }
    !shared.is_empty()
}

/// Simplifies a kind by flattening, removing redundant unitless factors and
/// cancelling identical factors between numerator and denominator.
///
/// Returns the input handle itself when nothing changes, so identity checks
/// detect whether simplification happened. The result is idempotent.
pub fn simplify(kind: &Kind, factories: &dyn CompoundFactories) -> KindResult<Kind> {
    let flattened = flatten(kind);
    let (mut numerator, numerator_changed) = collapse_unitless(&flattened.numerator, true);
    let (mut denominator, denominator_changed) = collapse_unitless(&flattened.denominator, false);
    let cancelled = cancel_shared(&mut numerator, &mut denominator);

    if !cancelled && !numerator_changed && !denominator_changed {
        return Ok(kind.clone());
    }

    let simplified = un_flatten(&numerator, &denominator, factories)?;
    log::trace!("Simplified {} to {}", kind, simplified);
    Ok(simplified)
}

fn standard_form(kind: &Kind) -> Flattened {
    let to_standard = |tally: &KindTally| -> KindTally {
        tally
            .iter()
            .filter(|(kind, _)| !kind.is_unitless())
            .map(|(kind, n)| {
                let standard = kind
                    .as_atomic()
                    .and_then(|atomic| atomic.standard())
                    .cloned()
                    .unwrap_or_else(|| kind.clone());
                (standard, n)
            })
            .collect()
    };

    let flattened = flatten(kind);
    let mut numerator = to_standard(&flattened.numerator);
    let mut denominator = to_standard(&flattened.denominator);
    cancel_shared(&mut numerator, &mut denominator);
    Flattened {
        numerator,
        denominator,
    }
}

/// Returns `true` if two kinds describe the same dimension once every factor
/// is reduced to its family's standard unit, regardless of how the compound
/// trees are associated or ordered.
///
/// This is broader than [`Kind::is_compatible`], which only matches trees
/// with the same shape.
pub fn is_equivalent(a: &Kind, b: &Kind) -> bool {
    a.is_compatible(b) || standard_form(a) == standard_form(b)
}
