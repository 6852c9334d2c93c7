//! Prerequisite ordering for chapters and units
//!
//! Each entity may name one sibling that has to come before it. Ordering
//! works in passes: entities without a prerequisite first, then every
//! entity whose prerequisite is already placed, until nothing more can be
//! placed. Whatever is left (cycles, dangling or self references) is
//! appended in input order, so the result is always a permutation of the
//! input.
//!
//! Self-reference is an authoring error rather than rejected input; such an
//! entity can never be placed by a pass and ends up in the trailing group.

use crate::types::{Chapter, Unit};
use std::collections::HashSet;

/// Entity that can point at a sibling prerequisite
pub trait Prerequisite {
    fn id(&self) -> &str;

    /// Sibling id that must come first. Empty strings count as none.
    fn prerequisite_id(&self) -> Option<&str>;
}

impl Prerequisite for Chapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn prerequisite_id(&self) -> Option<&str> {
        self.prerequisite_chapter_id.as_deref().filter(|p| !p.is_empty())
    }
}

impl Prerequisite for Unit {
    fn id(&self) -> &str {
        &self.id
    }

    fn prerequisite_id(&self) -> Option<&str> {
        self.prerequisite_unit_id.as_deref().filter(|p| !p.is_empty())
    }
}

/// Order entities so each comes after its prerequisite where resolvable
pub fn sort_by_prerequisite<T: Prerequisite>(entities: Vec<T>) -> Vec<T> {
    let (order, unresolved) = order_indices(&entities);

    let mut slots: Vec<Option<T>> = entities.into_iter().map(Some).collect();
    order
        .into_iter()
        .chain(unresolved)
        .filter_map(|i| slots[i].take())
        .collect()
}

/// Entities whose prerequisite chain never resolves
///
/// These are exactly the entities [`sort_by_prerequisite`] appends after
/// its last successful pass, in input order.
pub fn unresolved_prerequisites<T: Prerequisite>(entities: &[T]) -> Vec<&T> {
    let (_, unresolved) = order_indices(entities);
    unresolved.into_iter().map(|i| &entities[i]).collect()
}

/// Returns (placed indices in output order, unresolved indices in input order)
fn order_indices<T: Prerequisite>(entities: &[T]) -> (Vec<usize>, Vec<usize>) {
    let (mut order, mut remaining): (Vec<usize>, Vec<usize>) =
        (0..entities.len()).partition(|&i| entities[i].prerequisite_id().is_none());

    let mut placed: HashSet<&str> = order.iter().map(|&i| entities[i].id()).collect();

    while !remaining.is_empty() {
        let (ready, rest): (Vec<usize>, Vec<usize>) = remaining.into_iter().partition(|&i| {
            entities[i]
                .prerequisite_id()
                .map_or(false, |p| placed.contains(p))
        });
        remaining = rest;

        if ready.is_empty() {
            tracing::debug!(
                unresolved = remaining.len(),
                "Prerequisites unresolved, appending remainder in input order"
            );
            break;
        }

        placed.extend(ready.iter().map(|&i| entities[i].id()));
        order.extend(ready);
    }

    (order, remaining)
}
