//! Deck stack of not-yet-dismissed cards.

use super::shuffle::fisher_yates;
use crate::catalog::Catalog;
use crate::model::card::CardItem;
use crate::store::persisted_set::IdSet;
use log::info;
use rand::Rng;

/// Ordered working set; top = last element.
#[derive(Debug, Default)]
pub struct DeckStack {
    cards: Vec<CardItem>,
    source: Option<Catalog>,
}

impl DeckStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a shuffled stack of every catalog card not in `seen`.
    /// Untracked cards are always included.
    pub fn build<R: Rng + ?Sized>(catalog: &Catalog, seen: &IdSet, rng: &mut R) -> Self {
        let mut cards: Vec<CardItem> = catalog
            .items()
            .iter()
            .filter(|card| card.tracked_id().map_or(true, |id| !seen.contains(id)))
            .cloned()
            .collect();
        fisher_yates(&mut cards, rng);
        info!(
            "event=deck_build module=deck status=ok catalog_size={} stack_size={}",
            catalog.len(),
            cards.len()
        );
        Self {
            cards,
            source: Some(catalog.clone()),
        }
    }

    /// Rebuilds only when `catalog` is a different catalog than the one the
    /// stack was built from. Returns whether a rebuild happened.
    pub fn rebuild_if_changed<R: Rng + ?Sized>(
        &mut self,
        catalog: &Catalog,
        seen: &IdSet,
        rng: &mut R,
    ) -> bool {
        if self.is_built_from(catalog) {
            return false;
        }
        *self = Self::build(catalog, seen, rng);
        true
    }

    pub fn is_built_from(&self, catalog: &Catalog) -> bool {
        self.source
            .as_ref()
            .is_some_and(|source| source.same_as(catalog))
    }

    pub fn source(&self) -> Option<&Catalog> {
        self.source.as_ref()
    }

    pub fn top(&self) -> Option<&CardItem> {
        self.cards.last()
    }

    pub fn pop(&mut self) -> Option<CardItem> {
        self.cards.pop()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards bottom to top.
    pub fn cards(&self) -> &[CardItem] {
        &self.cards
    }

    /// Up to `depth` cards from the top, bottom-most first, with the global
    /// index of the first one.
    pub fn visible(&self, depth: usize) -> (usize, &[CardItem]) {
        let start = self.cards.len().saturating_sub(depth);
        (start, &self.cards[start..])
    }
}
