// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A store that lives entirely in memory.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::repo::CardRepository;
use crate::repo::Catalog;
use crate::repo::CollectionRepository;
use crate::types::card::Card;
use crate::types::card::CardState;
use crate::types::catalog::CatalogData;
use crate::types::catalog::Kana;
use crate::types::catalog::Kanji;
use crate::types::catalog::Radical;
use crate::types::collected::CollectedItem;
use crate::types::collected::CollectionStats;
use crate::types::item_kind::ItemId;
use crate::types::item_kind::ItemKind;
use crate::types::item_kind::KanaType;
use crate::types::item_kind::KanaVariant;
use crate::types::timestamp::Timestamp;

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    kanji: BTreeMap<ItemId, Kanji>,
    kana: BTreeMap<ItemId, Kana>,
    radicals: BTreeMap<ItemId, Radical>,
    /// (radical id, kanji id) pairs.
    links: BTreeSet<(ItemId, ItemId)>,
    cards: BTreeMap<(ItemKind, ItemId), Card>,
    collected: BTreeMap<(ItemKind, ItemId), CollectedItem>,
}

impl Inner {
    fn is_tracked(&self, kind: ItemKind, item_id: ItemId) -> bool {
        self.cards.contains_key(&(kind, item_id))
    }

    fn cards_of(&self, kind: ItemKind) -> impl Iterator<Item = &Card> {
        self.cards.values().filter(move |card| card.kind == kind)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_catalog(data: CatalogData) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock_inner();
            for kanji in data.kanji {
                inner.kanji.insert(kanji.id, kanji);
            }
            for kana in data.kana {
                inner.kana.insert(kana.id, kana);
            }
            for radical in data.radicals {
                inner.radicals.insert(radical.id, radical);
            }
            for link in data.links {
                inner.links.insert((link.radical_id, link.kanji_id));
            }
        }
        store
    }

    pub fn add_kanji(&self, kanji: Kanji) {
        self.lock_inner().kanji.insert(kanji.id, kanji);
    }

    pub fn add_kana(&self, kana: Kana) {
        self.lock_inner().kana.insert(kana.id, kana);
    }

    pub fn add_radical(&self, radical: Radical) {
        self.lock_inner().radicals.insert(radical.id, radical);
    }

    pub fn link(&self, radical_id: ItemId, kanji_id: ItemId) {
        self.lock_inner().links.insert((radical_id, kanji_id));
    }

    pub fn card_count(&self) -> Fallible<usize> {
        Ok(self.inner()?.cards.len())
    }

    fn inner(&self) -> Fallible<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| ErrorReport::new("memory store lock poisoned."))
    }

    /// For setup, where a poisoned lock can still be written through.
    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CardRepository for MemoryStore {
    fn due_cards(&self, kind: ItemKind, now: Timestamp) -> Fallible<Vec<Card>> {
        let inner = self.inner()?;
        let mut cards: Vec<Card> = inner
            .cards_of(kind)
            .filter(|card| card.is_due(now))
            .cloned()
            .collect();
        cards.sort_by_key(|card| card.due);
        Ok(cards)
    }

    fn learning_cards(&self, kind: ItemKind, now: Timestamp, limit: usize) -> Fallible<Vec<Card>> {
        let inner = self.inner()?;
        let mut cards: Vec<Card> = inner
            .cards_of(kind)
            .filter(|card| card.state == CardState::Learning && card.due > now)
            .cloned()
            .collect();
        cards.sort_by_key(|card| card.due);
        cards.truncate(limit);
        Ok(cards)
    }

    fn new_cards(&self, kind: ItemKind, limit: usize) -> Fallible<Vec<Card>> {
        let inner = self.inner()?;
        Ok(inner
            .cards_of(kind)
            .filter(|card| card.is_new())
            .take(limit)
            .cloned()
            .collect())
    }

    fn get_card(&self, kind: ItemKind, item_id: ItemId) -> Fallible<Option<Card>> {
        Ok(self.inner()?.cards.get(&(kind, item_id)).cloned())
    }

    fn save_card(&self, card: &Card) -> Fallible<()> {
        self.inner()?
            .cards
            .insert((card.kind, card.item_id), card.clone());
        Ok(())
    }

    fn ensure_card_exists(
        &self,
        kind: ItemKind,
        item_id: ItemId,
        now: Timestamp,
    ) -> Fallible<()> {
        self.inner()?
            .cards
            .entry((kind, item_id))
            .or_insert_with(|| Card::new(kind, item_id, now));
        Ok(())
    }
}

impl Catalog for MemoryStore {
    fn kanji_by_id(&self, id: ItemId) -> Fallible<Option<Kanji>> {
        Ok(self.inner()?.kanji.get(&id).cloned())
    }

    fn kanji_by_grade(&self, grade: u8) -> Fallible<Vec<Kanji>> {
        let inner = self.inner()?;
        Ok(inner
            .kanji
            .values()
            .filter(|k| k.grade == Some(grade))
            .cloned()
            .collect())
    }

    fn unseen_kanji_by_grade(&self, grade: u8, limit: usize) -> Fallible<Vec<Kanji>> {
        let inner = self.inner()?;
        let mut kanji: Vec<Kanji> = inner
            .kanji
            .values()
            .filter(|k| k.grade == Some(grade) && !inner.is_tracked(ItemKind::Kanji, k.id))
            .cloned()
            .collect();
        // Most frequent first, unranked last.
        kanji.sort_by_key(|k| (k.frequency.is_none(), k.frequency, k.id));
        kanji.truncate(limit);
        Ok(kanji)
    }

    fn kana_by_id(&self, id: ItemId) -> Fallible<Option<Kana>> {
        Ok(self.inner()?.kana.get(&id).cloned())
    }

    fn kana_by_type(&self, kana_type: KanaType) -> Fallible<Vec<Kana>> {
        let inner = self.inner()?;
        Ok(inner
            .kana
            .values()
            .filter(|k| k.kana_type == kana_type)
            .cloned()
            .collect())
    }

    fn kana_by_type_and_variant(
        &self,
        kana_type: KanaType,
        variant: KanaVariant,
    ) -> Fallible<Vec<Kana>> {
        let inner = self.inner()?;
        Ok(inner
            .kana
            .values()
            .filter(|k| k.kana_type == kana_type && k.variant == variant)
            .cloned()
            .collect())
    }

    fn unseen_kana(&self, kana_type: KanaType, limit: usize) -> Fallible<Vec<Kana>> {
        let inner = self.inner()?;
        let kind = kana_type.item_kind();
        Ok(inner
            .kana
            .values()
            .filter(|k| k.kana_type == kana_type && !inner.is_tracked(kind, k.id))
            .take(limit)
            .cloned()
            .collect())
    }

    fn radical_by_id(&self, id: ItemId) -> Fallible<Option<Radical>> {
        Ok(self.inner()?.radicals.get(&id).cloned())
    }

    fn all_radicals(&self) -> Fallible<Vec<Radical>> {
        Ok(self.inner()?.radicals.values().cloned().collect())
    }

    fn radicals_by_priority(&self, priority: u8) -> Fallible<Vec<Radical>> {
        let inner = self.inner()?;
        Ok(inner
            .radicals
            .values()
            .filter(|r| r.priority == priority)
            .cloned()
            .collect())
    }

    fn unseen_radicals(&self, max_priority: u8, limit: usize) -> Fallible<Vec<Radical>> {
        let inner = self.inner()?;
        let mut radicals: Vec<Radical> = inner
            .radicals
            .values()
            .filter(|r| r.priority <= max_priority && !inner.is_tracked(ItemKind::Radical, r.id))
            .cloned()
            .collect();
        radicals.sort_by_key(|r| (r.priority, r.id));
        radicals.truncate(limit);
        Ok(radicals)
    }

    fn kanji_ids_for_radical(&self, radical_id: ItemId) -> Fallible<Vec<ItemId>> {
        let inner = self.inner()?;
        Ok(inner
            .links
            .iter()
            .filter(|(r, _)| *r == radical_id)
            .map(|(_, k)| *k)
            .collect())
    }

    fn radicals_for_kanji(&self, kanji_id: ItemId) -> Fallible<Vec<Radical>> {
        let inner = self.inner()?;
        Ok(inner
            .links
            .iter()
            .filter(|(_, k)| *k == kanji_id)
            .filter_map(|(r, _)| inner.radicals.get(r).cloned())
            .collect())
    }

    fn kanji_containing_some_radicals(
        &self,
        radical_ids: &[ItemId],
        limit: usize,
    ) -> Fallible<Vec<Kanji>> {
        let inner = self.inner()?;
        let mut overlap: BTreeMap<ItemId, usize> = BTreeMap::new();
        for (radical_id, kanji_id) in inner.links.iter() {
            if radical_ids.contains(radical_id) {
                *overlap.entry(*kanji_id).or_default() += 1;
            }
        }
        let mut ranked: Vec<(ItemId, usize)> = overlap
            .into_iter()
            .filter(|(_, count)| *count < radical_ids.len())
            .collect();
        ranked.sort_by_key(|(id, count)| (std::cmp::Reverse(*count), *id));
        Ok(ranked
            .into_iter()
            .filter_map(|(id, _)| inner.kanji.get(&id).cloned())
            .take(limit)
            .collect())
    }
}

impl CollectionRepository for MemoryStore {
    fn is_collected(&self, item_id: ItemId, kind: ItemKind) -> Fallible<bool> {
        Ok(self.inner()?.collected.contains_key(&(kind, item_id)))
    }

    fn collect(&self, item: &CollectedItem) -> Fallible<()> {
        self.inner()?
            .collected
            .entry((item.kind, item.item_id))
            .or_insert_with(|| item.clone());
        Ok(())
    }

    fn collected_ids(&self, kind: ItemKind) -> Fallible<Vec<ItemId>> {
        let inner = self.inner()?;
        Ok(inner
            .collected
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, id)| *id)
            .collect())
    }

    fn add_item_xp(&self, item_id: ItemId, kind: ItemKind, xp: u32) -> Fallible<()> {
        if let Some(item) = self.inner()?.collected.get_mut(&(kind, item_id)) {
            item.xp += xp;
        }
        Ok(())
    }

    fn update_level(&self, item_id: ItemId, kind: ItemKind, level: u32, xp: u32) -> Fallible<()> {
        if let Some(item) = self.inner()?.collected.get_mut(&(kind, item_id)) {
            item.level = level;
            item.xp = xp;
        }
        Ok(())
    }

    fn get_item(&self, item_id: ItemId, kind: ItemKind) -> Fallible<Option<CollectedItem>> {
        Ok(self.inner()?.collected.get(&(kind, item_id)).cloned())
    }

    fn collection_stats(&self) -> Fallible<CollectionStats> {
        let inner = self.inner()?;
        let mut stats = CollectionStats::default();
        for item in inner.collected.values() {
            stats.count(item.kind, item.rarity);
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::rarity::Rarity;

    fn now() -> Timestamp {
        Timestamp::from_epoch_seconds(1_000_000)
    }

    #[test]
    fn test_ensure_card_exists_is_idempotent() -> Fallible<()> {
        let store = MemoryStore::new();
        store.ensure_card_exists(ItemKind::Kanji, 1, now())?;
        let mut card = store.get_card(ItemKind::Kanji, 1)?.unwrap();
        card.total_reviews = 3;
        store.save_card(&card)?;
        store.ensure_card_exists(ItemKind::Kanji, 1, now())?;
        assert_eq!(store.get_card(ItemKind::Kanji, 1)?, Some(card));
        assert_eq!(store.card_count()?, 1);
        Ok(())
    }

    #[test]
    fn test_due_cards_are_sorted_and_exclude_new() -> Fallible<()> {
        let store = MemoryStore::new();
        store.ensure_card_exists(ItemKind::Kanji, 1, now())?;
        for (id, offset) in [(2, -10), (3, -20), (4, 50)] {
            let mut card = Card::new(ItemKind::Kanji, id, now());
            card.state = CardState::Review;
            card.due = now().plus_seconds(offset);
            store.save_card(&card)?;
        }
        let due: Vec<ItemId> = store
            .due_cards(ItemKind::Kanji, now())?
            .iter()
            .map(|c| c.item_id)
            .collect();
        assert_eq!(due, vec![3, 2]);
        assert!(store.due_cards(ItemKind::Radical, now())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_collect_keeps_first_record() -> Fallible<()> {
        let store = MemoryStore::new();
        let first = CollectedItem::discovered(1, ItemKind::Kanji, Rarity::Rare, now());
        let mut second = first.clone();
        second.rarity = Rarity::Common;
        store.collect(&first)?;
        store.collect(&second)?;
        assert_eq!(store.get_item(1, ItemKind::Kanji)?, Some(first));
        let stats = store.collection_stats()?;
        assert_eq!(stats.total, 1);
        assert_eq!(stats.rare, 1);
        assert!(!store.is_collected(1, ItemKind::Radical)?);
        Ok(())
    }
}
