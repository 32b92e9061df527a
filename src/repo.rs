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

//! The storage contracts the engine is written against.

use crate::error::Fallible;
use crate::types::card::Card;
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

/// Scheduling records, keyed by (kind, item id).
pub trait CardRepository {
    /// Non-new cards whose due time is at or before `now`.
    fn due_cards(&self, kind: ItemKind, now: Timestamp) -> Fallible<Vec<Card>>;

    /// Learning cards due after `now`, earliest first.
    fn learning_cards(&self, kind: ItemKind, now: Timestamp, limit: usize) -> Fallible<Vec<Card>>;

    /// Tracked cards that were never reviewed.
    fn new_cards(&self, kind: ItemKind, limit: usize) -> Fallible<Vec<Card>>;

    fn get_card(&self, kind: ItemKind, item_id: ItemId) -> Fallible<Option<Card>>;

    /// Inserts or replaces the card.
    fn save_card(&self, card: &Card) -> Fallible<()>;

    /// Starts tracking an item. Does nothing if it is already tracked.
    fn ensure_card_exists(&self, kind: ItemKind, item_id: ItemId, now: Timestamp)
    -> Fallible<()>;
}

/// Read-only item data.
pub trait Catalog {
    fn kanji_by_id(&self, id: ItemId) -> Fallible<Option<Kanji>>;

    fn kanji_by_grade(&self, grade: u8) -> Fallible<Vec<Kanji>>;

    /// Kanji of the grade with no card of kind `kanji`.
    fn unseen_kanji_by_grade(&self, grade: u8, limit: usize) -> Fallible<Vec<Kanji>>;

    fn kana_by_id(&self, id: ItemId) -> Fallible<Option<Kana>>;

    fn kana_by_type(&self, kana_type: KanaType) -> Fallible<Vec<Kana>>;

    fn kana_by_type_and_variant(
        &self,
        kana_type: KanaType,
        variant: KanaVariant,
    ) -> Fallible<Vec<Kana>>;

    fn unseen_kana(&self, kana_type: KanaType, limit: usize) -> Fallible<Vec<Kana>>;

    fn radical_by_id(&self, id: ItemId) -> Fallible<Option<Radical>>;

    fn all_radicals(&self) -> Fallible<Vec<Radical>>;

    fn radicals_by_priority(&self, priority: u8) -> Fallible<Vec<Radical>>;

    /// Radicals of at most the given priority with no card.
    fn unseen_radicals(&self, max_priority: u8, limit: usize) -> Fallible<Vec<Radical>>;

    fn kanji_ids_for_radical(&self, radical_id: ItemId) -> Fallible<Vec<ItemId>>;

    fn radicals_for_kanji(&self, kanji_id: ItemId) -> Fallible<Vec<Radical>>;

    /// Kanji containing at least one, but not all, of the radicals. Most
    /// overlap first.
    fn kanji_containing_some_radicals(
        &self,
        radical_ids: &[ItemId],
        limit: usize,
    ) -> Fallible<Vec<Kanji>>;
}

/// Items the player has discovered.
pub trait CollectionRepository {
    fn is_collected(&self, item_id: ItemId, kind: ItemKind) -> Fallible<bool>;

    /// Stores a newly discovered item. Collecting an item twice keeps the
    /// first record.
    fn collect(&self, item: &CollectedItem) -> Fallible<()>;

    fn collected_ids(&self, kind: ItemKind) -> Fallible<Vec<ItemId>>;

    /// Adds XP without touching the level.
    fn add_item_xp(&self, item_id: ItemId, kind: ItemKind, xp: u32) -> Fallible<()>;

    fn update_level(&self, item_id: ItemId, kind: ItemKind, level: u32, xp: u32) -> Fallible<()>;

    fn get_item(&self, item_id: ItemId, kind: ItemKind) -> Fallible<Option<CollectedItem>>;

    fn collection_stats(&self) -> Fallible<CollectionStats>;
}

/// Everything a session needs from storage.
pub trait Store: CardRepository + Catalog + CollectionRepository {}

impl<T: CardRepository + Catalog + CollectionRepository> Store for T {}
