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

use serde::Serialize;

use crate::types::item_kind::ItemId;
use crate::types::item_kind::ItemKind;
use crate::types::rarity::Rarity;
use crate::types::timestamp::Timestamp;

/// Items cannot level past this.
pub const MAX_ITEM_LEVEL: u32 = 10;

/// The source tag of items discovered while playing.
pub const SOURCE_GAMEPLAY: &str = "gameplay";

/// XP needed to advance from `level` to the next one.
pub fn xp_for_item_level(level: u32) -> u32 {
    level * level * 25
}

#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedItem {
    pub item_id: ItemId,
    pub kind: ItemKind,
    pub rarity: Rarity,
    pub level: u32,
    pub xp: u32,
    pub discovered_at: Timestamp,
    pub source: String,
}

impl CollectedItem {
    /// A freshly discovered item: level 1, no XP.
    pub fn discovered(
        item_id: ItemId,
        kind: ItemKind,
        rarity: Rarity,
        discovered_at: Timestamp,
    ) -> Self {
        Self {
            item_id,
            kind,
            rarity,
            level: 1,
            xp: 0,
            discovered_at,
            source: SOURCE_GAMEPLAY.to_string(),
        }
    }

    pub fn xp_to_next_level(&self) -> u32 {
        xp_for_item_level(self.level)
    }

    pub fn is_max_level(&self) -> bool {
        self.level >= MAX_ITEM_LEVEL
    }

    /// Fraction of the way to the next level, in `0.0..=1.0`.
    pub fn level_progress(&self) -> f64 {
        if self.is_max_level() {
            1.0
        } else {
            (f64::from(self.xp) / f64::from(self.xp_to_next_level())).min(1.0)
        }
    }
}

/// Totals over the whole collection.
#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub total: usize,
    pub kanji: usize,
    pub hiragana: usize,
    pub katakana: usize,
    pub radicals: usize,
    pub common: usize,
    pub uncommon: usize,
    pub rare: usize,
    pub epic: usize,
    pub legendary: usize,
}

impl CollectionStats {
    pub fn count(&mut self, kind: ItemKind, rarity: Rarity) {
        self.total += 1;
        match kind {
            ItemKind::Kanji => self.kanji += 1,
            ItemKind::Hiragana => self.hiragana += 1,
            ItemKind::Katakana => self.katakana += 1,
            ItemKind::Radical => self.radicals += 1,
        }
        match rarity {
            Rarity::Common => self.common += 1,
            Rarity::Uncommon => self.uncommon += 1,
            Rarity::Rare => self.rare += 1,
            Rarity::Epic => self.epic += 1,
            Rarity::Legendary => self.legendary += 1,
        }
    }
}
