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

use crate::config::LevelingConfig;
use crate::error::Fallible;
use crate::repo::CollectionRepository;
use crate::types::collected::CollectedItem;
use crate::types::collected::MAX_ITEM_LEVEL;
use crate::types::collected::xp_for_item_level;
use crate::types::item_kind::ItemId;
use crate::types::item_kind::ItemKind;

#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelResult {
    /// The item after the XP was applied.
    pub item: CollectedItem,
    pub leveled_up: bool,
    pub xp_gained: u32,
}

pub struct ItemLeveling {
    config: LevelingConfig,
}

impl ItemLeveling {
    pub fn new(config: LevelingConfig) -> Self {
        Self { config }
    }

    /// XP earned by one answer.
    pub fn xp_for_answer(&self, was_correct: bool, combo: u32) -> u32 {
        if was_correct {
            let base = self.config.xp_correct;
            if combo >= self.config.combo_threshold {
                base + base / 2
            } else {
                base
            }
        } else {
            self.config.xp_wrong
        }
    }

    /// Grants answer XP to a collected item, advancing at most one level.
    /// Returns `None` if the item was never collected.
    pub fn add_xp(
        &self,
        collection: &dyn CollectionRepository,
        item_id: ItemId,
        kind: ItemKind,
        was_correct: bool,
        combo: u32,
    ) -> Fallible<Option<LevelResult>> {
        let Some(mut item) = collection.get_item(item_id, kind)? else {
            return Ok(None);
        };
        if item.is_max_level() {
            return Ok(Some(LevelResult {
                item,
                leveled_up: false,
                xp_gained: 0,
            }));
        }
        let xp_gained = self.xp_for_answer(was_correct, combo);
        let total = item.xp + xp_gained;
        let threshold = xp_for_item_level(item.level);
        let leveled_up = total >= threshold;
        if leveled_up {
            item.level += 1;
            item.xp = if item.level >= MAX_ITEM_LEVEL {
                item.level = MAX_ITEM_LEVEL;
                0
            } else {
                total - threshold
            };
            collection.update_level(item_id, kind, item.level, item.xp)?;
            log::debug!("{kind} {item_id} reached level {}.", item.level);
        } else {
            item.xp = total;
            collection.add_item_xp(item_id, kind, xp_gained)?;
        }
        Ok(Some(LevelResult {
            item,
            leveled_up,
            xp_gained,
        }))
    }
}
