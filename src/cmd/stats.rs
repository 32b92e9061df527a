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

use crate::collection::Collection;
use crate::error::Fallible;
use crate::repo::CollectionRepository;
use crate::types::card::CardState;
use crate::types::collected::CollectionStats;
use crate::types::timestamp::Timestamp;

pub fn print_collection_stats(collection: &Collection) -> Fallible<()> {
    let stats = collection_stats(collection, Timestamp::now())?;
    let stats_json = serde_json::to_string_pretty(&stats)?;
    println!("{}", stats_json);
    Ok(())
}

fn collection_stats(collection: &Collection, now: Timestamp) -> Fallible<Stats> {
    let db = &collection.db;
    let (kanji_count, kana_count, radical_count) = db.catalog_counts()?;
    let pity = db.load_pity()?;
    Ok(Stats {
        kanji_count,
        kana_count,
        radical_count,
        new_card_count: db.card_count_by_state(CardState::New)?,
        learning_card_count: db.card_count_by_state(CardState::Learning)?,
        review_card_count: db.card_count_by_state(CardState::Review)?,
        mastered_card_count: db.card_count_by_state(CardState::Mastered)?,
        due_card_count: db.due_count(now)?,
        collection: db.collection_stats()?,
        pity: pity.to_vec(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    kanji_count: usize,
    kana_count: usize,
    radical_count: usize,
    new_card_count: usize,
    learning_card_count: usize,
    review_card_count: usize,
    mastered_card_count: usize,
    due_card_count: usize,
    collection: CollectionStats,
    /// Rolls since each tier last dropped, from common to legendary.
    pity: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::imported_collection;
    use crate::repo::CardRepository;
    use crate::types::item_kind::ItemKind;

    #[test]
    fn test_stats() -> Fallible<()> {
        let collection = imported_collection()?;
        let now = Timestamp::from_epoch_seconds(1_000_000);
        collection.db.ensure_card_exists(ItemKind::Kanji, 1, now)?;
        collection.db.save_pity(&[2, 1, 0, 0, 0])?;

        let stats = collection_stats(&collection, now)?;
        assert_eq!(stats.kanji_count, 6);
        assert_eq!(stats.kana_count, 5);
        assert_eq!(stats.radical_count, 3);
        assert_eq!(stats.new_card_count, 1);
        assert_eq!(stats.due_card_count, 0);
        assert_eq!(stats.collection.total, 0);
        assert_eq!(stats.pity, vec![2, 1, 0, 0, 0]);
        Ok(())
    }
}
