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

//! Collectible drops after correct answers, with pity guarantees.

use std::collections::HashMap;
use std::collections::HashSet;

use rand::Rng;
use rand::SeedableRng;
use rand::seq::IndexedRandom;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::EncounterConfig;
use crate::error::Fallible;
use crate::repo::Catalog;
use crate::repo::CollectionRepository;
use crate::types::collected::CollectedItem;
use crate::types::item_kind::ItemId;
use crate::types::item_kind::ItemKind;
use crate::types::item_kind::KanaType;
use crate::types::rarity::Rarity;
use crate::types::timestamp::Timestamp;

/// Rolls since each tier last dropped, indexed by `Rarity::index`.
pub type PityCounters = [u32; 5];

/// A partition of content the player has unlocked.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum EncounterScope {
    KanjiGrade(u8),
    Kana(KanaType),
    RadicalPriority(u8),
}

/// A discovered item.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub item: CollectedItem,
    pub literal: String,
    /// The tier that fired. The item's own rarity may be lower when no
    /// item of this tier was left.
    pub rolled: Rarity,
}

struct Candidate {
    kind: ItemKind,
    item_id: ItemId,
    rarity: Rarity,
    literal: String,
}

pub struct EncounterEngine {
    config: EncounterConfig,
    pity: PityCounters,
    rng: ChaCha8Rng,
}

impl EncounterEngine {
    pub fn new(config: EncounterConfig, seed: u64) -> Self {
        Self {
            config,
            pity: [0; 5],
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn pity(&self) -> PityCounters {
        self.pity
    }

    pub fn restore_pity(&mut self, counters: PityCounters) {
        self.pity = counters;
    }

    pub fn reset_pity(&mut self) {
        self.pity = [0; 5];
    }

    /// Rolls for a drop. Returns `None` when no tier fires or nothing in
    /// the scopes is left to discover; the pity counters carry over in
    /// both cases.
    pub fn roll_encounter(
        &mut self,
        catalog: &dyn Catalog,
        collection: &dyn CollectionRepository,
        scopes: &[EncounterScope],
        now: Timestamp,
    ) -> Fallible<Option<Encounter>> {
        for counter in self.pity.iter_mut() {
            *counter = counter.saturating_add(1);
        }
        let Some(rolled) = self.roll_tier() else {
            log::debug!("Encounter roll: nothing fired, pity {:?}.", self.pity);
            return Ok(None);
        };
        let mut scopes: Vec<EncounterScope> = scopes.to_vec();
        scopes.shuffle(&mut self.rng);
        let candidates = uncollected(catalog, collection, &scopes)?;
        let Some(candidate) = self.pick(&candidates, rolled) else {
            log::debug!("Encounter roll: {rolled} fired, but nothing is left to discover.");
            return Ok(None);
        };
        for rarity in Rarity::ALL.iter().filter(|r| **r <= rolled) {
            self.pity[rarity.index()] = 0;
        }
        let item =
            CollectedItem::discovered(candidate.item_id, candidate.kind, candidate.rarity, now);
        collection.collect(&item)?;
        log::debug!(
            "Encounter roll: {rolled} fired, discovered {} {} ({}).",
            item.kind,
            candidate.literal,
            item.rarity
        );
        Ok(Some(Encounter {
            item,
            literal: candidate.literal.clone(),
            rolled,
        }))
    }

    /// The highest tier that fires, either by pity or by chance.
    fn roll_tier(&mut self) -> Option<Rarity> {
        for rarity in Rarity::ALL.iter().rev() {
            let guaranteed = self.pity[rarity.index()] >= self.config.thresholds.get(*rarity);
            if guaranteed || self.rng.random::<f64>() < self.config.rates.get(*rarity) {
                return Some(*rarity);
            }
        }
        None
    }

    /// Candidates are grouped by scope, in the shuffled scope order. Tries
    /// the rolled tier, then the one below it, then anything.
    fn pick<'a>(&mut self, candidates: &'a [Vec<Candidate>], rolled: Rarity) -> Option<&'a Candidate> {
        let tiers = [Some(rolled), rolled.lower()];
        for tier in tiers.into_iter().flatten() {
            for scope in candidates {
                let matching: Vec<&Candidate> = scope.iter().filter(|c| c.rarity == tier).collect();
                if let Some(candidate) = matching.choose(&mut self.rng) {
                    return Some(*candidate);
                }
            }
        }
        candidates
            .iter()
            .find(|scope| !scope.is_empty())
            .and_then(|scope| scope.choose(&mut self.rng))
    }
}

fn uncollected(
    catalog: &dyn Catalog,
    collection: &dyn CollectionRepository,
    scopes: &[EncounterScope],
) -> Fallible<Vec<Vec<Candidate>>> {
    let mut collected: HashMap<ItemKind, HashSet<ItemId>> = HashMap::new();
    let mut result = Vec::with_capacity(scopes.len());
    for scope in scopes {
        let items: Vec<Candidate> = match scope {
            EncounterScope::KanjiGrade(grade) => catalog
                .kanji_by_grade(*grade)?
                .into_iter()
                .map(|k| Candidate {
                    kind: ItemKind::Kanji,
                    item_id: k.id,
                    rarity: k.rarity(),
                    literal: k.literal,
                })
                .collect(),
            EncounterScope::Kana(kana_type) => catalog
                .kana_by_type(*kana_type)?
                .into_iter()
                .map(|k| Candidate {
                    kind: kana_type.item_kind(),
                    item_id: k.id,
                    rarity: k.rarity(),
                    literal: k.literal,
                })
                .collect(),
            EncounterScope::RadicalPriority(priority) => catalog
                .radicals_by_priority(*priority)?
                .into_iter()
                .map(|r| Candidate {
                    kind: ItemKind::Radical,
                    item_id: r.id,
                    rarity: r.rarity(),
                    literal: r.literal,
                })
                .collect(),
        };
        let mut remaining = Vec::new();
        for item in items {
            if !collected.contains_key(&item.kind) {
                let ids: HashSet<ItemId> = collection.collected_ids(item.kind)?.into_iter().collect();
                collected.insert(item.kind, ids);
            }
            let taken = collected
                .get(&item.kind)
                .is_some_and(|ids| ids.contains(&item.item_id));
            if !taken {
                remaining.push(item);
            }
        }
        result.push(remaining);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PerRarity;
    use crate::memory::MemoryStore;
    use crate::types::catalog::Kana;
    use crate::types::catalog::Radical;
    use crate::types::item_kind::KanaVariant;

    fn now() -> Timestamp {
        Timestamp::from_epoch_seconds(1_000)
    }

    fn zero_rates() -> EncounterConfig {
        EncounterConfig {
            rates: PerRarity {
                common: 0.0,
                uncommon: 0.0,
                rare: 0.0,
                epic: 0.0,
                legendary: 0.0,
            },
            ..EncounterConfig::default()
        }
    }

    fn radical(id: ItemId, priority: u8) -> Radical {
        Radical {
            id,
            literal: format!("r{id}"),
            meaning: "meaning".to_string(),
            meaning_jp: None,
            stroke_count: 2,
            stroke_svg: None,
            priority,
        }
    }

    fn kana(id: ItemId, variant: KanaVariant) -> Kana {
        Kana {
            id,
            literal: format!("k{id}"),
            kana_type: KanaType::Hiragana,
            romanization: "ka".to_string(),
            group: "k".to_string(),
            stroke_count: 3,
            stroke_svg: None,
            variant,
        }
    }

    #[test]
    fn test_pity_fires_on_third_roll() -> Fallible<()> {
        let store = MemoryStore::new();
        store.add_radical(radical(1, 1));
        let scopes = [EncounterScope::RadicalPriority(1)];
        let mut engine = EncounterEngine::new(zero_rates(), 7);
        assert!(engine.roll_encounter(&store, &store, &scopes, now())?.is_none());
        assert!(engine.roll_encounter(&store, &store, &scopes, now())?.is_none());
        assert_eq!(engine.pity(), [2, 2, 2, 2, 2]);
        let encounter = engine.roll_encounter(&store, &store, &scopes, now())?;
        let encounter = encounter.unwrap();
        assert_eq!(encounter.rolled, Rarity::Common);
        assert_eq!(encounter.item.item_id, 1);
        assert_eq!(encounter.item.level, 1);
        assert_eq!(encounter.item.xp, 0);
        assert_eq!(encounter.item.source, "gameplay");
        assert!(store.is_collected(1, ItemKind::Radical)?);
        // Only the common counter resets.
        assert_eq!(engine.pity(), [0, 3, 3, 3, 3]);
        Ok(())
    }

    #[test]
    fn test_higher_tier_resets_lower_tiers() -> Fallible<()> {
        let store = MemoryStore::new();
        store.add_kana(kana(1, KanaVariant::Dakuten));
        let scopes = [EncounterScope::Kana(KanaType::Hiragana)];
        let mut engine = EncounterEngine::new(zero_rates(), 1);
        engine.restore_pity([1, 4, 0, 0, 0]);
        let encounter = engine.roll_encounter(&store, &store, &scopes, now())?.unwrap();
        assert_eq!(encounter.rolled, Rarity::Uncommon);
        assert_eq!(encounter.item.rarity, Rarity::Uncommon);
        assert_eq!(engine.pity(), [0, 0, 1, 1, 1]);
        Ok(())
    }

    #[test]
    fn test_falls_back_to_lower_and_then_any_tier() -> Fallible<()> {
        let store = MemoryStore::new();
        store.add_radical(radical(1, 1));
        store.add_radical(radical(2, 3));
        let scopes = [EncounterScope::RadicalPriority(1), EncounterScope::RadicalPriority(3)];
        let mut engine = EncounterEngine::new(zero_rates(), 3);
        // Uncommon fires; nothing uncommon exists, so the common radical is one tier lower.
        engine.restore_pity([0, 4, 0, 0, 0]);
        let first = engine.roll_encounter(&store, &store, &scopes, now())?.unwrap();
        assert_eq!(first.rolled, Rarity::Uncommon);
        assert_eq!(first.item.item_id, 1);
        assert_eq!(first.item.rarity, Rarity::Common);
        // Legendary fires; only a rare radical remains.
        engine.restore_pity([0, 0, 0, 0, 49]);
        let second = engine.roll_encounter(&store, &store, &scopes, now())?.unwrap();
        assert_eq!(second.rolled, Rarity::Legendary);
        assert_eq!(second.item.item_id, 2);
        assert_eq!(second.item.rarity, Rarity::Rare);
        Ok(())
    }

    #[test]
    fn test_nothing_left_keeps_pity() -> Fallible<()> {
        let store = MemoryStore::new();
        store.add_radical(radical(1, 1));
        let scopes = [EncounterScope::RadicalPriority(1)];
        let mut engine = EncounterEngine::new(zero_rates(), 5);
        engine.restore_pity([2, 0, 0, 0, 0]);
        assert!(engine.roll_encounter(&store, &store, &scopes, now())?.is_some());
        engine.restore_pity([2, 0, 0, 0, 0]);
        assert!(engine.roll_encounter(&store, &store, &scopes, now())?.is_none());
        assert_eq!(engine.pity(), [3, 1, 1, 1, 1]);
        assert_eq!(store.collection_stats()?.total, 1);
        Ok(())
    }

    #[test]
    fn test_certain_rates_always_discover() -> Fallible<()> {
        let store = MemoryStore::new();
        for id in 1..=5 {
            store.add_radical(radical(id, 1));
        }
        let mut config = EncounterConfig::default();
        config.rates.common = 1.0;
        let scopes = [EncounterScope::RadicalPriority(1)];
        let mut engine = EncounterEngine::new(config, 11);
        for _ in 0..5 {
            assert!(engine.roll_encounter(&store, &store, &scopes, now())?.is_some());
        }
        assert_eq!(store.collected_ids(ItemKind::Radical)?, vec![1, 2, 3, 4, 5]);
        engine.reset_pity();
        assert_eq!(engine.pity(), [0; 5]);
        Ok(())
    }
}
