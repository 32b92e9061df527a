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

use rand::seq::IndexedRandom;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::error::Fallible;
use crate::progression::max_radical_priority;
use crate::repo::CardRepository;
use crate::repo::Catalog;
use crate::select::ItemSource;
use crate::select::kanji::random_kanji_literal;
use crate::select::pick_distractors;
use crate::select::with_answer;
use crate::types::card::CardState;
use crate::types::catalog::Kanji;
use crate::types::catalog::Radical;
use crate::types::item_kind::ItemId;
use crate::types::item_kind::ItemKind;
use crate::types::question::Question;

/// Radicals shown in a builder question.
const MAX_SHOWN_RADICALS: usize = 3;

/// Partial matches fetched for builder distractors.
const PARTIAL_MATCH_LIMIT: usize = 10;

const COMPONENT_MEANINGS: [&str; 20] = [
    "person", "mouth", "hand", "water", "fire", "tree", "earth", "heart", "sun", "moon", "gold",
    "thread", "word", "gate", "rain", "grass", "roof", "knife", "power", "eye",
];

/// Radicals, asked by meaning or as building blocks of kanji.
pub struct RadicalSource {
    max_priority: u8,
}

impl RadicalSource {
    pub fn new(max_priority: u8) -> Self {
        Self { max_priority }
    }

    pub fn for_level(player_level: u32) -> Self {
        Self::new(max_radical_priority(player_level))
    }

    pub fn max_priority(&self) -> u8 {
        self.max_priority
    }
}

impl ItemSource for RadicalSource {
    type Item = Radical;

    fn kind(&self) -> ItemKind {
        ItemKind::Radical
    }

    fn id(item: &Radical) -> ItemId {
        item.id
    }

    fn lookup<C: Catalog + ?Sized>(&self, catalog: &C, id: ItemId) -> Fallible<Option<Radical>> {
        catalog.radical_by_id(id)
    }

    fn admits_new(&self, item: &Radical) -> bool {
        item.priority <= self.max_priority
    }

    fn unseen<S>(&self, catalog: &S, limit: usize) -> Fallible<Vec<Radical>>
    where
        S: CardRepository + Catalog + ?Sized,
    {
        catalog.unseen_radicals(self.max_priority, limit)
    }

    fn distractor_pool<C: Catalog + ?Sized>(
        &self,
        catalog: &C,
        _queued: &[Radical],
    ) -> Fallible<Vec<Radical>> {
        catalog.all_radicals()
    }

    fn answer(&self, item: &Radical) -> String {
        item.meaning.clone()
    }

    fn is_plausible(&self, item: &Radical, other: &Radical) -> bool {
        item.stroke_count.abs_diff(other.stroke_count) <= 2
    }

    fn synthetic(&self, _answer: &str, rng: &mut ChaCha8Rng) -> String {
        COMPONENT_MEANINGS
            .choose(rng)
            .map(|s| s.to_string())
            .unwrap_or_default()
    }

    fn recognition(&self, item: &Radical) -> Question {
        Question {
            kind: ItemKind::Radical,
            item_id: item.id,
            literal: item.literal.clone(),
            correct_answer: String::new(),
            choices: Vec::new(),
            prompt: "What does this radical mean?".to_string(),
            is_new: false,
            card_state: CardState::New,
            stroke_paths: Vec::new(),
            breakdown: Vec::new(),
            radical_name_jp: item.meaning_jp.clone(),
            grade: None,
            frequency: None,
            stroke_count: item.stroke_count,
        }
    }

    /// Shows some radicals of a kanji containing `item` and asks for the
    /// kanji.
    fn builder<C: Catalog + ?Sized>(
        &self,
        catalog: &C,
        item: &Radical,
        choice_count: usize,
        rng: &mut ChaCha8Rng,
    ) -> Fallible<Option<Question>> {
        let mut kanji_ids = catalog.kanji_ids_for_radical(item.id)?;
        kanji_ids.shuffle(rng);
        let mut target: Option<(Kanji, Vec<Radical>)> = None;
        for kanji_id in kanji_ids {
            let Some(kanji) = catalog.kanji_by_id(kanji_id)? else {
                continue;
            };
            let radicals = catalog.radicals_for_kanji(kanji_id)?;
            if !radicals.is_empty() {
                target = Some((kanji, radicals));
                break;
            }
        }
        let Some((kanji, radicals)) = target else {
            return Ok(None);
        };

        // The drawn radical is always among those shown.
        let mut shown: Vec<&Radical> = vec![item];
        shown.extend(
            radicals
                .iter()
                .filter(|r| r.id != item.id)
                .take(MAX_SHOWN_RADICALS - 1),
        );
        let shown_ids: Vec<ItemId> = shown.iter().map(|r| r.id).collect();

        let partial: Vec<String> = if shown_ids.len() >= 2 {
            catalog
                .kanji_containing_some_radicals(&shown_ids, PARTIAL_MATCH_LIMIT)?
                .into_iter()
                .map(|k| k.literal)
                .collect()
        } else {
            Vec::new()
        };
        let same_grade: Vec<String> = catalog
            .kanji_by_grade(kanji.grade.unwrap_or(1))?
            .into_iter()
            .map(|k| k.literal)
            .collect();
        let distractors = pick_distractors(
            &kanji.literal,
            vec![partial, same_grade],
            choice_count.saturating_sub(1),
            rng,
            random_kanji_literal,
        );
        let choices = with_answer(&kanji.literal, distractors, rng);

        let breakdown = radicals
            .iter()
            .map(|r| match &r.meaning_jp {
                Some(jp) if !jp.is_empty() => format!("{} = {} ({})", r.literal, r.meaning, jp),
                _ => format!("{} = {}", r.literal, r.meaning),
            })
            .collect();
        let literal = shown
            .iter()
            .map(|r| r.literal.as_str())
            .collect::<Vec<_>>()
            .join(" + ");

        Ok(Some(Question {
            kind: ItemKind::Radical,
            item_id: item.id,
            literal,
            correct_answer: kanji.literal.clone(),
            choices,
            prompt: "Which kanji contains these radicals?".to_string(),
            is_new: false,
            card_state: CardState::New,
            stroke_paths: Vec::new(),
            breakdown,
            radical_name_jp: item.meaning_jp.clone(),
            grade: kanji.grade,
            frequency: kanji.frequency,
            stroke_count: kanji.stroke_count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::select::Selector;
    use crate::types::mode::QuestionStyle;
    use crate::types::timestamp::Timestamp;

    fn radical(id: ItemId, literal: &str, meaning: &str, jp: Option<&str>) -> Radical {
        Radical {
            id,
            literal: literal.to_string(),
            meaning: meaning.to_string(),
            meaning_jp: jp.map(|s| s.to_string()),
            stroke_count: 2,
            stroke_svg: None,
            priority: 1,
        }
    }

    fn kanji(id: ItemId, literal: &str) -> Kanji {
        Kanji {
            id,
            literal: literal.to_string(),
            grade: Some(1),
            jlpt_level: None,
            frequency: None,
            stroke_count: 6,
            meanings: vec![],
            on_readings: vec!["ヨミ".to_string()],
            kun_readings: vec![],
            stroke_svg: None,
        }
    }

    fn now() -> Timestamp {
        Timestamp::from_epoch_seconds(0)
    }

    #[test]
    fn test_builder_question() -> Fallible<()> {
        let store = MemoryStore::new();
        store.add_radical(radical(1, "亻", "person", Some("にんべん")));
        store.add_radical(radical(2, "木", "tree", Some("き")));
        store.add_radical(radical(3, "日", "sun", None));
        store.add_kanji(kanji(10, "休"));
        store.add_kanji(kanji(11, "体"));
        store.add_kanji(kanji(12, "林"));
        store.add_kanji(kanji(13, "明"));
        store.link(1, 10);
        store.link(2, 10);
        store.link(1, 11);
        store.link(2, 12);
        store.link(3, 13);
        let mut selector = Selector::new(RadicalSource::new(1), 4, 8);
        assert!(selector.prepare_targeted_session(&store, 1, 2)?);
        let mut answers = Vec::new();
        for _ in 0..2 {
            let question = selector.generate_question(&store, QuestionStyle::Builder);
            let question = question.unwrap();
            assert_eq!(question.kind, ItemKind::Radical);
            assert_eq!(question.item_id, 1);
            assert!(question.literal.starts_with("亻"));
            assert_eq!(question.choices.len(), 4);
            assert_eq!(
                question
                    .choices
                    .iter()
                    .filter(|c| **c == question.correct_answer)
                    .count(),
                1
            );
            if question.correct_answer == "休" {
                assert_eq!(question.literal, "亻 + 木");
                assert_eq!(
                    question.breakdown,
                    vec!["亻 = person (にんべん)".to_string(), "木 = tree (き)".to_string()]
                );
                // Partial matches of 亻 + 木 are preferred.
                assert!(question.choices.contains(&"体".to_string()));
                assert!(question.choices.contains(&"林".to_string()));
            }
            answers.push(question.correct_answer);
        }
        assert!(answers.iter().all(|a| a == "休" || a == "体"));
        Ok(())
    }

    #[test]
    fn test_builder_degrades_to_recognition() -> Fallible<()> {
        let store = MemoryStore::new();
        store.add_radical(radical(1, "亻", "person", None));
        store.add_radical(radical(2, "木", "tree", None));
        let mut selector = Selector::new(RadicalSource::new(1), 2, 8);
        assert!(selector.prepare_targeted_session(&store, 1, 1)?);
        let question = selector.generate_question(&store, QuestionStyle::Builder);
        let question = question.unwrap();
        assert_eq!(question.prompt, "What does this radical mean?");
        assert_eq!(question.correct_answer, "person");
        assert_eq!(question.choices.len(), 2);
        Ok(())
    }

    #[test]
    fn test_new_cards_beyond_priority_wait() -> Fallible<()> {
        let store = MemoryStore::new();
        let mut rare = radical(1, "鬯", "herbs", None);
        rare.priority = 3;
        store.add_radical(rare);
        store.add_radical(radical(2, "木", "tree", None));
        store.ensure_card_exists(ItemKind::Radical, 1, now())?;
        let mut selector = Selector::new(RadicalSource::for_level(1), 4, 2);
        assert!(selector.prepare_session(&store, 5, now())?);
        assert_eq!(selector.remaining_count(), 1);
        let question = selector.generate_question(&store, QuestionStyle::Recognition);
        assert_eq!(question.map(|q| q.item_id), Some(2));
        Ok(())
    }
}
