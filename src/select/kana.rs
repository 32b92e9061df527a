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
use rand_chacha::ChaCha8Rng;

use crate::error::Fallible;
use crate::repo::CardRepository;
use crate::repo::Catalog;
use crate::select::ItemSource;
use crate::types::card::CardState;
use crate::types::catalog::Kana;
use crate::types::catalog::parse_stroke_paths;
use crate::types::item_kind::ItemId;
use crate::types::item_kind::ItemKind;
use crate::types::item_kind::KanaType;
use crate::types::item_kind::KanaVariant;
use crate::types::question::Question;

/// Romanizations of the basic syllabary.
const ROMAJI: [&str; 46] = [
    "a", "i", "u", "e", "o", "ka", "ki", "ku", "ke", "ko", "sa", "shi", "su", "se", "so", "ta",
    "chi", "tsu", "te", "to", "na", "ni", "nu", "ne", "no", "ha", "hi", "fu", "he", "ho", "ma",
    "mi", "mu", "me", "mo", "ya", "yu", "yo", "ra", "ri", "ru", "re", "ro", "wa", "wo", "n",
];

/// Kana of one syllabary, asked by romanization.
pub struct KanaSource {
    kana_type: KanaType,
}

impl KanaSource {
    pub fn new(kana_type: KanaType) -> Self {
        Self { kana_type }
    }

    pub fn kana_type(&self) -> KanaType {
        self.kana_type
    }
}

impl ItemSource for KanaSource {
    type Item = Kana;

    fn kind(&self) -> ItemKind {
        self.kana_type.item_kind()
    }

    fn id(item: &Kana) -> ItemId {
        item.id
    }

    fn lookup<C: Catalog + ?Sized>(&self, catalog: &C, id: ItemId) -> Fallible<Option<Kana>> {
        catalog.kana_by_id(id)
    }

    fn accepts(&self, item: &Kana) -> bool {
        item.kana_type == self.kana_type
    }

    fn unseen<S>(&self, catalog: &S, limit: usize) -> Fallible<Vec<Kana>>
    where
        S: CardRepository + Catalog + ?Sized,
    {
        catalog.unseen_kana(self.kana_type, limit)
    }

    fn distractor_pool<C: Catalog + ?Sized>(
        &self,
        catalog: &C,
        _queued: &[Kana],
    ) -> Fallible<Vec<Kana>> {
        catalog.kana_by_type_and_variant(self.kana_type, KanaVariant::Basic)
    }

    fn answer(&self, item: &Kana) -> String {
        item.romanization.clone()
    }

    fn is_plausible(&self, item: &Kana, other: &Kana) -> bool {
        item.group == other.group
    }

    fn synthetic(&self, _answer: &str, rng: &mut ChaCha8Rng) -> String {
        ROMAJI.choose(rng).map(|s| s.to_string()).unwrap_or_default()
    }

    fn recognition(&self, item: &Kana) -> Question {
        Question {
            kind: self.kind(),
            item_id: item.id,
            literal: item.literal.clone(),
            correct_answer: String::new(),
            choices: Vec::new(),
            prompt: format!("What is the romanization of this {}?", self.kana_type.as_str()),
            is_new: false,
            card_state: CardState::New,
            stroke_paths: Vec::new(),
            breakdown: Vec::new(),
            radical_name_jp: None,
            grade: None,
            frequency: None,
            stroke_count: item.stroke_count,
        }
    }

    /// Kana without stroke data can still be written freehand.
    fn writing(&self, item: &Kana) -> Option<Question> {
        let stroke_paths = match item.stroke_svg.as_deref().map(parse_stroke_paths) {
            None => Vec::new(),
            Some(Ok(paths)) => paths,
            Some(Err(e)) => {
                log::debug!("Kana {} has bad stroke data: {e}", item.id);
                return None;
            }
        };
        let mut question = self.recognition(item);
        question.prompt = format!("Write: {}", item.romanization);
        question.correct_answer = item.literal.clone();
        question.stroke_paths = stroke_paths;
        Some(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::select::Selector;
    use crate::types::mode::QuestionStyle;
    use crate::types::timestamp::Timestamp;

    fn kana(id: ItemId, literal: &str, kana_type: KanaType, romaji: &str, group: &str) -> Kana {
        Kana {
            id,
            literal: literal.to_string(),
            kana_type,
            romanization: romaji.to_string(),
            group: group.to_string(),
            stroke_count: 2,
            stroke_svg: None,
            variant: KanaVariant::Basic,
        }
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_kana(kana(1, "か", KanaType::Hiragana, "ka", "k"));
        store.add_kana(kana(2, "き", KanaType::Hiragana, "ki", "k"));
        store.add_kana(kana(3, "く", KanaType::Hiragana, "ku", "k"));
        store.add_kana(kana(4, "さ", KanaType::Hiragana, "sa", "s"));
        store.add_kana(kana(5, "カ", KanaType::Katakana, "ka", "k"));
        store
    }

    fn now() -> Timestamp {
        Timestamp::from_epoch_seconds(0)
    }

    #[test]
    fn test_one_syllabary_per_session() -> Fallible<()> {
        let store = store();
        let mut selector = Selector::new(KanaSource::new(KanaType::Katakana), 4, 1);
        assert!(selector.prepare_session(&store, 10, now())?);
        assert_eq!(selector.remaining_count(), 1);
        let question = selector.generate_question(&store, QuestionStyle::Recognition);
        let question = question.unwrap();
        assert_eq!(question.kind, ItemKind::Katakana);
        assert_eq!(question.correct_answer, "ka");
        Ok(())
    }

    #[test]
    fn test_same_row_distractors_come_first() -> Fallible<()> {
        let store = store();
        let mut selector = Selector::new(KanaSource::new(KanaType::Hiragana), 3, 4);
        assert!(selector.prepare_targeted_session(&store, 1, 1)?);
        let question = selector.generate_question(&store, QuestionStyle::Recognition);
        let mut choices = question.unwrap().choices;
        choices.sort();
        assert_eq!(choices, vec!["ka", "ki", "ku"]);
        Ok(())
    }

    #[test]
    fn test_writing_without_strokes() -> Fallible<()> {
        let store = store();
        let mut selector = Selector::new(KanaSource::new(KanaType::Hiragana), 4, 1);
        assert!(selector.prepare_targeted_session(&store, 4, 1)?);
        let question = selector.generate_question(&store, QuestionStyle::Writing);
        let question = question.unwrap();
        assert_eq!(question.prompt, "Write: sa");
        assert_eq!(question.correct_answer, "さ");
        assert!(question.stroke_paths.is_empty());
        Ok(())
    }
}
