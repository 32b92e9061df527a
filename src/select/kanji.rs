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

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;

use crate::error::Fallible;
use crate::progression::grade_mastery;
use crate::progression::unlocked_grades;
use crate::repo::CardRepository;
use crate::repo::Catalog;
use crate::select::ItemSource;
use crate::types::card::CardState;
use crate::types::catalog::Kanji;
use crate::types::catalog::parse_stroke_paths;
use crate::types::item_kind::ItemId;
use crate::types::item_kind::ItemKind;
use crate::types::mode::QuestionStyle;
use crate::types::question::Question;

/// Pools smaller than this are topped up with first-grade kanji.
const MIN_POOL_SIZE: usize = 20;

const HIRAGANA: [&str; 46] = [
    "あ", "い", "う", "え", "お", "か", "き", "く", "け", "こ", "さ", "し", "す", "せ", "そ", "た",
    "ち", "つ", "て", "と", "な", "に", "ぬ", "ね", "の", "は", "ひ", "ふ", "へ", "ほ", "ま", "み",
    "む", "め", "も", "や", "ゆ", "よ", "ら", "り", "る", "れ", "ろ", "わ", "を", "ん",
];

/// Kanji, asked by reading.
pub struct KanjiSource {
    grades: Vec<u8>,
}

impl KanjiSource {
    pub fn new(grades: Vec<u8>) -> Self {
        Self { grades }
    }

    /// A source drawing new kanji from the grades unlocked at a player level.
    pub fn for_level(player_level: u32) -> Self {
        Self::new(unlocked_grades(player_level).to_vec())
    }

    pub fn grades(&self) -> &[u8] {
        &self.grades
    }
}

impl ItemSource for KanjiSource {
    type Item = Kanji;

    fn kind(&self) -> ItemKind {
        ItemKind::Kanji
    }

    fn id(item: &Kanji) -> ItemId {
        item.id
    }

    fn lookup<C: Catalog + ?Sized>(&self, catalog: &C, id: ItemId) -> Fallible<Option<Kanji>> {
        catalog.kanji_by_id(id)
    }

    /// Recognition asks for the reading, so kanji without one are only
    /// written.
    fn asks(&self, item: &Kanji, style: QuestionStyle) -> bool {
        style != QuestionStyle::Recognition || !item.primary_reading().is_empty()
    }

    /// New kanji come mostly from the lower unlocked grades. The better the
    /// player knows the grade just below the highest, the larger the share
    /// drawn from the highest grade. Slots a grade cannot fill carry over.
    fn unseen<S>(&self, store: &S, limit: usize) -> Fallible<Vec<Kanji>>
    where
        S: CardRepository + Catalog + ?Sized,
    {
        let Some((&highest, lower)) = self.grades.split_last() else {
            return Ok(Vec::new());
        };
        let Some(&gatekeeper) = lower.last() else {
            return store.unseen_kanji_by_grade(highest, limit);
        };
        let ratio = grade_mastery(store, gatekeeper)?.new_grade_ratio();
        let highest_slots = (limit as f64 * ratio).floor() as usize;
        let lower_slots = limit - highest_slots.min(limit);
        let mut result: Vec<Kanji> = Vec::new();
        for grade in lower {
            if result.len() >= lower_slots {
                break;
            }
            result.extend(store.unseen_kanji_by_grade(*grade, lower_slots - result.len())?);
        }
        let carried = limit - result.len();
        if carried > 0 {
            result.extend(store.unseen_kanji_by_grade(highest, carried)?);
        }
        log::debug!(
            "Unseen kanji: {} from grades {lower:?}, {} from grade {highest} (ratio {ratio}).",
            result.iter().filter(|k| k.grade != Some(highest)).count(),
            result.iter().filter(|k| k.grade == Some(highest)).count()
        );
        Ok(result)
    }

    fn distractor_pool<C: Catalog + ?Sized>(
        &self,
        catalog: &C,
        queued: &[Kanji],
    ) -> Fallible<Vec<Kanji>> {
        let grades: BTreeSet<u8> = queued.iter().filter_map(|k| k.grade).collect();
        let mut pool: Vec<Kanji> = Vec::new();
        for grade in &grades {
            pool.extend(catalog.kanji_by_grade(*grade)?);
        }
        if pool.len() < MIN_POOL_SIZE && !grades.contains(&1) {
            pool.extend(catalog.kanji_by_grade(1)?);
        }
        Ok(pool)
    }

    fn answer(&self, item: &Kanji) -> String {
        item.primary_reading().to_string()
    }

    fn is_plausible(&self, item: &Kanji, other: &Kanji) -> bool {
        let a = item.primary_reading().chars().count();
        let b = other.primary_reading().chars().count();
        a.abs_diff(b) <= 1
    }

    fn synthetic(&self, answer: &str, rng: &mut ChaCha8Rng) -> String {
        let length = answer.chars().count().clamp(1, 4);
        (0..length)
            .map(|_| HIRAGANA[rng.random_range(0..HIRAGANA.len())])
            .collect()
    }

    fn recognition(&self, item: &Kanji) -> Question {
        Question {
            kind: ItemKind::Kanji,
            item_id: item.id,
            literal: item.literal.clone(),
            correct_answer: String::new(),
            choices: Vec::new(),
            prompt: "What is the reading of this kanji?".to_string(),
            is_new: false,
            card_state: CardState::New,
            stroke_paths: Vec::new(),
            breakdown: Vec::new(),
            radical_name_jp: None,
            grade: item.grade,
            frequency: item.frequency,
            stroke_count: item.stroke_count,
        }
    }

    fn writing(&self, item: &Kanji) -> Option<Question> {
        let stroke_paths = match item.stroke_svg.as_deref().map(parse_stroke_paths) {
            Some(Ok(paths)) => paths,
            Some(Err(e)) => {
                log::debug!("Kanji {} has bad stroke data: {e}", item.id);
                return None;
            }
            None => return None,
        };
        let mut question = self.recognition(item);
        question.prompt = match item.primary_reading() {
            "" => format!("Write: {}", item.primary_meaning()),
            reading => format!("Write: {} ({reading})", item.primary_meaning()),
        };
        question.correct_answer = item.literal.clone();
        question.stroke_paths = stroke_paths;
        Some(question)
    }
}

/// A placeholder for pools that have no better candidate.
pub(crate) fn random_kanji_literal(rng: &mut ChaCha8Rng) -> String {
    const COMMON: [&str; 12] = ["日", "月", "火", "水", "木", "金", "土", "山", "川", "田", "人", "口"];
    COMMON.choose(rng).map(|s| s.to_string()).unwrap_or_default()
}
