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

//! Builds a study queue and turns it into questions, one at a time.

mod kana;
mod kanji;
mod radical;

use std::collections::HashSet;
use std::collections::VecDeque;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

pub use self::kana::KanaSource;
pub use self::kanji::KanjiSource;
pub use self::radical::RadicalSource;
use crate::error::Fallible;
use crate::repo::CardRepository;
use crate::repo::Catalog;
use crate::types::card::CardState;
use crate::types::item_kind::ItemId;
use crate::types::item_kind::ItemKind;
use crate::types::mode::QuestionStyle;
use crate::types::question::Question;
use crate::types::timestamp::Timestamp;

/// Default number of choices in a multiple-choice question.
pub const DEFAULT_CHOICE_COUNT: usize = 4;

/// Longest queue a session can build, however many questions are asked for.
pub const MAX_QUEUE_LENGTH: usize = 500;

/// Gives up on synthesizing distractors after this many collisions.
const MAX_SYNTHETIC_ATTEMPTS: usize = 64;

/// What the selector needs to know about one family of items.
pub trait ItemSource {
    type Item: Clone;

    fn kind(&self) -> ItemKind;

    fn id(item: &Self::Item) -> ItemId;

    fn lookup<C: Catalog + ?Sized>(&self, catalog: &C, id: ItemId) -> Fallible<Option<Self::Item>>;

    /// Whether the item can be asked at all.
    fn accepts(&self, _item: &Self::Item) -> bool {
        true
    }

    /// Whether a tracked but never reviewed item may be introduced now.
    fn admits_new(&self, _item: &Self::Item) -> bool {
        true
    }

    /// Whether the item can be asked in this style.
    fn asks(&self, _item: &Self::Item, _style: QuestionStyle) -> bool {
        true
    }

    /// Items with no card yet, in introduction order.
    fn unseen<S>(&self, store: &S, limit: usize) -> Fallible<Vec<Self::Item>>
    where
        S: CardRepository + Catalog + ?Sized;

    /// Items that distractors are drawn from, given the queued items.
    fn distractor_pool<C: Catalog + ?Sized>(
        &self,
        catalog: &C,
        queued: &[Self::Item],
    ) -> Fallible<Vec<Self::Item>>;

    /// The correct answer of a recognition question.
    fn answer(&self, item: &Self::Item) -> String;

    /// Whether `other` makes a convincing distractor for `item`.
    fn is_plausible(&self, item: &Self::Item, other: &Self::Item) -> bool;

    /// A made-up wrong answer, used when the pool runs dry.
    fn synthetic(&self, answer: &str, rng: &mut ChaCha8Rng) -> String;

    /// A recognition question without its choices.
    fn recognition(&self, item: &Self::Item) -> Question;

    /// A writing question, or `None` if the item cannot be written.
    fn writing(&self, _item: &Self::Item) -> Option<Question> {
        None
    }

    /// A builder question, or `None` if the item has no composition data.
    fn builder<C: Catalog + ?Sized>(
        &self,
        _catalog: &C,
        _item: &Self::Item,
        _choice_count: usize,
        _rng: &mut ChaCha8Rng,
    ) -> Fallible<Option<Question>> {
        Ok(None)
    }
}

pub struct Selector<K: ItemSource> {
    source: K,
    queue: VecDeque<ItemId>,
    pool: Vec<K::Item>,
    choice_count: usize,
    rng: ChaCha8Rng,
}

impl<K: ItemSource> Selector<K> {
    pub fn new(source: K, choice_count: usize, seed: u64) -> Self {
        Self {
            source,
            queue: VecDeque::new(),
            pool: Vec::new(),
            choice_count: choice_count.max(2),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn source(&self) -> &K {
        &self.source
    }

    /// Fills the queue with up to `count` items: due cards first, then
    /// learning cards, then tracked new cards, then items never seen.
    /// Returns false if nothing could be queued.
    pub fn prepare_session<S>(&mut self, store: &S, count: usize, now: Timestamp) -> Fallible<bool>
    where
        S: CardRepository + Catalog + ?Sized,
    {
        let count = count.min(MAX_QUEUE_LENGTH);
        let kind = self.source.kind();
        let mut added: HashSet<ItemId> = HashSet::new();
        let mut items: Vec<K::Item> = Vec::new();

        let mut due = store.due_cards(kind, now)?;
        due.sort_by_key(|card| card.due);
        for card in due {
            if items.len() >= count {
                break;
            }
            self.admit(store, card.item_id, &mut added, &mut items, |_, _| true)?;
        }
        let due_count = items.len();

        let remaining = count.saturating_sub(items.len());
        if remaining > 0 {
            for card in store.learning_cards(kind, now, remaining)? {
                if items.len() >= count {
                    break;
                }
                self.admit(store, card.item_id, &mut added, &mut items, |_, _| true)?;
            }
        }
        let learning_count = items.len() - due_count;

        let remaining = count.saturating_sub(items.len());
        if remaining > 0 {
            for card in store.new_cards(kind, remaining.saturating_mul(2))? {
                if items.len() >= count {
                    break;
                }
                self.admit(store, card.item_id, &mut added, &mut items, K::admits_new)?;
            }
        }
        let new_count = items.len() - due_count - learning_count;

        let remaining = count.saturating_sub(items.len());
        if remaining > 0 {
            for item in self.source.unseen(store, remaining)? {
                if items.len() >= count {
                    break;
                }
                let id = K::id(&item);
                if !self.source.accepts(&item) || !added.insert(id) {
                    continue;
                }
                store.ensure_card_exists(kind, id, now)?;
                items.push(item);
            }
        }
        let unseen_count = items.len() - due_count - learning_count - new_count;
        log::debug!(
            "Prepared {kind} session: {due_count} due, {learning_count} learning, {new_count} new, {unseen_count} unseen."
        );

        self.finish_preparing(store, items)
    }

    /// Fills the queue with one item, repeated.
    pub fn prepare_targeted_session<S>(&mut self, store: &S, target: ItemId, count: usize) -> Fallible<bool>
    where
        S: CardRepository + Catalog + ?Sized,
    {
        let item = match self.source.lookup(store, target)? {
            Some(item) if self.source.accepts(&item) => item,
            _ => {
                self.queue.clear();
                return Ok(false);
            }
        };
        let items = vec![item; count.min(MAX_QUEUE_LENGTH)];
        self.finish_preparing(store, items)
    }

    pub fn has_next(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn remaining_count(&self) -> usize {
        self.queue.len()
    }

    /// Pops items off the queue until one yields a question. Items that
    /// vanished from the catalog, or cannot be asked in this style, are
    /// skipped.
    pub fn generate_question<S>(&mut self, store: &S, style: QuestionStyle) -> Option<Question>
    where
        S: CardRepository + Catalog + ?Sized,
    {
        while let Some(id) = self.queue.pop_front() {
            match self.build_question(store, id, style) {
                Ok(Some(question)) => return Some(question),
                Ok(None) => {
                    log::debug!("Skipping {} {id}: no question.", self.source.kind());
                }
                Err(e) => {
                    log::warn!("Skipping {} {id}: {e}", self.source.kind());
                }
            }
        }
        None
    }

    fn admit<S>(
        &self,
        store: &S,
        id: ItemId,
        added: &mut HashSet<ItemId>,
        items: &mut Vec<K::Item>,
        filter: impl Fn(&K, &K::Item) -> bool,
    ) -> Fallible<()>
    where
        S: Catalog + ?Sized,
    {
        if added.contains(&id) {
            return Ok(());
        }
        match self.source.lookup(store, id)? {
            Some(item) if self.source.accepts(&item) && filter(&self.source, &item) => {
                added.insert(id);
                items.push(item);
            }
            Some(_) => {}
            None => log::debug!("{} {id} is no longer in the catalog.", self.source.kind()),
        }
        Ok(())
    }

    fn finish_preparing<S>(&mut self, store: &S, items: Vec<K::Item>) -> Fallible<bool>
    where
        S: Catalog + ?Sized,
    {
        self.pool = self.source.distractor_pool(store, &items)?;
        let mut ids: Vec<ItemId> = items.iter().map(K::id).collect();
        ids.shuffle(&mut self.rng);
        self.queue = ids.into();
        Ok(!self.queue.is_empty())
    }

    fn build_question<S>(&mut self, store: &S, id: ItemId, style: QuestionStyle) -> Fallible<Option<Question>>
    where
        S: CardRepository + Catalog + ?Sized,
    {
        let Some(item) = self.source.lookup(store, id)? else {
            return Ok(None);
        };
        if !self.source.accepts(&item) || !self.source.asks(&item, style) {
            return Ok(None);
        }
        let question = match style {
            QuestionStyle::Recognition => Some(self.recognition_question(&item)),
            QuestionStyle::Writing => self.source.writing(&item),
            QuestionStyle::Builder => {
                match self.source.builder(store, &item, self.choice_count, &mut self.rng)? {
                    Some(question) => Some(question),
                    None => Some(self.recognition_question(&item)),
                }
            }
        };
        let Some(mut question) = question else {
            return Ok(None);
        };
        let card = store.get_card(self.source.kind(), id)?;
        question.card_state = card.as_ref().map_or(CardState::New, |c| c.state);
        question.is_new = question.card_state == CardState::New;
        Ok(Some(question))
    }

    fn recognition_question(&mut self, item: &K::Item) -> Question {
        let mut question = self.source.recognition(item);
        let answer = self.source.answer(item);
        let id = K::id(item);
        let mut grouped: Vec<String> = Vec::new();
        let mut wider: Vec<String> = Vec::new();
        for other in self.pool.iter().filter(|other| K::id(other) != id) {
            if self.source.is_plausible(item, other) {
                grouped.push(self.source.answer(other));
            } else {
                wider.push(self.source.answer(other));
            }
        }
        let source = &self.source;
        let distractors = pick_distractors(
            &answer,
            vec![grouped, wider],
            self.choice_count - 1,
            &mut self.rng,
            |rng| source.synthetic(&answer, rng),
        );
        question.choices = with_answer(&answer, distractors, &mut self.rng);
        question.correct_answer = answer;
        question
    }
}

/// Picks `needed` distinct wrong answers, drawing from each pass in turn
/// and synthesizing the rest.
pub(crate) fn pick_distractors(
    answer: &str,
    passes: Vec<Vec<String>>,
    needed: usize,
    rng: &mut ChaCha8Rng,
    mut synthetic: impl FnMut(&mut ChaCha8Rng) -> String,
) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(answer.to_string());
    let mut picked: Vec<String> = Vec::with_capacity(needed);
    for mut pass in passes {
        pass.shuffle(rng);
        for candidate in pass {
            if picked.len() >= needed {
                return picked;
            }
            if !candidate.is_empty() && seen.insert(candidate.clone()) {
                picked.push(candidate);
            }
        }
    }
    let mut attempts = 0;
    while picked.len() < needed && attempts < MAX_SYNTHETIC_ATTEMPTS {
        attempts += 1;
        let candidate = synthetic(rng);
        if !candidate.is_empty() && seen.insert(candidate.clone()) {
            picked.push(candidate);
        }
    }
    picked
}

/// The distractors plus the answer, shuffled.
pub(crate) fn with_answer(answer: &str, distractors: Vec<String>, rng: &mut ChaCha8Rng) -> Vec<String> {
    let mut choices = distractors;
    choices.push(answer.to_string());
    choices.shuffle(rng);
    choices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::types::card::Card;
    use crate::types::catalog::Radical;

    fn now() -> Timestamp {
        Timestamp::from_epoch_seconds(1_000_000)
    }

    fn radical(id: ItemId, meaning: &str, priority: u8) -> Radical {
        Radical {
            id,
            literal: format!("r{id}"),
            meaning: meaning.to_string(),
            meaning_jp: None,
            stroke_count: 3,
            stroke_svg: None,
            priority,
        }
    }

    fn store_with_radicals(n: ItemId) -> MemoryStore {
        let store = MemoryStore::new();
        for id in 1..=n {
            store.add_radical(radical(id, &format!("meaning {id}"), 1));
        }
        store
    }

    fn selector() -> Selector<RadicalSource> {
        Selector::new(RadicalSource::new(1), DEFAULT_CHOICE_COUNT, 42)
    }

    #[test]
    fn test_queue_priority() -> Fallible<()> {
        let store = store_with_radicals(6);
        // 1 is due, 2 is learning but not due, 3 is tracked but new.
        let mut due = Card::new(ItemKind::Radical, 1, now());
        due.state = CardState::Review;
        due.due = now().plus_seconds(-60);
        store.save_card(&due)?;
        let mut learning = Card::new(ItemKind::Radical, 2, now());
        learning.state = CardState::Learning;
        learning.due = now().plus_days(1);
        store.save_card(&learning)?;
        store.ensure_card_exists(ItemKind::Radical, 3, now())?;

        let mut selector = selector();
        assert!(selector.prepare_session(&store, 4, now())?);
        assert_eq!(selector.remaining_count(), 4);
        let mut ids: Vec<ItemId> = Vec::new();
        while let Some(q) = selector.generate_question(&store, QuestionStyle::Recognition) {
            ids.push(q.item_id);
        }
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        // The unseen item now has a card.
        assert!(store.get_card(ItemKind::Radical, 4)?.is_some());
        assert!(store.get_card(ItemKind::Radical, 5)?.is_none());
        Ok(())
    }

    #[test]
    fn test_learning_cards_outrank_unseen_items() -> Fallible<()> {
        let store = store_with_radicals(4);
        for (id, due) in [(1, now().plus_seconds(-60)), (2, now()), (3, now().plus_days(1))] {
            let mut card = Card::new(ItemKind::Radical, id, now());
            card.state = CardState::Learning;
            card.due = due;
            store.save_card(&card)?;
        }
        let mut selector = selector();
        assert!(selector.prepare_session(&store, 3, now())?);
        let mut ids: Vec<ItemId> = Vec::new();
        while let Some(q) = selector.generate_question(&store, QuestionStyle::Recognition) {
            ids.push(q.item_id);
        }
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(store.get_card(ItemKind::Radical, 4)?.is_none());
        Ok(())
    }

    #[test]
    fn test_huge_counts_are_capped() -> Fallible<()> {
        let store = store_with_radicals(3);
        store.ensure_card_exists(ItemKind::Radical, 1, now())?;
        let mut selector = selector();
        assert!(selector.prepare_session(&store, usize::MAX, now())?);
        assert_eq!(selector.remaining_count(), 3);
        assert!(selector.prepare_targeted_session(&store, 2, usize::MAX)?);
        assert_eq!(selector.remaining_count(), MAX_QUEUE_LENGTH);
        Ok(())
    }

    #[test]
    fn test_due_cards_come_first() -> Fallible<()> {
        let store = store_with_radicals(5);
        for (id, offset) in [(4, -10), (5, -30), (3, -20)] {
            let mut card = Card::new(ItemKind::Radical, id, now());
            card.state = CardState::Review;
            card.due = now().plus_seconds(offset);
            store.save_card(&card)?;
        }
        let mut selector = selector();
        assert!(selector.prepare_session(&store, 2, now())?);
        let mut ids: Vec<ItemId> = Vec::new();
        while let Some(q) = selector.generate_question(&store, QuestionStyle::Recognition) {
            assert!(!q.is_new);
            ids.push(q.item_id);
        }
        ids.sort();
        assert_eq!(ids, vec![3, 5]);
        Ok(())
    }

    #[test]
    fn test_empty_catalog() -> Fallible<()> {
        let store = MemoryStore::new();
        let mut selector = selector();
        assert!(!selector.prepare_session(&store, 5, now())?);
        assert!(!selector.has_next());
        assert_eq!(selector.generate_question(&store, QuestionStyle::Recognition), None);
        Ok(())
    }

    #[test]
    fn test_choices_are_unique_and_complete() -> Fallible<()> {
        let store = store_with_radicals(8);
        let mut selector = selector();
        assert!(selector.prepare_session(&store, 8, now())?);
        let mut asked = 0;
        while let Some(q) = selector.generate_question(&store, QuestionStyle::Recognition) {
            asked += 1;
            assert!(q.is_new);
            assert_eq!(q.choices.len(), DEFAULT_CHOICE_COUNT);
            assert_eq!(q.choices.iter().filter(|c| **c == q.correct_answer).count(), 1);
            let unique: HashSet<&String> = q.choices.iter().collect();
            assert_eq!(unique.len(), q.choices.len());
        }
        assert_eq!(asked, 8);
        Ok(())
    }

    #[test]
    fn test_synthetic_distractors_fill_small_pools() -> Fallible<()> {
        let store = store_with_radicals(1);
        let mut selector = Selector::new(RadicalSource::new(1), 6, 3);
        assert!(selector.prepare_session(&store, 1, now())?);
        let question = selector.generate_question(&store, QuestionStyle::Recognition);
        let question = question.unwrap();
        assert_eq!(question.choices.len(), 6);
        let unique: HashSet<&String> = question.choices.iter().collect();
        assert_eq!(unique.len(), 6);
        Ok(())
    }

    #[test]
    fn test_vanished_items_are_skipped() -> Fallible<()> {
        let store = store_with_radicals(2);
        let mut card = Card::new(ItemKind::Radical, 99, now());
        card.state = CardState::Review;
        card.due = now();
        store.save_card(&card)?;
        let mut selector = selector();
        assert!(selector.prepare_session(&store, 3, now())?);
        assert_eq!(selector.remaining_count(), 2);
        Ok(())
    }

    #[test]
    fn test_targeted_session() -> Fallible<()> {
        let store = store_with_radicals(3);
        let mut selector = selector();
        assert!(selector.prepare_targeted_session(&store, 2, 3)?);
        for _ in 0..3 {
            let q = selector.generate_question(&store, QuestionStyle::Recognition);
            assert_eq!(q.map(|q| q.item_id), Some(2));
        }
        assert!(!selector.has_next());
        assert!(!selector.prepare_targeted_session(&store, 42, 3)?);
        Ok(())
    }

    #[test]
    fn test_pick_distractors() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let passes = vec![
            vec!["a".to_string(), "b".to_string(), "a".to_string()],
            vec!["ans".to_string(), "c".to_string()],
        ];
        let picked = pick_distractors("ans", passes, 3, &mut rng, |_| "z".to_string());
        let picked: HashSet<String> = picked.into_iter().collect();
        let expected: HashSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(picked, expected);
        // A synthetic source that only repeats itself gives up.
        let picked = pick_distractors("ans", vec![], 3, &mut rng, |_| "z".to_string());
        assert_eq!(picked, vec!["z".to_string()]);
    }
}
