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

//! The session state machine.

mod state;

use std::sync::Arc;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::watch;

pub use self::state::SessionEvent;
pub use self::state::SessionState;
pub use self::state::SessionStats;
use crate::clock::Clock;
use crate::config::Config;
use crate::config::SessionConfig;
use crate::encounter::Encounter;
use crate::encounter::EncounterEngine;
use crate::encounter::EncounterScope;
use crate::encounter::PityCounters;
use crate::error::Fallible;
use crate::leveling::ItemLeveling;
use crate::progression::max_radical_priority;
use crate::progression::unlocked_grades;
use crate::repo::Store;
use crate::scoring::score;
use crate::select::KanaSource;
use crate::select::KanjiSource;
use crate::select::RadicalSource;
use crate::select::Selector;
use crate::srs::review;
use crate::types::card::Card;
use crate::types::item_kind::ItemId;
use crate::types::item_kind::KanaType;
use crate::types::mode::GameMode;
use crate::types::mode::ModeFamily;
use crate::types::question::Question;
use crate::types::timestamp::Timestamp;

/// The selector of the running session.
enum ActiveSelector {
    Kanji(Selector<KanjiSource>),
    Kana(Selector<KanaSource>),
    Radical(Selector<RadicalSource>),
}

impl ActiveSelector {
    fn prepare<S: Store>(
        &mut self,
        store: &S,
        count: usize,
        target: Option<ItemId>,
        now: Timestamp,
    ) -> Fallible<bool> {
        match (self, target) {
            (ActiveSelector::Kanji(s), Some(id)) => s.prepare_targeted_session(store, id, count),
            (ActiveSelector::Kanji(s), None) => s.prepare_session(store, count, now),
            (ActiveSelector::Kana(s), Some(id)) => s.prepare_targeted_session(store, id, count),
            (ActiveSelector::Kana(s), None) => s.prepare_session(store, count, now),
            (ActiveSelector::Radical(s), Some(id)) => s.prepare_targeted_session(store, id, count),
            (ActiveSelector::Radical(s), None) => s.prepare_session(store, count, now),
        }
    }

    fn remaining_count(&self) -> usize {
        match self {
            ActiveSelector::Kanji(s) => s.remaining_count(),
            ActiveSelector::Kana(s) => s.remaining_count(),
            ActiveSelector::Radical(s) => s.remaining_count(),
        }
    }

    fn next<S: Store>(&mut self, store: &S, mode: GameMode) -> Option<Question> {
        let style = mode.style();
        match self {
            ActiveSelector::Kanji(s) => s.generate_question(store, style),
            ActiveSelector::Kana(s) => s.generate_question(store, style),
            ActiveSelector::Radical(s) => s.generate_question(store, style),
        }
    }
}

/// Per-session counters, reset on every start.
struct Counters {
    mode: GameMode,
    kana_type: KanaType,
    question_number: usize,
    total: usize,
    correct_count: usize,
    combo: u32,
    max_combo: u32,
    session_xp: u32,
    started_at: Timestamp,
    touched: Vec<ItemId>,
}

impl Counters {
    fn new(mode: GameMode, kana_type: KanaType, started_at: Timestamp) -> Self {
        Self {
            mode,
            kana_type,
            question_number: 0,
            total: 0,
            correct_count: 0,
            combo: 0,
            max_combo: 0,
            session_xp: 0,
            started_at,
            touched: Vec::new(),
        }
    }
}

pub struct SessionEngine<S: Store> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    encounters: EncounterEngine,
    leveling: ItemLeveling,
    player_level: u32,
    /// Seeds each session's selector.
    seeds: ChaCha8Rng,
    selector: Option<ActiveSelector>,
    counters: Counters,
    state: watch::Sender<SessionState>,
}

impl<S: Store> SessionEngine<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        let seed = config
            .session
            .seed
            .unwrap_or_else(|| rand::rng().random());
        let mut seeds = ChaCha8Rng::seed_from_u64(seed);
        let encounters = EncounterEngine::new(config.encounter.clone(), seeds.random());
        let now = clock.now();
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            store,
            clock,
            config: config.session.clone(),
            encounters,
            leveling: ItemLeveling::new(config.leveling.clone()),
            player_level: 1,
            seeds,
            selector: None,
            counters: Counters::new(GameMode::Recognition, KanaType::Hiragana, now),
            state,
        }
    }

    /// The level that decides which content is unlocked.
    pub fn set_player_level(&mut self, level: u32) {
        self.player_level = level.max(1);
    }

    pub fn player_level(&self) -> u32 {
        self.player_level
    }

    /// A receiver that sees the current state immediately and every
    /// change after it.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn pity(&self) -> PityCounters {
        self.encounters.pity()
    }

    pub fn restore_pity(&mut self, counters: PityCounters) {
        self.encounters.restore_pity(counters);
    }

    pub fn reset_pity(&mut self) {
        self.encounters.reset_pity();
    }

    /// Drops any session and returns to `Idle`.
    pub fn reset(&mut self) {
        self.selector = None;
        self.publish(SessionState::Idle);
    }

    /// Processes one event to completion. Events that make no sense in
    /// the current state are ignored.
    pub fn dispatch(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StartSession {
                mode,
                count,
                target,
                kana_type,
            } => self.start(mode, count, target, kana_type.unwrap_or(KanaType::Hiragana)),
            SessionEvent::SubmitAnswer(answer) => {
                match self.state() {
                    SessionState::AwaitingAnswer {
                        question,
                        question_number,
                        total,
                        ..
                    } => self.submit(question, answer, question_number, total),
                    other => log::debug!("Ignoring answer while {}.", state_name(&other)),
                }
            }
            SessionEvent::NextQuestion => {
                if matches!(self.state(), SessionState::ShowingResult { .. }) {
                    self.show_next_question();
                } else {
                    log::debug!("Ignoring next question outside of a result.");
                }
            }
            SessionEvent::EndSession => {
                if self.state().is_active() {
                    self.complete();
                } else {
                    log::debug!("Ignoring end of session with no session underway.");
                }
            }
        }
    }

    fn publish(&mut self, state: SessionState) {
        log::debug!("Session state: {}.", state_name(&state));
        self.state.send_replace(state);
    }

    fn start(&mut self, mode: GameMode, count: usize, target: Option<ItemId>, kana_type: KanaType) {
        let now = self.clock.now();
        self.counters = Counters::new(mode, kana_type, now);
        self.publish(SessionState::Preparing { mode });

        let seed: u64 = self.seeds.random();
        let choice_count = self.config.choice_count;
        let mut selector = match mode.family() {
            ModeFamily::Kanji => ActiveSelector::Kanji(Selector::new(
                KanjiSource::for_level(self.player_level),
                choice_count,
                seed,
            )),
            ModeFamily::Kana => ActiveSelector::Kana(Selector::new(
                KanaSource::new(kana_type),
                choice_count,
                seed,
            )),
            ModeFamily::Radical => ActiveSelector::Radical(Selector::new(
                RadicalSource::for_level(self.player_level),
                choice_count,
                seed,
            )),
        };
        match selector.prepare(self.store.as_ref(), count, target, now) {
            Ok(true) => {}
            Ok(false) => {
                self.selector = None;
                self.publish(SessionState::Error {
                    message: unavailable_message(mode).to_string(),
                });
                return;
            }
            Err(e) => {
                log::warn!("Failed to prepare {mode} session: {e}");
                self.selector = None;
                self.publish(SessionState::Error {
                    message: format!("Could not prepare the session: {}", e.message()),
                });
                return;
            }
        }
        self.counters.total = selector.remaining_count();
        self.selector = Some(selector);
        self.show_next_question();
    }

    fn show_next_question(&mut self) {
        let mode = self.counters.mode;
        let question = match self.selector.as_mut() {
            Some(selector) => selector.next(self.store.as_ref(), mode),
            None => None,
        };
        match question {
            Some(question) => {
                self.counters.question_number += 1;
                self.publish(SessionState::AwaitingAnswer {
                    question,
                    question_number: self.counters.question_number,
                    total: self.counters.total,
                    combo: self.counters.combo,
                    session_xp: self.counters.session_xp,
                });
            }
            None => self.complete(),
        }
    }

    fn submit(&mut self, question: Question, answer: String, question_number: usize, total: usize) {
        let mode = self.counters.mode;
        let (correct, quality) = if mode.is_production() {
            parse_self_graded(&answer)
        } else {
            let correct = question.is_correct(&answer);
            (correct, if correct { 4 } else { 1 })
        };

        if correct {
            self.counters.combo += 1;
            self.counters.max_combo = self.counters.max_combo.max(self.counters.combo);
            self.counters.correct_count += 1;
        } else {
            self.counters.combo = 0;
        }
        let combo = self.counters.combo;
        let xp_gained = score(quality, combo, question.is_new, mode).total_xp;
        self.counters.session_xp += xp_gained;
        if !self.counters.touched.contains(&question.item_id) {
            self.counters.touched.push(question.item_id);
        }

        let now = self.clock.now();
        if let Err(e) = self.review_card(&question, quality, now) {
            log::warn!("Failed to review {} {}: {e}", question.kind, question.item_id);
        }

        let item_level_up = match self.leveling.add_xp(
            self.store.as_ref(),
            question.item_id,
            question.kind,
            correct,
            combo,
        ) {
            Ok(result) => result.is_some_and(|r| r.leveled_up),
            Err(e) => {
                log::warn!("Failed to add item XP: {e}");
                false
            }
        };

        let discovered = if correct { self.roll_encounter(now) } else { None };

        self.publish(SessionState::ShowingResult {
            question,
            selected: answer,
            correct,
            quality,
            xp_gained,
            combo,
            question_number,
            total,
            session_xp: self.counters.session_xp,
            discovered,
            item_level_up,
        });
    }

    fn review_card(&self, question: &Question, quality: u8, now: Timestamp) -> Fallible<()> {
        let card = match self.store.get_card(question.kind, question.item_id)? {
            Some(card) => card,
            None => Card::new(question.kind, question.item_id, now),
        };
        let updated = review(&card, quality, now);
        self.store.save_card(&updated)
    }

    fn roll_encounter(&mut self, now: Timestamp) -> Option<Encounter> {
        let scopes = self.encounter_scopes();
        let store = self.store.as_ref();
        match self.encounters.roll_encounter(store, store, &scopes, now) {
            Ok(encounter) => encounter,
            Err(e) => {
                log::warn!("Encounter roll failed: {e}");
                None
            }
        }
    }

    /// The content partitions unlocked for the running mode.
    fn encounter_scopes(&self) -> Vec<EncounterScope> {
        match self.counters.mode.family() {
            ModeFamily::Kanji => unlocked_grades(self.player_level)
                .iter()
                .map(|g| EncounterScope::KanjiGrade(*g))
                .collect(),
            ModeFamily::Kana => vec![EncounterScope::Kana(self.counters.kana_type)],
            ModeFamily::Radical => (1..=max_radical_priority(self.player_level))
                .map(EncounterScope::RadicalPriority)
                .collect(),
        }
    }

    fn complete(&mut self) {
        let now = self.clock.now();
        let stats = SessionStats {
            mode: self.counters.mode,
            cards_studied: self.counters.question_number,
            correct_count: self.counters.correct_count,
            max_combo: self.counters.max_combo,
            xp_earned: self.counters.session_xp,
            duration_secs: now.seconds_since(self.counters.started_at),
            touched_ids: self.counters.touched.clone(),
        };
        self.selector = None;
        self.publish(SessionState::SessionComplete { stats });
    }
}

/// Parses a self-graded answer of the form `<bool>|<quality>`. Anything
/// but `true` counts as wrong; a missing or unreadable quality defaults
/// to 4 when correct and 1 when not.
fn parse_self_graded(answer: &str) -> (bool, u8) {
    let mut parts = answer.split('|');
    let correct = parts.next().map(str::trim) == Some("true");
    let quality = parts
        .next()
        .and_then(|q| q.trim().parse::<i64>().ok())
        .map(|q| q.clamp(0, 5) as u8)
        .unwrap_or(if correct { 4 } else { 1 });
    (correct, quality)
}

fn unavailable_message(mode: GameMode) -> &'static str {
    match mode.family() {
        ModeFamily::Kanji => "No kanji available for study. Add kanji data first.",
        ModeFamily::Kana => "No kana available for study.",
        ModeFamily::Radical => "No radicals available for study.",
    }
}

fn state_name(state: &SessionState) -> &'static str {
    match state {
        SessionState::Idle => "idle",
        SessionState::Preparing { .. } => "preparing",
        SessionState::AwaitingAnswer { .. } => "awaiting answer",
        SessionState::ShowingResult { .. } => "showing result",
        SessionState::SessionComplete { .. } => "complete",
        SessionState::Error { .. } => "error",
    }
}
