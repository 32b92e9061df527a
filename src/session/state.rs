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

use crate::encounter::Encounter;
use crate::types::item_kind::ItemId;
use crate::types::item_kind::KanaType;
use crate::types::mode::GameMode;
use crate::types::question::Question;

/// Everything an observer needs to render a session.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    Preparing {
        mode: GameMode,
    },
    #[serde(rename_all = "camelCase")]
    AwaitingAnswer {
        question: Question,
        /// 1-based.
        question_number: usize,
        total: usize,
        combo: u32,
        session_xp: u32,
    },
    #[serde(rename_all = "camelCase")]
    ShowingResult {
        question: Question,
        selected: String,
        correct: bool,
        quality: u8,
        xp_gained: u32,
        combo: u32,
        question_number: usize,
        total: usize,
        session_xp: u32,
        discovered: Option<Encounter>,
        item_level_up: bool,
    },
    SessionComplete {
        stats: SessionStats,
    },
    Error {
        message: String,
    },
}

impl SessionState {
    /// Whether a session is underway.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionState::Preparing { .. }
                | SessionState::AwaitingAnswer { .. }
                | SessionState::ShowingResult { .. }
        )
    }
}

pub enum SessionEvent {
    StartSession {
        mode: GameMode,
        count: usize,
        /// Drill a single item instead of building a queue.
        target: Option<ItemId>,
        /// Kana modes only. Defaults to hiragana.
        kana_type: Option<KanaType>,
    },
    SubmitAnswer(String),
    NextQuestion,
    EndSession,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub mode: GameMode,
    /// Questions shown, answered or not.
    pub cards_studied: usize,
    pub correct_count: usize,
    pub max_combo: u32,
    pub xp_earned: u32,
    pub duration_secs: u64,
    pub touched_ids: Vec<ItemId>,
}
