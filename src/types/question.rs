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

use crate::types::card::CardState;
use crate::types::item_kind::ItemId;
use crate::types::item_kind::ItemKind;

/// One asked item. Questions are never persisted.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// The item whose card is reviewed when this question is answered.
    pub kind: ItemKind,
    pub item_id: ItemId,
    /// What is shown: a glyph, or a `+`-joined list of radicals.
    pub literal: String,
    pub correct_answer: String,
    /// Empty for writing questions.
    pub choices: Vec<String>,
    pub prompt: String,
    pub is_new: bool,
    pub card_state: CardState,
    pub stroke_paths: Vec<String>,
    /// Breakdown lines such as `木 = tree (き)`.
    pub breakdown: Vec<String>,
    pub radical_name_jp: Option<String>,
    pub grade: Option<u8>,
    pub frequency: Option<u32>,
    pub stroke_count: u32,
}

impl Question {
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }
}
