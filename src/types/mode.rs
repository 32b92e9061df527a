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

use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use serde::Serialize;

/// How questions in a session are asked and answered.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Pick the reading of a kanji.
    Recognition,
    /// Write a kanji from its meaning and reading.
    Writing,
    KanaRecognition,
    KanaWriting,
    /// Pick the meaning of a radical.
    RadicalRecognition,
    /// Pick the kanji built from a set of radicals.
    RadicalBuilder,
}

/// Which family of item a mode draws from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ModeFamily {
    Kanji,
    Kana,
    Radical,
}

/// The shape of question a mode asks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QuestionStyle {
    Recognition,
    Writing,
    Builder,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Recognition => "recognition",
            GameMode::Writing => "writing",
            GameMode::KanaRecognition => "kana_recognition",
            GameMode::KanaWriting => "kana_writing",
            GameMode::RadicalRecognition => "radical_recognition",
            GameMode::RadicalBuilder => "radical_builder",
        }
    }

    pub fn family(&self) -> ModeFamily {
        match self {
            GameMode::Recognition | GameMode::Writing => ModeFamily::Kanji,
            GameMode::KanaRecognition | GameMode::KanaWriting => ModeFamily::Kana,
            GameMode::RadicalRecognition | GameMode::RadicalBuilder => ModeFamily::Radical,
        }
    }

    pub fn style(&self) -> QuestionStyle {
        match self {
            GameMode::Recognition | GameMode::KanaRecognition | GameMode::RadicalRecognition => {
                QuestionStyle::Recognition
            }
            GameMode::Writing | GameMode::KanaWriting => QuestionStyle::Writing,
            GameMode::RadicalBuilder => QuestionStyle::Builder,
        }
    }

    /// Production modes report their own correctness and quality instead of
    /// picking from a list of choices.
    pub fn is_production(&self) -> bool {
        self.style() == QuestionStyle::Writing
    }
}

impl Display for GameMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
