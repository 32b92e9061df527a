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

pub mod cli;
pub mod clock;
mod cmd;
pub mod collection;
pub mod config;
pub mod db;
pub mod encounter;
pub mod error;
#[cfg(test)]
mod helper;
pub mod leveling;
pub mod memory;
pub mod progression;
pub mod rarity;
pub mod repo;
pub mod scoring;
pub mod select;
pub mod session;
pub mod srs;
pub mod types;
