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

use std::io::stdin;
use std::io::stdout;
use std::path::PathBuf;

use clap::Parser;

use crate::cmd::drill::DrillOptions;
use crate::cmd::drill::run_drill;
use crate::cmd::import::import_catalog;
use crate::cmd::stats::print_collection_stats;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::types::item_kind::ItemId;
use crate::types::item_kind::KanaType;
use crate::types::mode::GameMode;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Import a JSON catalog of kanji, kana, and radicals.
    Import {
        /// Path to the catalog file.
        catalog: String,
        /// Optional path to the collection directory.
        directory: Option<String>,
    },
    /// Study in the terminal.
    Drill {
        /// Optional path to the collection directory.
        directory: Option<String>,
        #[arg(long, default_value_t = GameMode::Recognition)]
        mode: GameMode,
        /// Number of questions. Defaults to the configured question count.
        #[arg(long)]
        count: Option<usize>,
        /// Drill a single item by ID.
        #[arg(long)]
        target: Option<ItemId>,
        /// Syllabary for kana modes.
        #[arg(long, default_value = "hiragana")]
        kana_type: KanaType,
        /// Player level, which decides the unlocked content.
        #[arg(long, default_value_t = 1)]
        level: u32,
    },
    /// Print collection statistics as JSON.
    Stats {
        /// Optional path to the collection directory.
        directory: Option<String>,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Import {
            catalog,
            directory,
        } => {
            let collection = Collection::new(directory)?;
            import_catalog(&collection, &PathBuf::from(catalog))
        }
        Command::Drill {
            directory,
            mode,
            count,
            target,
            kana_type,
            level,
        } => {
            let collection = Collection::new(directory)?;
            let options = DrillOptions {
                mode,
                count,
                target,
                kana_type,
                level,
            };
            run_drill(collection, options, stdin().lock(), stdout().lock())
        }
        Command::Stats { directory } => {
            let collection = Collection::new(directory)?;
            print_collection_stats(&collection)
        }
    }
}
