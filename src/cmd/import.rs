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

use std::fs::read_to_string;
use std::path::Path;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::catalog::CatalogData;

/// Loads a catalog file into the collection's database. Items already
/// present are replaced; cards and collected items are kept.
pub fn import_catalog(collection: &Collection, path: &Path) -> Fallible<()> {
    if !path.exists() {
        return fail("catalog file does not exist.");
    }
    let content = read_to_string(path)?;
    let data = CatalogData::from_json(&content)?;
    collection.db.import_catalog(&data)?;
    println!(
        "Imported {} kanji, {} kana, {} radicals, and {} links.",
        data.kanji.len(),
        data.kana.len(),
        data.radicals.len(),
        data.links.len()
    );
    Ok(())
}
