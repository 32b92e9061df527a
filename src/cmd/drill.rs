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

//! A study session on standard input and output.

use std::io::BufRead;
use std::io::Write;
use std::sync::Arc;

use crate::clock::SystemClock;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::error::fail;
use crate::session::SessionEngine;
use crate::session::SessionEvent;
use crate::session::SessionState;
use crate::types::item_kind::ItemId;
use crate::types::item_kind::KanaType;
use crate::types::mode::GameMode;
use crate::types::question::Question;

pub struct DrillOptions {
    pub mode: GameMode,
    pub count: Option<usize>,
    pub target: Option<ItemId>,
    pub kana_type: KanaType,
    pub level: u32,
}

/// Runs one session to completion. Typing `q`, or closing the input,
/// ends the session early. Pity counters are loaded from and saved to the
/// collection's database.
pub fn run_drill<R: BufRead, W: Write>(
    collection: Collection,
    options: DrillOptions,
    mut input: R,
    mut output: W,
) -> Fallible<()> {
    let Collection { config, db, .. } = collection;
    let pity = db.load_pity()?;
    let db = Arc::new(db);
    let mut engine = SessionEngine::new(db.clone(), Arc::new(SystemClock), &config);
    engine.set_player_level(options.level);
    engine.restore_pity(pity);
    let mut states = engine.subscribe();

    engine.dispatch(SessionEvent::StartSession {
        mode: options.mode,
        count: options.count.unwrap_or(config.session.question_count),
        target: options.target,
        kana_type: Some(options.kana_type),
    });
    loop {
        let state = states.borrow_and_update().clone();
        match state {
            SessionState::AwaitingAnswer {
                question,
                question_number,
                total,
                combo,
                ..
            } => {
                writeln!(output, "[{question_number}/{total}] combo {combo}")?;
                writeln!(output, "{}", question.literal)?;
                writeln!(output, "{}", question.prompt)?;
                let answer = if options.mode.is_production() {
                    self_grade(&question, &mut input, &mut output)?
                } else {
                    pick_choice(&question, &mut input, &mut output)?
                };
                match answer {
                    Some(answer) => engine.dispatch(SessionEvent::SubmitAnswer(answer)),
                    None => engine.dispatch(SessionEvent::EndSession),
                }
            }
            SessionState::ShowingResult {
                question,
                correct,
                xp_gained,
                discovered,
                item_level_up,
                ..
            } => {
                if correct {
                    writeln!(output, "Correct! +{xp_gained} XP")?;
                } else {
                    writeln!(output, "Wrong. The answer is {}.", question.correct_answer)?;
                }
                for line in &question.breakdown {
                    writeln!(output, "  {line}")?;
                }
                if item_level_up {
                    writeln!(output, "{} leveled up!", question.literal)?;
                }
                if let Some(encounter) = discovered {
                    writeln!(
                        output,
                        "Discovered {} ({})!",
                        encounter.literal, encounter.item.rarity
                    )?;
                }
                engine.dispatch(SessionEvent::NextQuestion);
            }
            SessionState::SessionComplete { stats } => {
                writeln!(
                    output,
                    "Session complete: {}/{} correct, max combo {}, {} XP in {}s.",
                    stats.correct_count,
                    stats.cards_studied,
                    stats.max_combo,
                    stats.xp_earned,
                    stats.duration_secs
                )?;
                break;
            }
            SessionState::Error { message } => {
                return fail(message);
            }
            SessionState::Idle | SessionState::Preparing { .. } => {
                return fail("session did not start.");
            }
        }
    }
    db.save_pity(&engine.pity())?;
    Ok(())
}

/// Reads a trimmed line. `None` on end of input or `q`.
fn read_line<R: BufRead>(input: &mut R) -> Fallible<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let line = line.trim().to_string();
    if line == "q" {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Accepts either a choice number or the answer itself.
fn pick_choice<R: BufRead, W: Write>(
    question: &Question,
    input: &mut R,
    output: &mut W,
) -> Fallible<Option<String>> {
    for (i, choice) in question.choices.iter().enumerate() {
        writeln!(output, "  {}. {choice}", i + 1)?;
    }
    loop {
        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        if line.is_empty() {
            continue;
        }
        let answer = match line.parse::<usize>() {
            Ok(n) if (1..=question.choices.len()).contains(&n) => question.choices[n - 1].clone(),
            _ => line,
        };
        return Ok(Some(answer));
    }
}

/// Reveals the answer and asks for a quality from 0 to 5. Three or more
/// counts as correct.
fn self_grade<R: BufRead, W: Write>(
    question: &Question,
    input: &mut R,
    output: &mut W,
) -> Fallible<Option<String>> {
    writeln!(output, "[press enter to reveal]")?;
    if read_line(input)?.is_none() {
        return Ok(None);
    }
    writeln!(output, "Answer: {}", question.correct_answer)?;
    loop {
        writeln!(output, "Grade: (0 = blank, 3 = hard, 4 = good, 5 = perfect)")?;
        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        match line.parse::<u8>() {
            Ok(quality) if quality <= 5 => {
                return Ok(Some(format!("{}|{quality}", quality >= 3)));
            }
            _ => writeln!(output, "Invalid input. Please enter a number between 0 and 5.")?,
        }
    }
}
