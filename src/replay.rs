// src/replay.rs
//
// JSON-lines replay of recorded landmark streams through the engine.
//
//   {"op":"frame","session_id":"a","hand":{"landmarks":[[x,y,z],...],"handedness":"Left"}}
//   {"op":"frame","session_id":"a","hand":null}
//   {"op":"reset","session_id":"a"}

use crate::pipeline::MudraEngine;
use crate::types::{FrameResult, FsmState, Handedness, Landmark};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Hand as submitted by a client. Validated by the engine, not here, so a
/// wrong point count is still replayed as a (malformed) hand frame.
#[derive(Debug, Clone, Deserialize)]
pub struct WireHand {
    pub landmarks: Vec<Landmark>,
    #[serde(default)]
    pub handedness: Handedness,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReplayRecord {
    Frame {
        #[serde(default)]
        session_id: Option<String>,
        #[serde(default)]
        hand: Option<WireHand>,
        #[serde(default)]
        include_landmarks: bool,
    },
    Reset {
        #[serde(default)]
        session_id: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReplayOutput {
    Frame(FrameResult),
    Reset {
        session_id: String,
        fsm_state: FsmState,
    },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub frames: u64,
    pub resets: u64,
    pub skipped: u64,
}

pub fn find_replay_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        anyhow::bail!("Replay input {} does not exist", input.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "jsonl"))
        .collect();
    files.sort();

    info!("Found {} replay file(s)", files.len());
    Ok(files)
}

/// Push every record through `engine`, writing one JSON result per line.
/// Unparseable lines are logged and skipped.
pub fn replay<R: BufRead, W: Write>(
    engine: &MudraEngine,
    reader: R,
    out: &mut W,
    force_landmarks: bool,
) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", idx + 1))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: ReplayRecord = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                warn!("⚠️  Skipping line {}: {}", idx + 1, e);
                stats.skipped += 1;
                continue;
            }
        };

        let output = apply(engine, record, force_landmarks);
        match &output {
            ReplayOutput::Frame(_) => stats.frames += 1,
            ReplayOutput::Reset { .. } => stats.resets += 1,
        }
        serde_json::to_writer(&mut *out, &output).context("Failed to write result")?;
        writeln!(out)?;
    }

    Ok(stats)
}

pub fn apply(engine: &MudraEngine, record: ReplayRecord, force_landmarks: bool) -> ReplayOutput {
    match record {
        ReplayRecord::Frame {
            session_id,
            hand,
            include_landmarks,
        } => {
            let id = session_id.as_deref();
            let include = include_landmarks || force_landmarks;
            let result = match hand {
                Some(hand) => {
                    engine.process_landmarks(id, &hand.landmarks, hand.handedness, include)
                }
                None => engine.process_frame(id, None),
            };
            ReplayOutput::Frame(result)
        }
        ReplayRecord::Reset { session_id } => {
            let fsm_state = engine.reset_session(session_id.as_deref());
            ReplayOutput::Reset {
                session_id: session_id.unwrap_or_else(|| engine.default_session_id().to_string()),
                fsm_state,
            }
        }
    }
}
