// Scripted judge replies
//
// A script is a JSON file listing canned replies per endpoint. Replies are
// served in order and wrap around, so a one-entry list answers every request
// the same way.
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedReply {
    #[serde(default = "default_status")]
    pub status: u16,

    /// Hold the reply this long, to exercise in-flight states and timeouts.
    #[serde(default)]
    pub delay_ms: u64,

    pub body: Value,
}

fn default_status() -> u16 {
    200
}

impl ScriptedReply {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            delay_ms: 0,
            body,
        }
    }

    pub fn delay(&self) -> Option<Duration> {
        (self.delay_ms > 0).then(|| Duration::from_millis(self.delay_ms))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ScriptFile {
    #[serde(default)]
    run: Vec<ScriptedReply>,
    #[serde(default)]
    submit: Vec<ScriptedReply>,
}

/// Round-robin reply queue for one endpoint.
#[derive(Debug)]
pub struct ReplyQueue {
    replies: Vec<ScriptedReply>,
    next: AtomicUsize,
}

impl ReplyQueue {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies,
            next: AtomicUsize::new(0),
        }
    }

    pub fn next_reply(&self) -> Option<ScriptedReply> {
        if self.replies.is_empty() {
            return None;
        }
        let idx = self.next.fetch_add(1, Ordering::SeqCst) % self.replies.len();
        self.replies.get(idx).cloned()
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }
}

#[derive(Debug)]
pub struct JudgeScript {
    pub run: ReplyQueue,
    pub submit: ReplyQueue,
}

impl JudgeScript {
    /// Every run and submit is accepted.
    pub fn accepting() -> Self {
        Self {
            run: ReplyQueue::new(vec![ScriptedReply::ok(json!({
                "success": true,
                "verdict": "Accepted",
                "testCasesPassed": 2,
                "totalTestCases": 2,
                "results": [
                    { "input": "1 2", "expectedOutput": "3", "actualOutput": "3", "passed": true },
                    { "input": "5 7", "expectedOutput": "12", "actualOutput": "12", "passed": true }
                ]
            }))]),
            submit: ReplyQueue::new(vec![ScriptedReply::ok(json!({
                "success": true,
                "verdict": "Accepted",
                "results": [
                    { "input": "1 2", "expectedOutput": "3", "actualOutput": "3", "passed": true },
                    { "passed": true, "isHidden": true }
                ],
                "coinsEarned": 10,
                "totalCoins": 10,
                "isFirstSolve": true
            }))]),
        }
    }

    /// Load a script file. Endpoints the file leaves empty keep the
    /// accepting defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Judge script not found: {}", path.display());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read judge script {}", path.display()))?;
        let file: ScriptFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse judge script {}", path.display()))?;

        for reply in file.run.iter().chain(file.submit.iter()) {
            if !(100..=599).contains(&reply.status) {
                bail!("Invalid HTTP status in judge script: {}", reply.status);
            }
        }

        let defaults = Self::accepting();
        Ok(Self {
            run: if file.run.is_empty() { defaults.run } else { ReplyQueue::new(file.run) },
            submit: if file.submit.is_empty() { defaults.submit } else { ReplyQueue::new(file.submit) },
        })
    }
}
