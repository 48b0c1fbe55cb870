//! Per-call function history (diagnostics only)

use dashmap::DashMap;
use serde::Serialize;

/// Idle conversations are dropped after two hours
pub const CONVERSATION_TTL_MS: i64 = 2 * 60 * 60 * 1000;

/// Keep the tail of long calls
const MAX_CALLS_PER_SESSION: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct FunctionCall {
    pub function: String,
    pub at: i64,
    pub ok: bool,
}

#[derive(Debug, Default)]
struct Conversation {
    calls: Vec<FunctionCall>,
    last_seen: i64,
}

/// 按 ai_session_id 记录函数调用
#[derive(Debug, Default)]
pub struct ConversationMemory {
    sessions: DashMap<String, Conversation>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, session_id: &str, function: &str, ok: bool, now: i64) {
        let mut entry = self.sessions.entry(session_id.to_string()).or_default();
        entry.calls.push(FunctionCall {
            function: function.to_string(),
            at: now,
            ok,
        });
        if entry.calls.len() > MAX_CALLS_PER_SESSION {
            let overflow = entry.calls.len() - MAX_CALLS_PER_SESSION;
            entry.calls.drain(..overflow);
        }
        entry.last_seen = now;
    }

    pub fn calls(&self, session_id: &str) -> Vec<FunctionCall> {
        self.sessions
            .get(session_id)
            .map(|c| c.calls.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn sweep_expired(&self, now: i64) -> usize {
        let mut removed = 0;
        self.sessions.retain(|_, c| {
            let keep = now - c.last_seen < CONVERSATION_TTL_MS;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}
