//! 语音支付会话
//!
//! While a caller is inside the card-collection flow the call id maps to the
//! record being paid. Other voice functions are deflected until the session
//! ends (callback received) or expires.

use dashmap::DashMap;
use shared::models::{PaymentSessionInfo, PaymentTarget};
use shared::util::now_millis;

/// Sessions older than this are dropped
pub const SESSION_TTL_MS: i64 = 30 * 60 * 1000;

#[derive(Debug, Default)]
pub struct PaymentSessions {
    sessions: DashMap<String, PaymentSessionInfo>,
}

impl PaymentSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the session of a call
    pub fn start(&self, call_id: &str, target: PaymentTarget, number: &str) -> PaymentSessionInfo {
        let now = now_millis();
        let info = PaymentSessionInfo {
            call_id: call_id.to_string(),
            target,
            number: number.to_string(),
            step: "collecting_card".to_string(),
            started_at: now,
            updated_at: now,
        };
        self.sessions.insert(call_id.to_string(), info.clone());
        tracing::info!(target: "payment", call_id, number, "Payment session started");
        info
    }

    /// Active (unexpired) session of a call
    pub fn get(&self, call_id: &str) -> Option<PaymentSessionInfo> {
        let now = now_millis();
        let info = self.sessions.get(call_id).map(|s| s.clone())?;
        if now - info.started_at > SESSION_TTL_MS {
            self.sessions.remove(call_id);
            return None;
        }
        Some(info)
    }

    pub fn is_active(&self, call_id: &str) -> bool {
        self.get(call_id).is_some()
    }

    pub fn set_step(&self, call_id: &str, step: &str) {
        if let Some(mut info) = self.sessions.get_mut(call_id) {
            info.step = step.to_string();
            info.updated_at = now_millis();
        }
    }

    /// Callbacks carry the record number, not the call id
    pub fn set_step_for_number(&self, number: &str, step: &str) {
        let now = now_millis();
        for mut info in self.sessions.iter_mut() {
            if info.number == number {
                info.step = step.to_string();
                info.updated_at = now;
            }
        }
    }

    pub fn end(&self, call_id: &str) -> Option<PaymentSessionInfo> {
        self.sessions.remove(call_id).map(|(_, info)| info)
    }

    /// End every session paying for `number`
    pub fn end_for_number(&self, number: &str) -> usize {
        let mut removed = 0;
        self.sessions.retain(|_, info| {
            let keep = info.number != number;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn list(&self) -> Vec<PaymentSessionInfo> {
        let mut all: Vec<_> = self.sessions.iter().map(|s| s.clone()).collect();
        all.sort_by_key(|s| s.started_at);
        all
    }

    /// Drop sessions older than the TTL; returns how many were removed
    pub fn sweep_expired(&self, now: i64) -> usize {
        let mut removed = 0;
        self.sessions.retain(|_, info| {
            let keep = now - info.started_at <= SESSION_TTL_MS;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}
