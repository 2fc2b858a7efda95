use parking_lot::RwLock;
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

/// Inference calls spent by one session. Only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionQuota {
    calls_used: u32,
}

impl SessionQuota {
    pub fn new(calls_used: u32) -> Self {
        Self { calls_used }
    }

    pub fn calls_used(self) -> u32 {
        self.calls_used
    }

    pub fn calls_left(self, max_calls: u32) -> u32 {
        max_calls.saturating_sub(self.calls_used)
    }

    pub fn is_exhausted(self, max_calls: u32) -> bool {
        self.calls_used >= max_calls
    }

    /// The counter after one more call attempt.
    #[must_use]
    pub fn consume(self) -> Self {
        Self { calls_used: self.calls_used.saturating_add(1) }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub calls_used: u32,
    pub calls_left: u32,
    pub max_calls: u32,
}

impl SessionStatus {
    pub fn new(session_id: Uuid, quota: SessionQuota, max_calls: u32) -> Self {
        Self {
            session_id,
            calls_used: quota.calls_used(),
            calls_left: quota.calls_left(max_calls),
            max_calls,
        }
    }
}

/// Quota counters keyed by session id. Lives as long as the process.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionQuota>>>,
}

impl SessionStore {
    /// Runs one admission step against the caller's counter under a single
    /// write lock. A missing or unknown id gets a fresh one. The counter is
    /// written back only when `step` succeeds, so refused submissions leave
    /// no entry behind.
    pub fn transact<T, E>(
        &self,
        id: Option<Uuid>,
        step: impl FnOnce(SessionQuota) -> Result<(SessionQuota, T), E>,
    ) -> (Uuid, SessionQuota, Result<T, E>) {
        let mut guard = self.inner.write();
        let (session_id, quota) = match id.and_then(|id| guard.get(&id).map(|q| (id, *q))) {
            Some(known) => known,
            None => (Uuid::new_v4(), SessionQuota::default()),
        };
        match step(quota) {
            Ok((next, value)) => {
                guard.insert(session_id, next);
                (session_id, next, Ok(value))
            }
            Err(e) => (session_id, quota, Err(e)),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<SessionQuota> {
        self.inner.read().get(&id).copied()
    }
}

#[cfg(test)]
impl SessionStore {
    pub fn store(&self, id: Uuid, quota: SessionQuota) {
        self.inner.write().insert(id, quota);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }
}
