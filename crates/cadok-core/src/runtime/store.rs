// crates/cadok-core/src/runtime/store.rs
// ============================================================================
// Module: CADOK In-Memory Mapping Store
// Description: Mutex-guarded in-memory MappingStore.
// Purpose: Provide a store for tests and development without durability.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! A [`MappingStore`] backed by a mutex-guarded map. All operations run under
//! a single lock, which trivially provides the atomicity the interface
//! requires. Not durable; production deployments use the SQLite store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::MappingStatus;
use crate::core::RedirectionCode;
use crate::core::RedirectionMapping;
use crate::core::TerminalStatus;
use crate::core::Timestamp;
use crate::core::TradeId;
use crate::interfaces::InsertOutcome;
use crate::interfaces::MappingStore;
use crate::interfaces::StoreError;
use crate::interfaces::TransitionOutcome;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory mapping store for tests and development.
#[derive(Debug, Default)]
pub struct InMemoryMappingStore {
    /// Mappings keyed by normalized code string.
    inner: Mutex<HashMap<String, RedirectionMapping>>,
}

impl InMemoryMappingStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the store lock, failing closed on poisoning.
    fn guard(&self) -> Result<MutexGuard<'_, HashMap<String, RedirectionMapping>>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Io("mapping store lock poisoned".to_string()))
    }
}

impl MappingStore for InMemoryMappingStore {
    fn insert_active(&self, mapping: &RedirectionMapping) -> Result<InsertOutcome, StoreError> {
        if mapping.status != MappingStatus::Active {
            return Err(StoreError::Invalid("insert requires an active mapping".to_string()));
        }
        let mut inner = self.guard()?;
        if inner.contains_key(mapping.code.as_str()) {
            return Ok(InsertOutcome::CodeExists);
        }
        let existing_active = inner
            .values()
            .find(|m| m.trade_id == mapping.trade_id && m.status == MappingStatus::Active)
            .cloned();
        if let Some(winner) = existing_active {
            return Ok(InsertOutcome::ActiveExists(winner));
        }
        inner.insert(mapping.code.as_str().to_string(), mapping.clone());
        Ok(InsertOutcome::Inserted)
    }

    fn get(&self, code: &RedirectionCode) -> Result<Option<RedirectionMapping>, StoreError> {
        Ok(self.guard()?.get(code.as_str()).cloned())
    }

    fn find_active_by_trade(
        &self,
        trade_id: &TradeId,
    ) -> Result<Option<RedirectionMapping>, StoreError> {
        Ok(self
            .guard()?
            .values()
            .find(|m| &m.trade_id == trade_id && m.status == MappingStatus::Active)
            .cloned())
    }

    fn transition(
        &self,
        code: &RedirectionCode,
        to: TerminalStatus,
        at: Timestamp,
    ) -> Result<TransitionOutcome, StoreError> {
        let mut inner = self.guard()?;
        let Some(mapping) = inner.get_mut(code.as_str()) else {
            return Ok(TransitionOutcome::NotFound);
        };
        if mapping.status.is_terminal() {
            return Ok(TransitionOutcome::AlreadyTerminal(mapping.status));
        }
        mapping.status = to.as_status();
        if to == TerminalStatus::Consumed {
            mapping.consumed_at = Some(at);
        }
        Ok(TransitionOutcome::Applied)
    }

    fn sweep_expired(&self, now: Timestamp) -> Result<u64, StoreError> {
        let mut inner = self.guard()?;
        let mut swept = 0_u64;
        for mapping in inner.values_mut() {
            if mapping.is_expired_at(now) {
                mapping.status = MappingStatus::Expired;
                swept += 1;
            }
        }
        Ok(swept)
    }
}
