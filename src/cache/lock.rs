use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::logging::{LogComponent, LogStage};
use crate::lwarn;

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            lwarn!(
                "system",
                LogStage::Cache,
                LogComponent::Cache,
                op,
                "Recovered from poisoned cache lock",
                target_module = target,
                lock_kind = "rwlock.read",
                result = "poisoned_recovered"
            );
            poisoned.into_inner()
        }
    }
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            lwarn!(
                "system",
                LogStage::Cache,
                LogComponent::Cache,
                op,
                "Recovered from poisoned cache lock",
                target_module = target,
                lock_kind = "rwlock.write",
                result = "poisoned_recovered"
            );
            poisoned.into_inner()
        }
    }
}
