use std::sync::Arc;

use futures::future::{BoxFuture, Shared};

use crate::domain::error::ExerciseError;
use crate::domain::exercise::ExerciseRecord;

pub(crate) type LoadOutcome = Result<Arc<ExerciseRecord>, ExerciseError>;

/// Load future shared by every request that arrives while it runs.
pub(crate) type PendingLoad = Shared<BoxFuture<'static, LoadOutcome>>;

/// State of one (package, exercise) key. A key with no slot has never been
/// loaded, or its last load failed.
pub(crate) enum Slot {
    /// A load is running. `stale` is set when the key was invalidated while
    /// loading; the result still reaches its waiters but is not stored.
    Loading { pending: PendingLoad, stale: bool },
    Ready(Arc<ExerciseRecord>),
}

impl Slot {
    pub(crate) fn loading(pending: PendingLoad) -> Self {
        Slot::Loading {
            pending,
            stale: false,
        }
    }

    pub(crate) fn is_loading(&self, pending: &PendingLoad) -> bool {
        matches!(self, Slot::Loading { pending: current, .. } if current.ptr_eq(pending))
    }

    /// Drop-or-mark step of invalidation. Returns `false` when the slot must
    /// be removed; sets `changed` when anything was invalidated.
    pub(crate) fn keep_after_invalidate(&mut self, changed: &mut bool) -> bool {
        match self {
            Slot::Ready(_) => {
                *changed = true;
                false
            }
            Slot::Loading { stale, .. } => {
                *changed |= !std::mem::replace(stale, true);
                true
            }
        }
    }
}
