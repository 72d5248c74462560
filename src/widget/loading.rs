//! Per-instance engine loading.
//!
//! A bind that has to fetch the engine library hands back a [`PendingLoad`]
//! future tagged with a fresh [`LoadToken`]. The widget keeps the abort
//! handle; unbinding aborts the future and a completion whose token no
//! longer matches the widget's current load is ignored.

use crate::{MapError, Result};
use futures::{
    future::{AbortHandle, Abortable, Aborted, LocalBoxFuture},
    Future,
};
use std::{
    fmt,
    pin::Pin,
    sync::atomic::{AtomicU64, Ordering},
    task::{Context, Poll},
};

static NEXT_WIDGET_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_LOAD_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Process-unique widget instance id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(u64);

impl WidgetId {
    pub fn next() -> Self {
        Self(NEXT_WIDGET_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one load attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadToken(u64);

impl LoadToken {
    pub(crate) fn next() -> Self {
        Self(NEXT_LOAD_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

/// Outcome of a finished [`PendingLoad`], to be passed to
/// [`crate::MapWidget::complete_load`]
#[derive(Debug)]
pub struct LoadCompletion {
    pub token: LoadToken,
    pub result: Result<()>,
}

/// Engine library fetch in flight
pub struct PendingLoad<'a> {
    token: LoadToken,
    inner: Abortable<LocalBoxFuture<'a, Result<()>>>,
}

impl<'a> PendingLoad<'a> {
    pub(crate) fn new(token: LoadToken, load: LocalBoxFuture<'a, Result<()>>) -> (Self, AbortHandle) {
        let (handle, registration) = AbortHandle::new_pair();
        let pending = Self {
            token,
            inner: Abortable::new(load, registration),
        };
        (pending, handle)
    }

    pub fn token(&self) -> LoadToken {
        self.token
    }
}

impl fmt::Debug for PendingLoad<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingLoad")
            .field("token", &self.token)
            .field("aborted", &self.inner.is_aborted())
            .finish()
    }
}

impl Future for PendingLoad<'_> {
    type Output = LoadCompletion;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let token = self.token;
        Pin::new(&mut self.inner).poll(cx).map(|outcome| LoadCompletion {
            token,
            result: match outcome {
                Ok(result) => result,
                Err(Aborted) => Err(MapError::LoadCancelled),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{executor::block_on, FutureExt};

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(WidgetId::next(), WidgetId::next());
        assert_ne!(LoadToken::next(), LoadToken::next());
    }

    #[test]
    fn test_completion_carries_token() {
        let token = LoadToken::next();
        let (pending, _handle) = PendingLoad::new(token, async { Ok(()) }.boxed_local());
        let completion = block_on(pending);
        assert_eq!(completion.token, token);
        assert!(completion.result.is_ok());
    }

    #[test]
    fn test_abort_yields_cancelled() {
        let (pending, handle) =
            PendingLoad::new(LoadToken::next(), futures::future::pending().boxed_local());
        handle.abort();
        let completion = block_on(pending);
        assert!(matches!(completion.result, Err(MapError::LoadCancelled)));
    }
}
