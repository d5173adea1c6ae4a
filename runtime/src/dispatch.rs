//! The external entry point into a store's action timeline.

use crate::error::StoreError;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

type SendFn<A> = dyn Fn(A) -> Result<(), StoreError> + Send + Sync;

/// Cloneable, non-blocking handle that feeds actions to a store.
///
/// Actions dispatched through one handle are reduced in call order. The
/// store completes once every `Dispatcher` (including mapped ones) is
/// dropped and no effect stream is still running.
pub struct Dispatcher<A> {
    send: Arc<SendFn<A>>,
}

impl<A: Send + 'static> Dispatcher<A> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<A>) -> Self {
        Self {
            send: Arc::new(move |action| tx.send(action).map_err(|_| StoreError::Terminated)),
        }
    }

    /// Queue an action on the store's timeline.
    ///
    /// Returns immediately. The reduction happens later on the store's
    /// scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Terminated`] if the reduction loop has ended.
    pub fn dispatch(&self, action: A) -> Result<(), StoreError> {
        (self.send)(action)
    }

    /// A dispatcher for an outer action type, converted with `f` on dispatch.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // Views only know about user actions
    /// let user_actions: Dispatcher<UserAction> = store.dispatcher().map_action(Action::User);
    /// user_actions.dispatch(UserAction::Increment)?;
    /// ```
    #[must_use]
    pub fn map_action<B, F>(&self, f: F) -> Dispatcher<B>
    where
        F: Fn(B) -> A + Send + Sync + 'static,
        B: Send + 'static,
    {
        let inner = Arc::clone(&self.send);
        Dispatcher {
            send: Arc::new(move |action| inner(f(action))),
        }
    }
}

impl<A> Clone for Dispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            send: Arc::clone(&self.send),
        }
    }
}

impl<A> fmt::Debug for Dispatcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}
