//! The wallet session collaborator and scoped event subscriptions.

use std::fmt;
use std::rc::Rc;

use quorum_core::address::Address;
use quorum_core::chain::ChainId;

/// A change of the wallet session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The connected account changed, or the wallet was disconnected
    AccountChanged(Option<Address>),
    /// The wallet switched to another chain
    ChainChanged(ChainId),
}

/// Identifies a listener registered with a [`Session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// A callback invoked on session changes
pub type SessionListener = Box<dyn Fn(SessionEvent)>;

/// The wallet session: connection state, account and chain. Read at the
/// start of every load cycle.
pub trait Session {
    /// Check if a wallet is connected
    fn is_connected(&self) -> bool;

    /// The connected account, if any
    fn account(&self) -> Option<Address>;

    /// The chain the wallet is connected to, if any
    fn current_chain_id(&self) -> Option<ChainId>;

    /// Register a listener for account and chain changes
    fn subscribe(&self, listener: SessionListener) -> ListenerId;

    /// Remove a listener. Unknown ids are ignored.
    fn unsubscribe(&self, id: ListenerId);
}

/// A registered session listener, removed when the subscription is
/// dropped.
#[must_use = "dropping a subscription unsubscribes its listener"]
pub struct Subscription<S: Session + ?Sized> {
    session: Rc<S>,
    id: ListenerId,
}

impl<S: Session + ?Sized> Subscription<S> {
    /// Register `listener` with `session`
    pub fn new(session: Rc<S>, listener: SessionListener) -> Self {
        let id = session.subscribe(listener);
        tracing::debug!(%id, "Subscribed to session events");
        Self { session, id }
    }

    /// The id of the registered listener
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl<S: Session + ?Sized> Drop for Subscription<S> {
    fn drop(&mut self) {
        tracing::debug!(id = %self.id, "Unsubscribing from session events");
        self.session.unsubscribe(self.id);
    }
}

impl<S: Session + ?Sized> fmt::Debug for Subscription<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
