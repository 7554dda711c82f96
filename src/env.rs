//! Receiver environments.
//!
//! An environment is the context a receiver hands to the sender it gets connected to. The only
//! query defined here is the stop token; senders use it to find out whether, and when, they are
//! asked to stop, and through [`QuerySignatures`](crate::signatures::QuerySignatures) whether they
//! can be stopped at all.

use crate::stop::{InplaceStopToken, NeverStopToken, StopToken};

/// Context exposed by a receiver.
pub trait Env: Clone + Send + Sync + 'static {
    type StopToken: StopToken;

    fn stop_token(&self) -> Self::StopToken;
}

/// The environment with no queries satisfied; its stop token is never stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyEnv;

impl Env for EmptyEnv {
    type StopToken = NeverStopToken;

    fn stop_token(&self) -> NeverStopToken {
        NeverStopToken
    }
}

/// An environment carrying an [`InplaceStopToken`].
///
/// Race combinators hand one of these to each child, carrying a token derived from their own
/// stop source.
#[derive(Debug, Clone)]
pub struct StopEnv {
    token: InplaceStopToken,
}

impl StopEnv {
    pub fn new(token: InplaceStopToken) -> Self {
        Self { token }
    }
}

impl Env for StopEnv {
    type StopToken = InplaceStopToken;

    fn stop_token(&self) -> InplaceStopToken {
        self.token.clone()
    }
}

/// The stop token type of receiver `R`'s environment.
pub type StopTokenOf<R> = <<R as crate::Receiver>::Env as Env>::StopToken;
