//! Token lifecycle management with single-flight acquisition
//!
//! The manager owns three pieces of shared state behind one mutex: the
//! current [`TokenSet`], the stored refresh token, and the pending
//! acquisition slot. While an acquisition is outstanding, every caller
//! awaits the *same* shared future instead of issuing a duplicate request —
//! token endpoints may reject or rate-limit parallel acquisitions, so this
//! is the correctness invariant of the whole crate.
//!
//! Acquisition lifecycle: the slot is filled when the first caller needs a
//! token, cloned by every concurrent caller, and cleared on completion.
//! Success installs the new token set (and any refresh token it carried);
//! failure only clears the slot, so the next caller retries fresh while all
//! current waiters observe the same error.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::token::TokenSet;

/// Strategy for obtaining a fresh [`TokenSet`].
///
/// Receives the currently stored refresh token, if an earlier acquisition or
/// seed produced one, so refresh-based strategies can use it as grant input.
pub type TokenFetcher =
    Arc<dyn Fn(Option<String>) -> BoxFuture<'static, Result<TokenSet>> + Send + Sync>;

type Acquisition = Shared<BoxFuture<'static, Result<TokenSet>>>;

#[derive(Default)]
struct State {
    current: Option<TokenSet>,
    pending: Option<Acquisition>,
    refresh_token: Option<String>,
}

/// Produces a valid bearer token for every outgoing request, minimizing
/// redundant acquisitions.
pub struct TokenManager {
    state: Arc<Mutex<State>>,
    fetcher: TokenFetcher,
}

impl TokenManager {
    pub fn new(fetcher: TokenFetcher) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            fetcher,
        }
    }

    /// Return the cached token set, or join/start the single in-flight
    /// acquisition.
    ///
    /// A cache hit returns immediately with no network call. Otherwise all
    /// concurrent callers share one acquisition; its failure is propagated
    /// to every waiter and the next call starts a fresh attempt.
    pub async fn get_token(&self) -> Result<TokenSet> {
        let acquisition = {
            let mut state = self.state.lock().await;
            if let Some(tokens) = &state.current {
                return Ok(tokens.clone());
            }
            match &state.pending {
                Some(pending) => pending.clone(),
                None => {
                    debug!("no cached token, starting acquisition");
                    let acquisition = self.start_acquisition(state.refresh_token.clone());
                    state.pending = Some(acquisition.clone());
                    acquisition
                }
            }
        };
        acquisition.await
    }

    /// Seed the cache with an externally obtained token set, bypassing
    /// acquisition. A refresh token in the argument overwrites the stored one.
    pub async fn set_token(&self, tokens: TokenSet) {
        let mut state = self.state.lock().await;
        if tokens.refresh_token.is_some() {
            state.refresh_token = tokens.refresh_token.clone();
        }
        state.current = Some(tokens);
    }

    /// Clear the cached token set, forcing the next [`get_token`] to acquire
    /// anew. The stored refresh token is kept as input for that acquisition.
    ///
    /// [`get_token`]: TokenManager::get_token
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.current = None;
        debug!("cached token invalidated");
    }

    fn start_acquisition(&self, refresh_token: Option<String>) -> Acquisition {
        let fetcher = Arc::clone(&self.fetcher);
        let state = Arc::clone(&self.state);
        async move {
            let outcome = (fetcher)(refresh_token).await;
            let mut state = state.lock().await;
            state.pending = None;
            match outcome {
                Ok(tokens) => {
                    if tokens.refresh_token.is_some() {
                        state.refresh_token = tokens.refresh_token.clone();
                    }
                    state.current = Some(tokens.clone());
                    debug!("token acquisition succeeded");
                    Ok(tokens)
                }
                Err(e) => {
                    warn!(error = %e, "token acquisition failed");
                    Err(e)
                }
            }
        }
        .boxed()
        .shared()
    }
}
