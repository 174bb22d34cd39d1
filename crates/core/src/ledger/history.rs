//! Ordered, lazily paged history queries.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use tellr_shared::types::{AccountId, UserId};

use super::store::Ledger;
use super::types::{DateRange, EntryCursor, EntryQuery, LedgerEntry};
use crate::account::AccountStore;
use crate::error::StoreError;

/// Default number of entries fetched per storage round-trip.
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// A finite stream of entries in ledger order.
pub type EntryStream = BoxStream<'static, Result<LedgerEntry, StoreError>>;

/// Answers history questions by account set or by customer.
///
/// Streams are lazy and read the ledger page by page. Each call starts a fresh
/// read, so calling again observes entries appended in the meantime.
#[derive(Clone)]
pub struct HistoryService {
    ledger: Arc<dyn Ledger>,
    accounts: Arc<dyn AccountStore>,
    page_size: usize,
}

struct PageState {
    query: EntryQuery,
    after: Option<EntryCursor>,
    buffer: VecDeque<LedgerEntry>,
    exhausted: bool,
}

impl HistoryService {
    /// Creates a new service.
    #[must_use]
    pub fn new(ledger: Arc<dyn Ledger>, accounts: Arc<dyn AccountStore>) -> Self {
        Self {
            ledger,
            accounts,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Overrides the page size (minimum 1).
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Streams entries of `accounts` within `range`, ordered by business date,
    /// then append time, then entry ID.
    pub fn by_accounts(
        &self,
        accounts: impl IntoIterator<Item = AccountId>,
        range: DateRange,
    ) -> EntryStream {
        let query = EntryQuery::new(accounts, range);
        if query.accounts.is_empty() {
            return stream::empty().boxed();
        }

        let ledger = Arc::clone(&self.ledger);
        let page_size = self.page_size;
        let initial = PageState {
            query,
            after: None,
            buffer: VecDeque::new(),
            exhausted: false,
        };

        stream::try_unfold(initial, move |mut state| {
            let ledger = Arc::clone(&ledger);
            async move {
                loop {
                    if let Some(entry) = state.buffer.pop_front() {
                        return Ok(Some((entry, state)));
                    }
                    if state.exhausted {
                        return Ok(None);
                    }
                    let page = ledger.page(&state.query, state.after, page_size).await?;
                    state.exhausted = page.len() < page_size;
                    if let Some(last) = page.last() {
                        state.after = Some(last.cursor());
                    }
                    state.buffer.extend(page);
                }
            }
        })
        .boxed()
    }

    /// Resolves the customer's account set.
    pub async fn user_accounts(&self, user: UserId) -> Result<Vec<AccountId>, StoreError> {
        Ok(self
            .accounts
            .accounts_for_owner(user)
            .await?
            .into_iter()
            .map(|account| account.id)
            .collect())
    }

    /// Streams every entry on the customer's accounts within `range`.
    ///
    /// The account set is resolved once, when this is called.
    pub async fn by_user(&self, user: UserId, range: DateRange) -> Result<EntryStream, StoreError> {
        let accounts = self.user_accounts(user).await?;
        tracing::debug!(user_id = %user, accounts = accounts.len(), "Resolved account set");
        Ok(self.by_accounts(accounts, range))
    }
}
