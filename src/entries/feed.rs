//! Paginated entry history
//!
//! Offset-based paging over `paginatedDiaryEntries`. Pages can overlap when
//! an entry is written between two loads, so items are deduplicated by id
//! and the first copy wins.

use std::collections::HashSet;
use std::sync::Arc;

use super::{EntryError, JournalApi};
use crate::auth::AuthHandle;
use crate::graphql::DiaryEntry;

/// Entries requested per page
pub const FEED_PAGE_SIZE: u32 = 10;

/// History feed for the signed-in user
///
/// Loads take `&mut self`, so only one runs at a time.
pub struct EntryFeed {
    api: Arc<dyn JournalApi>,
    auth: AuthHandle,
    items: Vec<DiaryEntry>,
    seen: HashSet<String>,
    /// Raw entries fetched so far, duplicates included; the next offset
    fetched: u32,
    has_more: bool,
    seeded: bool,
}

impl EntryFeed {
    pub fn new(api: Arc<dyn JournalApi>, auth: AuthHandle) -> Self {
        Self {
            api,
            auth,
            items: Vec::new(),
            seen: HashSet::new(),
            fetched: 0,
            has_more: true,
            seeded: false,
        }
    }

    /// Entries loaded so far, newest first
    pub fn items(&self) -> &[DiaryEntry] {
        if self.auth.is_authenticated() {
            &self.items
        } else {
            &[]
        }
    }

    /// Whether the last page was full
    pub fn has_more(&self) -> bool {
        self.auth.is_authenticated() && self.has_more
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Load the first page unless already loaded
    pub async fn load_initial(&mut self) -> Result<(), EntryError> {
        if self.seeded {
            return Ok(());
        }
        self.refresh().await
    }

    /// Append the next page; returns how many new entries were added
    pub async fn load_more(&mut self) -> Result<usize, EntryError> {
        if !self.auth.is_authenticated() {
            self.reset();
            return Ok(0);
        }
        if !self.seeded {
            self.refresh().await?;
            return Ok(self.items.len());
        }
        if !self.has_more {
            return Ok(0);
        }

        let page = self.fetch(self.fetched).await?;
        Ok(self.append(page))
    }

    /// Reload from the first page, dropping everything loaded
    pub async fn refresh(&mut self) -> Result<(), EntryError> {
        if !self.auth.is_authenticated() {
            self.reset();
            return Ok(());
        }

        let page = self.fetch(0).await?;
        self.items.clear();
        self.seen.clear();
        self.fetched = 0;
        self.append(page);
        self.seeded = true;
        Ok(())
    }

    async fn fetch(&mut self, offset: u32) -> Result<Vec<DiaryEntry>, EntryError> {
        match self.api.paginated_diary_entries(FEED_PAGE_SIZE, offset).await {
            Ok(page) => Ok(page),
            Err(e) => {
                if e.is_unauthenticated() {
                    self.auth.invalidate();
                    self.reset();
                }
                Err(e.into())
            }
        }
    }

    fn append(&mut self, page: Vec<DiaryEntry>) -> usize {
        let count = page.len() as u32;
        self.fetched += count;
        self.has_more = count == FEED_PAGE_SIZE;

        let before = self.items.len();
        for entry in page {
            if entry.id.is_empty() || !self.seen.insert(entry.id.clone()) {
                continue;
            }
            self.items.push(entry);
        }

        tracing::debug!(
            fetched = self.fetched,
            items = self.items.len(),
            has_more = self.has_more,
            "Entry feed page loaded"
        );
        self.items.len() - before
    }

    fn reset(&mut self) {
        self.items.clear();
        self.seen.clear();
        self.fetched = 0;
        self.has_more = false;
        self.seeded = false;
    }
}
