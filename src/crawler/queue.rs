//! Listing page frontier
//!
//! Pages are worked front to back. A page that drew the busy answer goes to
//! the back of the line carrying its attempt count, so one stubborn page
//! never blocks the others.

use std::collections::VecDeque;
use url::Url;

/// A listing page waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedPage {
    /// The listing page URL
    pub url: Url,

    /// Busy answers this page has drawn so far
    pub busy_attempts: u32,
}

impl QueuedPage {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            busy_attempts: 0,
        }
    }
}

/// FIFO of listing pages for one board
#[derive(Debug, Default)]
pub struct PageQueue {
    pages: VecDeque<QueuedPage>,
    initial_len: usize,
}

impl PageQueue {
    /// Creates a queue holding `urls` in the given order
    pub fn new(urls: impl IntoIterator<Item = Url>) -> Self {
        let pages: VecDeque<QueuedPage> = urls.into_iter().map(QueuedPage::new).collect();
        let initial_len = pages.len();
        Self { pages, initial_len }
    }

    pub fn pop(&mut self) -> Option<QueuedPage> {
        self.pages.pop_front()
    }

    /// Puts a busy page back at the end with one more attempt recorded
    pub fn requeue(&mut self, mut page: QueuedPage) {
        page.busy_attempts += 1;
        self.pages.push_back(page);
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Length at construction; requeues never change it
    pub fn initial_len(&self) -> usize {
        self.initial_len
    }
}
