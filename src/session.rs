use std::sync::{Arc, RwLock};

use crate::models::page::PageContent;
use crate::services::auth::TokenStore;
use crate::services::poller::JobRegistry;

/// Per-UI-context session state: the current page, the bearer token and
/// the in-flight jobs. Passed explicitly instead of living in globals.
pub struct Session {
    tokens: Arc<TokenStore>,
    jobs: Arc<JobRegistry>,
    page: RwLock<Option<PageContent>>,
}

impl Session {
    pub fn new(tokens: Arc<TokenStore>, jobs: Arc<JobRegistry>) -> Self {
        Self {
            tokens,
            jobs,
            page: RwLock::new(None),
        }
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn jobs(&self) -> &Arc<JobRegistry> {
        &self.jobs
    }

    pub fn set_page(&self, page: PageContent) {
        *self.page.write().unwrap() = Some(page);
    }

    pub fn page(&self) -> Option<PageContent> {
        self.page.read().unwrap().clone()
    }

    /// Navigation teardown: forget the page and cancel every in-flight
    /// poll. The token survives; auth owns its lifecycle.
    pub fn reset_for_navigation(&self) {
        *self.page.write().unwrap() = None;
        self.jobs.cancel_all();
        tracing::debug!("session reset for navigation");
    }
}
