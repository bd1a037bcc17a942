//! Screen state for list and dashboard views
//!
//! A screen owns the rows it fetched, its page cursor and a [`ViewScope`].
//! Results that arrive after [`ListScreen::unmount`] are dropped instead of
//! being applied.

use tracing::debug;

use qhse_session::DashboardStats;

use crate::error::{Error, Result};
use crate::gateway::AuthorizedClient;
use crate::pagination::Pager;
use crate::reports::{refresh_dashboard, Identified, ReportDelete, ReportList};
use crate::scope::ViewScope;

pub struct ListScreen<S: ReportList> {
    source: S,
    items: Vec<S::Item>,
    loading: bool,
    pager: Pager,
    selected: Option<S::Item>,
    scope: ViewScope,
}

impl<S: ReportList> ListScreen<S> {
    pub fn new(source: S, per_page: usize) -> Self {
        Self {
            source,
            items: Vec::new(),
            loading: false,
            pager: Pager::new(per_page),
            selected: None,
            scope: ViewScope::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Shared handle for tearing the screen down from elsewhere
    pub fn scope(&self) -> ViewScope {
        self.scope.clone()
    }

    pub fn unmount(&self) {
        self.scope.unmount();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn items(&self) -> &[S::Item] {
        &self.items
    }

    /// Refetches the list. On failure the previous rows are kept.
    pub async fn refresh(&mut self) -> Result<()> {
        if !self.scope.is_mounted() {
            return Err(Error::Cancelled);
        }
        self.loading = true;
        let result = self.scope.run(self.source.list()).await;
        match result {
            Ok(items) => {
                debug!(screen = self.source.label(), rows = items.len(), "list refreshed");
                self.items = items;
                self.pager.clamp(self.items.len());
                self.loading = false;
                Ok(())
            }
            // the view is gone; leave its state as it was
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                self.loading = false;
                Err(e)
            }
        }
    }

    pub fn page(&self) -> usize {
        self.pager.page()
    }

    pub fn total_pages(&self) -> usize {
        self.pager.total_pages(self.items.len())
    }

    pub fn page_items(&self) -> &[S::Item] {
        self.pager.slice(&self.items)
    }

    pub fn next_page(&mut self) -> usize {
        self.pager.next(self.items.len())
    }

    pub fn previous_page(&mut self) -> usize {
        self.pager.previous()
    }

    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.pager.go_to(page, self.items.len())
    }

    /// Opens the detail view for a loaded row
    pub fn view(&mut self, id: i64) -> Option<&S::Item> {
        self.selected = self.items.iter().find(|item| item.id() == id).cloned();
        self.selected.as_ref()
    }

    pub fn selected(&self) -> Option<&S::Item> {
        self.selected.as_ref()
    }

    pub fn close_detail(&mut self) {
        self.selected = None;
    }
}

impl<S: ReportDelete> ListScreen<S> {
    /// Deletes a row, confirms with an alert and reloads the list
    pub async fn delete(&mut self, id: i64) -> Result<()> {
        self.scope.run(self.source.delete(id)).await?;
        if self.selected.as_ref().map(Identified::id) == Some(id) {
            self.selected = None;
        }
        self.source
            .gateway()
            .alert(&format!("{} deleted successfully", self.source.label()));
        self.refresh().await
    }
}

/// Dashboard counters
pub struct DashboardScreen {
    gateway: AuthorizedClient,
    scope: ViewScope,
}

impl DashboardScreen {
    pub fn new(gateway: AuthorizedClient) -> Self {
        Self {
            gateway,
            scope: ViewScope::new(),
        }
    }

    /// Last snapshot held by the session, if any
    pub fn stats(&self) -> Option<DashboardStats> {
        self.gateway.session().snapshot().dashboard_stats
    }

    pub async fn refresh(&self) -> Result<DashboardStats> {
        if !self.scope.is_mounted() {
            return Err(Error::Cancelled);
        }
        // stats still reach the session store if the view unmounts mid-flight
        self.scope.run(refresh_dashboard(&self.gateway)).await
    }

    pub fn scope(&self) -> ViewScope {
        self.scope.clone()
    }

    pub fn unmount(&self) {
        self.scope.unmount();
    }
}
