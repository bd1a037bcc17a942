//! Hooks from the client back into the view layer

use std::sync::{Mutex, PoisonError};

/// Entry points the client may send the user to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
}

/// Receives navigation requests
pub trait Navigation: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Shows a blocking, user-visible message
pub trait Alerts: Send + Sync {
    fn alert(&self, message: &str);
}

/// Something the client asked the view layer to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Navigate(Route),
    Alert(String),
}

/// Records navigation and alerts in order
///
/// Headless front ends and tests use it in place of a real UI.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<UiEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Navigate(route) => Some(route),
                UiEvent::Alert(_) => None,
            })
            .collect()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Alert(message) => Some(message),
                UiEvent::Navigate(_) => None,
            })
            .collect()
    }

    /// Drains everything recorded so far
    pub fn take(&self) -> Vec<UiEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn push(&self, event: UiEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl Navigation for EventLog {
    fn navigate(&self, route: Route) {
        self.push(UiEvent::Navigate(route));
    }
}

impl Alerts for EventLog {
    fn alert(&self, message: &str) {
        self.push(UiEvent::Alert(message.to_string()));
    }
}
