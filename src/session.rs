//! Page state machine: `Idle -> Generating -> Succeeded | Failed`.

use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::api_connection::ChatProvider;
use crate::config::ModelSettings;
use crate::error::FlowError;
use crate::feast::{run_feast, FeastOutcome, FeastRequest};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a generation is already in progress")]
    Busy,
    #[error(transparent)]
    Flow(#[from] FlowError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PageState {
    #[default]
    Idle,
    Generating {
        request: FeastRequest,
        previous: Option<FeastOutcome>,
    },
    Succeeded {
        request: FeastRequest,
        outcome: FeastOutcome,
    },
    /// `previous` is the last successful outcome, still shown after the failure.
    Failed {
        request: FeastRequest,
        error: String,
        previous: Option<FeastOutcome>,
    },
}

#[derive(Debug, Default)]
pub struct Session {
    state: PageState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.state, PageState::Generating { .. })
    }

    /// Outcome currently on screen, possibly left over from an earlier attempt.
    pub fn displayed_outcome(&self) -> Option<&FeastOutcome> {
        match &self.state {
            PageState::Idle => None,
            PageState::Succeeded { outcome, .. } => Some(outcome),
            PageState::Generating { previous, .. } | PageState::Failed { previous, .. } => {
                previous.as_ref()
            }
        }
    }

    pub fn last_request(&self) -> Option<&FeastRequest> {
        match &self.state {
            PageState::Idle => None,
            PageState::Generating { request, .. }
            | PageState::Succeeded { request, .. }
            | PageState::Failed { request, .. } => Some(request),
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        match &self.state {
            PageState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Enters `Generating`. Rejected while a generation is in flight.
    pub fn begin(&mut self, request: FeastRequest) -> Result<(), SessionError> {
        if self.is_generating() {
            return Err(SessionError::Busy);
        }
        let previous = self.displayed_outcome().cloned();
        self.state = PageState::Generating { request, previous };
        Ok(())
    }

    /// Leaves `Generating` with the result of the interaction.
    pub fn finish(&mut self, result: &Result<FeastOutcome, FlowError>) {
        if !self.is_generating() {
            warn!("finish called outside of a generation; ignoring");
            return;
        }
        let PageState::Generating { request, previous } = std::mem::take(&mut self.state) else {
            return;
        };
        self.state = match result {
            Ok(outcome) => PageState::Succeeded {
                request,
                outcome: outcome.clone(),
            },
            Err(err) => PageState::Failed {
                request,
                error: err.to_string(),
                previous,
            },
        };
    }

    /// Leaves `Generating` for an interaction that will never finish.
    fn abandon(&mut self) {
        if !self.is_generating() {
            return;
        }
        let PageState::Generating { request, previous } = std::mem::take(&mut self.state) else {
            return;
        };
        self.state = PageState::Failed {
            request,
            error: "generation was cancelled before it finished".to_string(),
            previous,
        };
    }
}

/// Locks a shared session, recovering the state if a holder panicked.
pub fn lock_session(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Releases `Generating` if the interaction future is dropped mid-flight.
struct GenerationGuard<'a> {
    session: &'a Mutex<Session>,
    armed: bool,
}

impl GenerationGuard<'_> {
    fn finish(mut self, result: &Result<FeastOutcome, FlowError>) {
        self.armed = false;
        lock_session(self.session).finish(result);
    }
}

impl Drop for GenerationGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("interaction dropped before finishing");
            lock_session(self.session).abandon();
        }
    }
}

/// Runs one interaction against a shared session. The lock is released while
/// the model calls are in flight.
pub async fn drive(
    session: &Mutex<Session>,
    provider: &dyn ChatProvider,
    settings: &ModelSettings,
    request: FeastRequest,
) -> Result<FeastOutcome, SessionError> {
    lock_session(session).begin(request.clone())?;
    let guard = GenerationGuard {
        session,
        armed: true,
    };

    let result = run_feast(provider, settings, &request).await;
    match &result {
        Ok(outcome) => info!(
            recipes = outcome.recipes.len(),
            rankings = outcome.rankings.len(),
            "interaction finished"
        ),
        Err(err) => error!(flow = err.flow(), error = %err, "Error generating recipes"),
    }

    guard.finish(&result);
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe_generator::Recipe;

    fn request(text: &str) -> FeastRequest {
        FeastRequest {
            ingredients: text.to_string(),
            ..FeastRequest::default()
        }
    }

    fn outcome(name: &str) -> FeastOutcome {
        FeastOutcome {
            recipes: vec![Recipe {
                name: name.to_string(),
                instructions: "Cook.".to_string(),
                required_ingredients: vec![],
            }],
            rankings: vec![],
        }
    }

    #[test]
    fn second_trigger_while_generating_is_rejected() {
        let mut session = Session::new();
        session.begin(request("eggs")).unwrap();
        assert!(session.is_generating());
        assert!(matches!(session.begin(request("milk")), Err(SessionError::Busy)));
        assert_eq!(session.last_request().unwrap().ingredients, "eggs");
    }

    #[test]
    fn failure_keeps_previous_outcome_visible() {
        let mut session = Session::new();
        session.begin(request("eggs")).unwrap();
        session.finish(&Ok(outcome("Omelette")));
        assert_eq!(session.displayed_outcome(), Some(&outcome("Omelette")));

        session.begin(request("milk")).unwrap();
        assert_eq!(session.displayed_outcome(), Some(&outcome("Omelette")));
        session.finish(&Err(FlowError::EmptyOutput {
            flow: "generateRecipe",
        }));

        assert!(!session.is_generating());
        assert_eq!(session.displayed_outcome(), Some(&outcome("Omelette")));
        assert_eq!(
            session.last_error(),
            Some("generateRecipe: model returned no output")
        );
        assert_eq!(session.last_request().unwrap().ingredients, "milk");
    }

    #[test]
    fn abandoned_generation_releases_the_trigger() {
        let mut session = Session::new();
        session.begin(request("eggs")).unwrap();
        session.finish(&Ok(outcome("Omelette")));
        session.begin(request("milk")).unwrap();

        session.abandon();
        assert!(!session.is_generating());
        assert!(session.last_error().is_some());
        assert_eq!(session.displayed_outcome(), Some(&outcome("Omelette")));
        session.begin(request("tofu")).unwrap();
    }

    #[test]
    fn finish_without_begin_is_ignored() {
        let mut session = Session::new();
        session.finish(&Ok(outcome("Omelette")));
        assert!(session.last_request().is_none());
        assert!(session.displayed_outcome().is_none());

        session.begin(request("eggs")).unwrap();
        session.finish(&Ok(outcome("Omelette")));
        session.finish(&Ok(outcome("Pancakes")));
        assert_eq!(session.displayed_outcome(), Some(&outcome("Omelette")));
    }
}
