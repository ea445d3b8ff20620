//! The backend state machine.

use std::fmt;

use sightline_core::{BackendKind, BackendSelection};

/// Which backends are currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendState {
    /// No backend; published outputs are empty.
    #[default]
    Disabled,
    /// Only the immediate per-object backend.
    ObjectBackendActive,
    /// Only the batched data-oriented backend.
    EntityBackendActive,
    /// Both backends side by side.
    BothActive,
}

impl BackendState {
    /// Builds the state from which backends are registered.
    pub fn from_flags(object: bool, entity: bool) -> Self {
        match (object, entity) {
            (false, false) => BackendState::Disabled,
            (true, false) => BackendState::ObjectBackendActive,
            (false, true) => BackendState::EntityBackendActive,
            (true, true) => BackendState::BothActive,
        }
    }

    /// Returns the state a configuration asks for.
    pub fn target(enabled: bool, selection: BackendSelection) -> Self {
        if enabled {
            Self::from_flags(selection.wants_object(), selection.wants_entity())
        } else {
            BackendState::Disabled
        }
    }

    /// Returns whether `kind` runs in this state.
    pub fn is_active(self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::Object => matches!(
                self,
                BackendState::ObjectBackendActive | BackendState::BothActive
            ),
            BackendKind::Entity => matches!(
                self,
                BackendState::EntityBackendActive | BackendState::BothActive
            ),
        }
    }

    /// Returns the backend whose output is reported by default: the object
    /// backend when it runs, otherwise the entity backend.
    pub fn primary(self) -> Option<BackendKind> {
        BackendKind::ALL.into_iter().find(|&kind| self.is_active(kind))
    }

    /// Returns the selection that reproduces this state.
    pub fn selection(self) -> BackendSelection {
        match self {
            BackendState::Disabled => BackendSelection::None,
            BackendState::ObjectBackendActive => BackendSelection::Object,
            BackendState::EntityBackendActive => BackendSelection::Entity,
            BackendState::BothActive => BackendSelection::Both,
        }
    }
}

impl fmt::Display for BackendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendState::Disabled => "disabled",
            BackendState::ObjectBackendActive => "object backend active",
            BackendState::EntityBackendActive => "entity backend active",
            BackendState::BothActive => "both active",
        };
        f.write_str(name)
    }
}
