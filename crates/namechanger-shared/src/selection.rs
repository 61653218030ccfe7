//! Tracks the published name against the user's pending choice.

use serde::Serialize;

use crate::error::{EntityError, Result};
use crate::types::OwnedName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionState {
    /// Selected name equals the published one; nothing to deploy.
    Clean,
    /// A different owned name is selected; deploy is allowed.
    Dirty,
}

/// One selectable entry, flagged when it is the published name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameOption {
    pub name: OwnedName,
    pub is_current: bool,
}

impl std::fmt::Display for NameOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_current {
            write!(f, "{} (current name)", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectionController {
    owned: Vec<OwnedName>,
    current: OwnedName,
    selected: OwnedName,
}

impl SelectionController {
    /// Start clean, with `current` both published and selected.
    pub fn new(owned: Vec<OwnedName>, current: OwnedName) -> Self {
        Self {
            owned,
            selected: current.clone(),
            current,
        }
    }

    pub fn current(&self) -> &OwnedName {
        &self.current
    }

    pub fn selected(&self) -> &OwnedName {
        &self.selected
    }

    pub fn owned(&self) -> &[OwnedName] {
        &self.owned
    }

    pub fn state(&self) -> SelectionState {
        if self.selected == self.current {
            SelectionState::Clean
        } else {
            SelectionState::Dirty
        }
    }

    pub fn can_deploy(&self) -> bool {
        self.state() == SelectionState::Dirty
    }

    /// Select an owned name. Input is matched case-insensitively and the
    /// owned spelling is kept. Unknown names leave the state untouched.
    pub fn select(&mut self, name: &str) -> Result<SelectionState> {
        let owned = self
            .owned
            .iter()
            .find(|owned| owned.as_str() == name)
            .or_else(|| self.owned.iter().find(|owned| owned.matches(name)))
            .ok_or_else(|| EntityError::NameNotOwned(name.to_string()))?;

        self.selected = owned.clone();
        Ok(self.state())
    }

    /// Record a successful deployment of the selected name.
    pub fn confirm_deployed(&mut self) -> SelectionState {
        self.current = self.selected.clone();
        self.state()
    }

    pub fn options(&self) -> Vec<NameOption> {
        self.owned
            .iter()
            .map(|name| NameOption {
                name: name.clone(),
                is_current: name.matches(self.current.as_str()),
            })
            .collect()
    }
}
