use std::collections::HashMap;

use crate::modules::constants::MAX_TRACK_ALIAS;
use crate::modules::errors::SessionError;
use crate::modules::models::track::FullTrackName;

/// Session-scoped bijection between 60-bit track aliases and full track
/// names. Adding an identical pair again is a no-op; a conflicting mapping
/// fails.
#[derive(Debug, Default)]
pub(crate) struct AliasMap {
    by_alias: HashMap<u64, FullTrackName>,
    by_name: HashMap<FullTrackName, u64>,
}

impl AliasMap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, alias: u64, name: FullTrackName) -> Result<(), SessionError> {
        if alias > MAX_TRACK_ALIAS {
            return Err(SessionError::TrackAlias(format!(
                "alias {} exceeds 60 bits",
                alias
            )));
        }
        match (self.by_alias.get(&alias), self.by_name.get(&name)) {
            (Some(existing_name), Some(existing_alias))
                if *existing_name == name && *existing_alias == alias =>
            {
                Ok(())
            }
            (None, None) => {
                self.by_alias.insert(alias, name.clone());
                self.by_name.insert(name, alias);
                Ok(())
            }
            _ => Err(SessionError::TrackAlias(format!(
                "conflicting mapping for alias {} / name {}",
                alias, name
            ))),
        }
    }

    pub(crate) fn get_name(&self, alias: u64) -> Option<&FullTrackName> {
        self.by_alias.get(&alias)
    }

    pub(crate) fn get_alias(&self, name: &FullTrackName) -> Option<u64> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn remove_by_alias(&mut self, alias: u64) -> Option<FullTrackName> {
        let name = self.by_alias.remove(&alias)?;
        self.by_name.remove(&name);
        Some(name)
    }

    pub(crate) fn remove_by_name(&mut self, name: &FullTrackName) -> Option<u64> {
        let alias = self.by_name.remove(name)?;
        self.by_alias.remove(&alias);
        Some(alias)
    }

    pub(crate) fn clear(&mut self) {
        self.by_alias.clear();
        self.by_name.clear();
    }

    /// Draws a random 60-bit alias not currently in the map.
    pub(crate) fn mint_unused_alias(&self) -> u64 {
        loop {
            let alias = random_alias();
            if !self.by_alias.contains_key(&alias) {
                return alias;
            }
        }
    }
}

pub(crate) fn random_alias() -> u64 {
    rand::random::<u64>() & MAX_TRACK_ALIAS
}
