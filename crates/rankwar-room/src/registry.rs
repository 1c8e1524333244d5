//! Room registry: the name-keyed table of live rooms.

use std::collections::HashMap;

use rankwar_protocol::PlayerId;

use crate::{Room, RoomError};

/// All live rooms, keyed by name.
///
/// Owned by the [`GameEngine`](crate::GameEngine). A room is created by
/// `create_room` and removed as soon as its last player leaves.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
}

impl RoomRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a room named `name` with `owner` seated as its only player.
    ///
    /// # Errors
    /// [`RoomError::RoomExists`] if the name is in use.
    pub fn create(
        &mut self,
        name: &str,
        owner: PlayerId,
        owner_name: &str,
    ) -> Result<&mut Room, RoomError> {
        if self.rooms.contains_key(name) {
            return Err(RoomError::RoomExists(name.to_owned()));
        }
        let room = self
            .rooms
            .entry(name.to_owned())
            .or_insert_with(|| Room::new(name, owner, owner_name));
        tracing::info!(room = %name, %owner, "room created");
        Ok(room)
    }

    pub fn get(&self, name: &str) -> Option<&Room> {
        self.rooms.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Room> {
        self.rooms.get_mut(name)
    }

    /// Removes a room. Returns it if it existed.
    pub fn remove(&mut self, name: &str) -> Option<Room> {
        let room = self.rooms.remove(name)?;
        tracing::info!(room = %name, "room deleted");
        Some(room)
    }

    /// Names of every room `player` is seated in, sorted.
    pub fn rooms_of(&self, player: PlayerId) -> Vec<String> {
        let mut names: Vec<String> = self
            .rooms
            .values()
            .filter(|room| room.is_member(player))
            .map(|room| room.name().to_owned())
            .collect();
        names.sort();
        names
    }

    /// Returns the number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Lists all room names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rooms.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_lookup() {
        let mut registry = RoomRegistry::new();
        registry.create("A", PlayerId(1), "ann").unwrap();

        let room = registry.get("A").unwrap();
        assert_eq!(room.owner(), PlayerId(1));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("B").is_none());
    }

    #[test]
    fn test_duplicate_name_is_rejected_without_change() {
        let mut registry = RoomRegistry::new();
        registry.create("A", PlayerId(1), "ann").unwrap();

        let err = registry.create("A", PlayerId(2), "bob").unwrap_err();
        assert_eq!(err, RoomError::RoomExists("A".into()));
        assert_eq!(registry.get("A").unwrap().owner(), PlayerId(1));
    }

    #[test]
    fn test_room_names_are_case_sensitive() {
        let mut registry = RoomRegistry::new();
        registry.create("A", PlayerId(1), "ann").unwrap();
        assert!(registry.create("a", PlayerId(2), "bob").is_ok());
        assert_eq!(registry.names(), vec!["A".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_rooms_of_lists_memberships() {
        let mut registry = RoomRegistry::new();
        registry.create("B", PlayerId(1), "ann").unwrap();
        registry.create("A", PlayerId(1), "ann").unwrap();
        registry.create("C", PlayerId(2), "bob").unwrap();

        assert_eq!(registry.rooms_of(PlayerId(1)), vec!["A", "B"]);
        assert!(registry.rooms_of(PlayerId(3)).is_empty());
    }

    #[test]
    fn test_remove() {
        let mut registry = RoomRegistry::new();
        registry.create("A", PlayerId(1), "ann").unwrap();
        assert!(registry.remove("A").is_some());
        assert!(registry.remove("A").is_none());
        assert!(registry.is_empty());
    }
}
