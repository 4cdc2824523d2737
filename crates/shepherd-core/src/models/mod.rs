//! Data models for the church-management API.
//!
//! This module contains the data structures exchanged with the API:
//!
//! - `Envelope`: the `{ success, data, message }` wrapper on every response
//! - `Devotion`, `DevotionInput`: daily devotions and their editable fields
//! - `ChurchEvent`, `ChurchEventInput`, `Attendee`, `Penatalayan`: events,
//!   check-ins and service rosters
//! - `UserProgress`, `RankedUser`: the reading-plan leaderboard

pub mod church_event;
pub mod devotion;
pub mod envelope;
pub mod leaderboard;

use serde::{Deserialize, Deserializer};

pub use church_event::{
    Attendee, ChurchEvent, ChurchEventInput, ChurchEventSortColumn, Penatalayan, User,
};
pub use devotion::{Devotion, DevotionInput, DevotionSortColumn};
pub use envelope::Envelope;
pub use leaderboard::{rank_users, RankTier, RankedUser, UserProgress};

/// Treat an explicit JSON `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
