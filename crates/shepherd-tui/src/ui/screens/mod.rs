//! One renderer per route.

pub mod church_events;
pub mod community;
pub mod devotions;
pub mod forms;
pub mod home;
pub mod leaderboard;
pub mod login;
