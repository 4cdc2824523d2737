//! Screens of the dashboard and the sign-in guard in front of them.

/// A navigable screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Entry point; always redirected
    Root,
    Login,
    Home,
    Devotions,
    DevotionEdit(i64),
    ChurchEvents,
    ChurchEventCreate,
    ChurchEventEdit(i64),
    Leaderboard,
    Community,
}

impl Route {
    /// Screens that need a signed-in session
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Route::Devotions
                | Route::DevotionEdit(_)
                | Route::ChurchEvents
                | Route::ChurchEventCreate
                | Route::ChurchEventEdit(_)
                | Route::Leaderboard
                | Route::Community
        )
    }

    /// Where navigation to `self` actually lands for the given session.
    pub fn guard(self, authenticated: bool) -> Route {
        match self {
            Route::Root if authenticated => Route::Home,
            Route::Root => Route::Login,
            Route::Login if authenticated => Route::Home,
            r if r.is_protected() && !authenticated => Route::Login,
            r => r,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Root | Route::Home => "Home",
            Route::Login => "Sign in",
            Route::Devotions => "Devotions",
            Route::DevotionEdit(_) => "Edit devotion",
            Route::ChurchEvents => "Church events",
            Route::ChurchEventCreate => "New church event",
            Route::ChurchEventEdit(_) => "Edit church event",
            Route::Leaderboard => "Leaderboard",
            Route::Community => "Community",
        }
    }

    /// Entries of the home menu, in display order
    pub fn menu() -> [Route; 4] {
        [
            Route::Devotions,
            Route::ChurchEvents,
            Route::Leaderboard,
            Route::Community,
        ]
    }
}
