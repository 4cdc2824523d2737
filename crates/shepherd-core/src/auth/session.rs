use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::storage::{KeyValueStore, StorageError, ACCESS_TOKEN_KEY, USER_INFO_KEY};

use super::{Credential, Profile};

/// Label shown when no signed-in user name is available
pub const FALLBACK_DISPLAY_NAME: &str = "User";

/// The two states a session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Authenticated,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    /// The user asked to sign out
    UserRequested,
    /// The API rejected the session's token
    AuthorizationDenied,
}

impl std::fmt::Display for SignOutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignOutReason::UserRequested => write!(f, "user requested"),
            SignOutReason::AuthorizationDenied => write!(f, "authorization denied"),
        }
    }
}

/// Snapshot of the in-memory session that views read from.
///
/// Authentication is derived from the presence of a credential, so the two
/// can never disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    credential: Option<Credential>,
    display_name: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl SessionState {
    pub fn anonymous() -> Self {
        Self {
            credential: None,
            display_name: FALLBACK_DISPLAY_NAME.to_string(),
        }
    }

    pub fn authenticated(credential: Credential) -> Self {
        let display_name = credential
            .user
            .display_name()
            .unwrap_or(FALLBACK_DISPLAY_NAME)
            .to_string();
        Self {
            credential: Some(credential),
            display_name,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_authenticated() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.access_token.as_str())
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Refusing to store a credential with an empty access token")]
    EmptyToken,

    #[error("Failed to persist session: {0}")]
    Storage(#[from] StorageError),
}

/// Reasons a stored session is discarded at startup
#[derive(Error, Debug)]
enum StoredSessionError {
    #[error("storage unreadable: {0}")]
    Unreadable(#[from] StorageError),

    #[error("access token is empty")]
    EmptyToken,

    #[error("token stored without a profile")]
    MissingProfile,

    #[error("profile stored without a token")]
    MissingToken,

    #[error("profile is not valid JSON: {0}")]
    InvalidProfile(#[from] serde_json::Error),
}

/// Keeps the in-memory session in step with durable storage.
///
/// One instance is built at startup and handed to whatever renders views.
/// Until `initialize` runs the session reads as anonymous.
pub struct SessionSync<S: KeyValueStore> {
    storage: S,
    state_tx: watch::Sender<SessionState>,
    initialized: bool,
}

impl<S: KeyValueStore> SessionSync<S> {
    pub fn new(storage: S) -> Self {
        let (state_tx, _) = watch::channel(SessionState::anonymous());
        Self {
            storage,
            state_tx,
            initialized: false,
        }
    }

    /// Restore the session from storage. Anything unusable is cleared and
    /// the session starts anonymous; this never fails.
    pub fn initialize(&mut self) -> SessionPhase {
        let state = match self.read_stored_credential() {
            Ok(Some(credential)) => {
                debug!(user_id = %credential.user.id, "Restored stored session");
                SessionState::authenticated(credential)
            }
            Ok(None) => {
                debug!("No stored session");
                SessionState::anonymous()
            }
            Err(e) => {
                warn!(error = %e, "Discarding stored session");
                self.clear_storage();
                SessionState::anonymous()
            }
        };

        let phase = state.phase();
        self.initialized = true;
        self.publish(state);
        phase
    }

    /// Persist and publish a freshly authenticated credential.
    ///
    /// On a storage failure the previous credential is written back and the
    /// in-memory session is left as it was. If even that write fails,
    /// storage is cleared and the session becomes anonymous so the two
    /// still agree.
    pub fn login(&mut self, credential: Credential) -> Result<(), SessionError> {
        if credential.access_token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }

        let previous = self.state_tx.borrow().credential().cloned();
        if let Err(e) = self.persist(&credential) {
            warn!(error = %e, "Failed to persist session, rolling back");
            self.restore(previous.as_ref());
            return Err(e.into());
        }

        info!(user_id = %credential.user.id, "Signed in");
        self.initialized = true;
        self.publish(SessionState::authenticated(credential));
        Ok(())
    }

    /// User-initiated sign out. Safe to call when already signed out.
    pub fn logout(&mut self) {
        self.sign_out(SignOutReason::UserRequested);
    }

    /// Sign out because the API rejected our token.
    pub fn forced_sign_out(&mut self) {
        self.sign_out(SignOutReason::AuthorizationDenied);
    }

    /// Force a sign out if `err` carries an authorization denial from the
    /// API. Returns true when it did.
    pub fn handle_api_error(&mut self, err: &anyhow::Error) -> bool {
        let denied = err.chain().any(|cause| {
            cause
                .downcast_ref::<ApiError>()
                .is_some_and(ApiError::is_auth_denied)
        });
        if denied {
            self.forced_sign_out();
        }
        denied
    }

    pub fn current_display_name(&self) -> String {
        self.state_tx.borrow().display_name().to_string()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state_tx.borrow().is_authenticated()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state_tx.borrow().phase()
    }

    pub fn token(&self) -> Option<String> {
        self.state_tx.borrow().token().map(str::to_string)
    }

    /// Copy of the current session
    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    /// Whether `initialize` (or a login) has run. Views should wait on this
    /// before trusting an anonymous reading.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Receiver that observes every published session state
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn sign_out(&mut self, reason: SignOutReason) {
        let was_authenticated = self.is_authenticated();
        self.clear_storage();
        self.initialized = true;
        self.publish(SessionState::anonymous());
        if was_authenticated {
            info!(%reason, "Signed out");
        } else {
            debug!(%reason, "Sign out while already anonymous");
        }
    }

    fn read_stored_credential(&self) -> Result<Option<Credential>, StoredSessionError> {
        let token = self.storage.get(ACCESS_TOKEN_KEY)?;
        let user_info = self.storage.get(USER_INFO_KEY)?;

        match (token, user_info) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(StoredSessionError::MissingProfile),
            (None, Some(_)) => Err(StoredSessionError::MissingToken),
            (Some(token), Some(user_info)) => {
                if token.trim().is_empty() {
                    return Err(StoredSessionError::EmptyToken);
                }
                let user: Profile = serde_json::from_str(&user_info)?;
                Ok(Some(Credential::new(token, user)))
            }
        }
    }

    fn persist(&mut self, credential: &Credential) -> Result<(), StorageError> {
        let user_info = serde_json::to_string(&credential.user)?;
        self.storage.set(ACCESS_TOKEN_KEY, &credential.access_token)?;
        self.storage.set(USER_INFO_KEY, &user_info)?;
        Ok(())
    }

    /// Put storage back to `previous` after a failed write
    fn restore(&mut self, previous: Option<&Credential>) {
        let Some(previous) = previous else {
            self.clear_storage();
            return;
        };
        if let Err(e) = self.persist(previous) {
            warn!(error = %e, "Could not restore previous session, signing out");
            self.clear_storage();
            self.publish(SessionState::anonymous());
        }
    }

    fn clear_storage(&mut self) {
        for key in [ACCESS_TOKEN_KEY, USER_INFO_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to remove stored session key");
            }
        }
    }

    fn publish(&self, state: SessionState) {
        self.state_tx.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::storage::{FileStore, MemoryStore};

    fn profile(id: i64, name: &str, email: &str) -> Profile {
        Profile {
            id: id.into(),
            name: name.to_string(),
            email: email.to_string(),
            ..Default::default()
        }
    }

    fn ana() -> Credential {
        Credential::new("tok1", profile(1, "Ana", "a@x.com"))
    }

    fn jane() -> Credential {
        Credential::new("tok2", profile(2, "Jane", "jane@x.com"))
    }

    /// Storage and memory agree on who is signed in
    fn assert_consistent<S: KeyValueStore>(sync: &SessionSync<S>) {
        let state = sync.state();
        assert_eq!(state.is_authenticated(), state.credential().is_some());
        assert_eq!(state.phase() == SessionPhase::Authenticated, state.is_authenticated());

        let stored = sync.storage().get(ACCESS_TOKEN_KEY).unwrap();
        if sync.is_initialized() {
            assert_eq!(stored.as_deref(), state.token());
        }
    }

    /// Store that fails profile writes containing the poison text, when set
    #[derive(Default)]
    struct FailingProfileStore {
        inner: MemoryStore,
        poison: Rc<Cell<Option<&'static str>>>,
    }

    impl FailingProfileStore {
        fn failing_on(poison: &'static str) -> Self {
            let store = Self::default();
            store.poison.set(Some(poison));
            store
        }
    }

    impl KeyValueStore for FailingProfileStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            let poisoned = self.poison.get().is_some_and(|p| value.contains(p));
            if key == USER_INFO_KEY && poisoned {
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    // -------------------------------------------------------------------------
    // Initialization
    // -------------------------------------------------------------------------

    #[test]
    fn test_uninitialized_session_is_anonymous() {
        let sync = SessionSync::new(MemoryStore::new());
        assert!(!sync.is_initialized());
        assert!(!sync.is_authenticated());
        assert_eq!(sync.current_display_name(), FALLBACK_DISPLAY_NAME);
    }

    #[test]
    fn test_initialize_with_empty_storage() {
        let mut sync = SessionSync::new(MemoryStore::new());
        assert_eq!(sync.initialize(), SessionPhase::Anonymous);
        assert!(sync.is_initialized());
        assert_eq!(sync.state(), SessionState::anonymous());
    }

    #[test]
    fn test_login_then_initialize_round_trips() {
        let mut sync = SessionSync::new(MemoryStore::new());
        sync.initialize();
        sync.login(ana()).unwrap();

        let mut fresh = SessionSync::new(sync.into_storage());
        assert_eq!(fresh.initialize(), SessionPhase::Authenticated);
        assert_eq!(fresh.state(), SessionState::authenticated(ana()));
        assert_eq!(fresh.state().credential(), Some(&ana()));
    }

    #[test]
    fn test_round_trip_keeps_extra_profile_fields() {
        let mut user = profile(3, "Budi", "b@x.com");
        user.extra.insert("role".to_string(), serde_json::json!("admin"));
        user.extra.insert("phone".to_string(), serde_json::Value::Null);
        let credential = Credential::new("tok3", user);

        let mut sync = SessionSync::new(MemoryStore::new());
        sync.login(credential.clone()).unwrap();

        let mut fresh = SessionSync::new(sync.into_storage());
        fresh.initialize();
        assert_eq!(fresh.state().credential(), Some(&credential));
    }

    #[test]
    fn test_initialize_with_corrupt_profile_clears_storage() {
        let mut store = MemoryStore::new();
        store.set(ACCESS_TOKEN_KEY, "tok1").unwrap();
        store.set(USER_INFO_KEY, "{not json").unwrap();

        let mut sync = SessionSync::new(store);
        assert_eq!(sync.initialize(), SessionPhase::Anonymous);
        assert!(sync.storage().is_empty());

        // A second start sees nothing either
        let mut again = SessionSync::new(sync.into_storage());
        assert_eq!(again.initialize(), SessionPhase::Anonymous);
    }

    #[test]
    fn test_initialize_with_half_written_record_clears_storage() {
        let mut token_only = MemoryStore::new();
        token_only.set(ACCESS_TOKEN_KEY, "tok1").unwrap();
        let mut sync = SessionSync::new(token_only);
        assert_eq!(sync.initialize(), SessionPhase::Anonymous);
        assert!(sync.storage().is_empty());

        let mut profile_only = MemoryStore::new();
        profile_only.set(USER_INFO_KEY, r#"{"id":1,"name":"Ana"}"#).unwrap();
        let mut sync = SessionSync::new(profile_only);
        assert_eq!(sync.initialize(), SessionPhase::Anonymous);
        assert!(sync.storage().is_empty());
    }

    #[test]
    fn test_initialize_with_empty_token_clears_storage() {
        let mut store = MemoryStore::new();
        store.set(ACCESS_TOKEN_KEY, "  ").unwrap();
        store.set(USER_INFO_KEY, r#"{"id":1,"name":"Ana"}"#).unwrap();

        let mut sync = SessionSync::new(store);
        assert_eq!(sync.initialize(), SessionPhase::Anonymous);
        assert!(sync.storage().is_empty());
    }

    #[test]
    fn test_initialize_with_corrupt_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        std::fs::write(store.path(), "\u{0}garbage").unwrap();

        let mut sync = SessionSync::new(store);
        assert_eq!(sync.initialize(), SessionPhase::Anonymous);
        assert!(!sync.storage().path().exists());

        let mut again = SessionSync::new(FileStore::in_dir(dir.path()));
        assert_eq!(again.initialize(), SessionPhase::Anonymous);
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    #[test]
    fn test_logout_is_idempotent() {
        let mut sync = SessionSync::new(MemoryStore::new());
        sync.initialize();
        sync.login(ana()).unwrap();

        sync.logout();
        let once = sync.state();
        sync.logout();
        assert_eq!(sync.state(), once);
        assert_eq!(once, SessionState::anonymous());
        assert!(sync.storage().is_empty());
    }

    #[test]
    fn test_forced_sign_out_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut sync = SessionSync::new(FileStore::in_dir(dir.path()));
        sync.initialize();

        sync.login(ana()).unwrap();
        assert!(sync.is_authenticated());
        let on_disk = std::fs::read_to_string(sync.storage().path()).unwrap();
        assert!(on_disk.contains("tok1"));

        sync.forced_sign_out();
        assert!(!sync.is_authenticated());
        assert_eq!(sync.storage().get(ACCESS_TOKEN_KEY).unwrap(), None);
        let still_there = std::fs::read_to_string(sync.storage().path()).unwrap_or_default();
        assert!(!still_there.contains("tok1"));
    }

    #[test]
    fn test_relogin_replaces_credential() {
        let mut sync = SessionSync::new(MemoryStore::new());
        sync.login(ana()).unwrap();
        sync.login(jane()).unwrap();

        assert_eq!(sync.token().as_deref(), Some("tok2"));
        assert!(!sync.storage().contains_value("tok1"));
        assert_eq!(sync.current_display_name(), "Jane");
    }

    #[test]
    fn test_login_rejects_empty_token() {
        let mut sync = SessionSync::new(MemoryStore::new());
        let err = sync.login(Credential::new("", profile(1, "Ana", ""))).unwrap_err();
        assert!(matches!(err, SessionError::EmptyToken));
        assert!(!sync.is_authenticated());
        assert!(sync.storage().is_empty());
    }

    #[test]
    fn test_failed_persist_rolls_back() {
        let mut sync = SessionSync::new(FailingProfileStore::failing_on(""));
        sync.initialize();

        let err = sync.login(ana()).unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert!(!sync.is_authenticated());
        assert!(sync.storage().inner.is_empty());
    }

    #[test]
    fn test_failed_relogin_keeps_previous_credential_stored() {
        let mut sync = SessionSync::new(FailingProfileStore::failing_on("Jane"));
        sync.initialize();
        sync.login(ana()).unwrap();

        let err = sync.login(jane()).unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert_eq!(sync.token().as_deref(), Some("tok1"));
        assert_eq!(sync.storage().get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("tok1"));
        assert_consistent(&sync);

        let mut fresh = SessionSync::new(sync.into_storage());
        assert_eq!(fresh.initialize(), SessionPhase::Authenticated);
        assert_eq!(fresh.state().credential(), Some(&ana()));
    }

    #[test]
    fn test_failed_relogin_signs_out_when_restore_fails() {
        let store = FailingProfileStore::default();
        let poison = Rc::clone(&store.poison);
        let mut sync = SessionSync::new(store);
        sync.initialize();
        sync.login(ana()).unwrap();

        // Every profile write fails from here on, including the restore
        poison.set(Some(""));
        assert!(sync.login(jane()).is_err());
        assert!(!sync.is_authenticated());
        assert_eq!(sync.storage().get(ACCESS_TOKEN_KEY).unwrap(), None);
        assert_consistent(&sync);
    }

    #[test]
    fn test_initialize_keeps_loosely_typed_profile() {
        let mut store = MemoryStore::new();
        store.set(ACCESS_TOKEN_KEY, "tok1").unwrap();
        store.set(USER_INFO_KEY, r#"{"id":1,"name":null,"email":"a@x.com"}"#).unwrap();
        let mut sync = SessionSync::new(store);
        assert_eq!(sync.initialize(), SessionPhase::Authenticated);
        assert_eq!(sync.current_display_name(), "User");
        assert!(!sync.storage().is_empty());

        let mut store = MemoryStore::new();
        store.set(ACCESS_TOKEN_KEY, "tok1").unwrap();
        store.set(USER_INFO_KEY, r#"{"id":"u-17","name":"Ana"}"#).unwrap();
        let mut sync = SessionSync::new(store);
        assert_eq!(sync.initialize(), SessionPhase::Authenticated);
        assert_eq!(sync.current_display_name(), "Ana");
    }

    #[test]
    fn test_handle_api_error_forces_sign_out_on_401() {
        let mut sync = SessionSync::new(MemoryStore::new());
        sync.login(ana()).unwrap();

        let other: anyhow::Error = ApiError::NotFound("gone".to_string()).into();
        assert!(!sync.handle_api_error(&other));
        assert!(sync.is_authenticated());

        let denied = anyhow::Error::from(ApiError::Unauthorized).context("Failed to load devotions");
        assert!(sync.handle_api_error(&denied));
        assert!(!sync.is_authenticated());
        assert!(sync.storage().is_empty());
    }

    #[test]
    fn test_handle_api_error_treats_403_as_denied() {
        let mut sync = SessionSync::new(MemoryStore::new());
        sync.login(ana()).unwrap();

        let forbidden: anyhow::Error = ApiError::AccessDenied("no".to_string()).into();
        assert!(sync.handle_api_error(&forbidden));
        assert!(!sync.is_authenticated());
    }

    // -------------------------------------------------------------------------
    // Display name
    // -------------------------------------------------------------------------

    #[test]
    fn test_display_name() {
        let mut sync = SessionSync::new(MemoryStore::new());
        sync.initialize();
        assert_eq!(sync.current_display_name(), "User");

        sync.login(jane()).unwrap();
        assert_eq!(sync.current_display_name(), "Jane");

        sync.login(Credential::new("tok9", profile(9, "", "x@x.com"))).unwrap();
        assert_eq!(sync.current_display_name(), "User");
    }

    // -------------------------------------------------------------------------
    // Observers
    // -------------------------------------------------------------------------

    #[test]
    fn test_subscribers_see_transitions() {
        let mut sync = SessionSync::new(MemoryStore::new());
        let mut rx = sync.subscribe();
        assert!(!rx.borrow_and_update().is_authenticated());

        sync.login(ana()).unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());

        sync.logout();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().display_name(), "User");
    }

    // -------------------------------------------------------------------------
    // Invariant over operation sequences
    // -------------------------------------------------------------------------

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Initialize,
        LoginAna,
        LoginJane,
        Logout,
        ForcedSignOut,
        Restart,
        /// Login whose profile write fails
        FailedLogin,
    }

    const ALL_OPS: [Op; 7] = [
        Op::Initialize,
        Op::LoginAna,
        Op::LoginJane,
        Op::Logout,
        Op::ForcedSignOut,
        Op::Restart,
        Op::FailedLogin,
    ];

    fn run(ops: &[Op]) {
        let mut sync = SessionSync::new(FailingProfileStore::failing_on("Budi"));
        for op in ops {
            match op {
                Op::Initialize => {
                    sync.initialize();
                }
                Op::LoginAna => sync.login(ana()).unwrap(),
                Op::LoginJane => sync.login(jane()).unwrap(),
                Op::Logout => sync.logout(),
                Op::ForcedSignOut => sync.forced_sign_out(),
                Op::FailedLogin => {
                    let before = sync.state();
                    let budi = Credential::new("tok3", profile(3, "Budi", "b@x.com"));
                    assert!(sync.login(budi).is_err());
                    assert_eq!(sync.state(), before, "failed login changed state after {:?}", ops);
                }
                Op::Restart => {
                    let before = sync.state();
                    let was_initialized = sync.is_initialized();
                    sync = SessionSync::new(sync.into_storage());
                    sync.initialize();
                    if was_initialized {
                        assert_eq!(sync.state(), before, "restart changed state after {:?}", ops);
                    }
                }
            }
            assert_consistent(&sync);
        }
    }

    #[test]
    fn test_invariant_holds_for_all_short_sequences() {
        fn walk(prefix: &mut Vec<Op>, depth: usize) {
            run(prefix);
            if depth == 0 {
                return;
            }
            for op in ALL_OPS {
                prefix.push(op);
                walk(prefix, depth - 1);
                prefix.pop();
            }
        }
        walk(&mut Vec::new(), 4);
    }

    #[test]
    fn test_invariant_holds_for_random_sequences() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let len = rng.gen_range(1..40);
            let ops: Vec<Op> = (0..len)
                .map(|_| ALL_OPS[rng.gen_range(0..ALL_OPS.len())])
                .collect();
            run(&ops);
        }
    }
}
