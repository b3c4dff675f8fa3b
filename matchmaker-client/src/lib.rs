pub mod api;
pub mod chat;
pub mod distance;
pub mod error;
pub mod models;
pub mod profile_form;
pub mod saved_trials;
pub mod search;
pub mod storage;

// Re-export commonly used types
pub use api::{DEFAULT_BASE_URL, MatchmakerApi};
pub use chat::{Assistant, ChatMessage, ChatRole, ChatSession};
pub use distance::{Coordinate, annotate, haversine_km, sort_by_distance};
pub use error::{ClientError, Result};
pub use models::{
    PatientProfile, ProfileEnvelope, Session, SignupRequest, TrialRecord, TrialStatus, UserAccount,
};
pub use profile_form::{EntryList, ProfileForm, changed_fields, compute_bmi};
pub use saved_trials::{SavedTrials, derived_key};
pub use search::{SearchClient, SearchFilters, SearchOutcome, SortBy};
pub use storage::{
    InMemorySavedTrialsStore, InMemorySessionStore, JsonFileSavedTrialsStore, JsonFileSessionStore,
    SavedTrialsStore, SessionStore,
};
