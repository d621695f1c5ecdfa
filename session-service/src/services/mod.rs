pub mod analysis;
pub mod error;
pub mod metrics;
pub mod prompt;
pub mod providers;
pub mod response_validator;
pub mod session;
pub mod store;

pub use analysis::AnalysisEngine;
pub use error::{ModelInvocationError, SessionError};
pub use session::{SavedSession, SessionService};
pub use store::{InMemorySessionStore, MongoSessionStore, SessionStore, StoreError};
