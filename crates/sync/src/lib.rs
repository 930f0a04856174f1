pub mod collaborators;
pub mod normalize;
pub mod orchestrator;

pub use collaborators::{
    CollaboratorError, ExistingImports, SubmitOutcome, Submitter, TransactionSource,
};
pub use normalize::{normalize, RecordError};
pub use orchestrator::{AccountReport, SyncEngine, SyncReport};
