/// User registry, session store and score ledger collaborators.
pub mod ledger;
/// Records exchanged with the collaborators.
pub mod models;
/// Backend-agnostic storage errors.
pub mod storage;
