//! The external backend collaborator, specified at its interface boundary.
//!
//! The client core never talks to a concrete service; it is handed three
//! trait objects: credential verification, object upload, and record CRUD.
//! Implementations live outside this crate (see `plaza-infrastructure`).

pub mod auth;
pub mod records;
pub mod storage;

pub use auth::{AuthProvider, Identity, UserId};
pub use records::{
    Direction, Fields, Filter, OrderBy, Projection, Record, RecordId, RecordStore, Select, Table,
    fields,
};
pub use storage::ObjectStore;
