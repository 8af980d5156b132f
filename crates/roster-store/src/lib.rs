//! In-memory user collection and the pure logic around it: the store and its
//! mutations, the filtered/sorted projection shown by the collection view,
//! add/edit form validation and per-view load generations.

mod form;
mod projector;
mod store;
mod tracker;

pub use form::{Field, FormErrors, UserForm, ValidatedUser, ValidationError};
pub use projector::{matches_query, project};
pub use store::{now_millis, StoreError, UserPatch, UserStore};
pub use tracker::{LoadTicket, LoadTracker};
