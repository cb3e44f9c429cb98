//! Collaborator interfaces consumed by the checkout core.
//!
//! Each collaborator is an async trait so the orchestrator depends on the
//! contract, not the storage; the `Sql*` implementations back them with the
//! shared relational datastore.

pub mod address_book;
pub mod admins;
pub mod carts;
pub mod delivery_shifts;
pub mod profiles;
pub mod settings;

pub use address_book::{AddressBook, SqlAddressBook};
pub use admins::{AdminDirectory, SqlAdminDirectory};
pub use carts::{CartLine, CartSnapshot, CartStore, SqlCartStore};
pub use delivery_shifts::{ShiftDirectory, SqlShiftDirectory};
pub use profiles::{ProfileStore, SqlProfileStore};
pub use settings::{PlatformSettings, SettingsStore, SqlSettingsStore};
