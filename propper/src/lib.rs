//! Managed properties
//!
//! `propper` attaches named properties to a type at registration time. Each
//! property gets a lazily computed default, optional validation against a
//! type name, regular expression or predicate, a change hook, and a policy
//! for rejected values.
//!
//! # Architecture
//!
//! - **Registration**: [`Propper`] resolves a property's arguments once and
//!   stores the result in the process-wide [`SchemaRegistry`]
//! - **Storage**: instances hold their values in [`Slots`]; the schema is
//!   shared per type
//! - **Access**: [`ManagedExt::get`] and [`ManagedExt::set`] run the accessor
//!   state machine against the schema for the instance's type
//! - **Declarations**: property lists can be loaded from YAML or JSON
//!
//! ```rust,ignore
//! use propper::{Managed, ManagedExt, Propper, Slots};
//!
//! struct User {
//!     slots: Slots,
//! }
//!
//! impl Managed for User {
//!     fn slots(&self) -> &Slots { &self.slots }
//!     fn slots_mut(&mut self) -> &mut Slots { &mut self.slots }
//! }
//!
//! Propper::named::<User>("User")
//!     .typed("first", "", "string")?
//!     .typed("age", 0, "integer")?;
//!
//! let mut user = User { slots: Slots::of::<User>() };
//! user.set("first", "Mike")?;
//! assert!(user.set("age", "old").is_err());
//! ```

pub mod accessor;
pub mod config;
pub mod decl;
pub mod error;
pub mod policy;
pub mod propper;
pub mod registry;
pub mod signature;
pub mod start;
pub mod validator;
pub mod value;

pub use accessor::{read_prop, write_prop, Managed, ManagedExt, Slots};
pub use config::{BadValueHandler, BadValuePolicy, OnChange, PropConfig, StartFn};
pub use decl::{parse_json, parse_yaml, DeclPolicy, PropDecl};
pub use error::{PropError, Result};
pub use propper::{Propper, DEFAULT_DISPLAY_NAME};
pub use registry::{schema_of, ManagedProp, SchemaDef, SchemaRegistry, TypeKey};
pub use signature::{DefaultArg, PropArgs, TrailingArg, TypeArg};
pub use type_tests::{TypeTest, TypeTests};
pub use validator::{Predicate, TestSpec, TypeSpec, Validator};
pub use value::{Function, PropValue, Shared, SharedArray, SharedObject};
