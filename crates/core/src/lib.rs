//! # vetter-core
//!
//! A declarative validation engine. Callers describe record types as
//! [`RecordSchema`]s (field name plus rule expression such as
//! `"required,dive,required,min=3"`), register custom rules, aliases and
//! struct-level checks on a [`ValidatorBuilder`], and freeze it into a
//! [`Validator`]. Validation returns every [`Violation`] found.
//!
//! ```
//! use vetter_core::{Record, RecordSchema, Validator};
//!
//! let mut builder = Validator::builder();
//! builder
//!     .register_schema(RecordSchema::new("User").field("Hobbies", "required,dive,required,min=3"))
//!     .unwrap();
//! let validator = builder.build().unwrap();
//!
//! let user = Record::new("User").field("Hobbies", vec!["Gaming", "", "X"]);
//! let violations = validator.validate(&user);
//! assert_eq!(violations.len(), 2);
//! assert_eq!(violations[0].path, "Hobbies[1]");
//! ```

pub mod config;
pub mod error;
pub mod validation;
pub mod value;

pub use config::ValidatorConfig;
pub use error::{CoreError, CoreResult};
pub use validation::engine::{Validator, ValidatorBuilder};
pub use validation::registry::{with_param, Evaluator, FieldLevel, Registry, StructCheck};
pub use validation::rules::{Rule, RuleGroup, Ruleset, ValidationErrors, Violation};
pub use validation::schema::{FieldSchema, RecordSchema};
pub use value::{Record, ToValue, Value};
