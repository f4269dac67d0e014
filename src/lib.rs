//! querybuilder - compose attribute filter expressions
//!
//! A filter is an ordered list of condition groups. Each group is a
//! parenthesized conjunction of `field operator value` conditions, joined
//! to the groups before it with `AND` or `OR`.
//!
//! ```ignore
//! use querybuilder::{compile, FilterModel, IdentityResolver, Operator};
//!
//! let mut model = FilterModel::new("age");
//! let cond = model.condition_mut(0, 0)?;
//! cond.operator = Operator::Ge;
//! cond.value1 = "30".to_string();
//! assert_eq!(compile(&model, &IdentityResolver), r#"("age" >= 30)"#);
//! ```

pub mod catalog;
pub mod error;
pub mod filter;
pub mod store;
pub mod values;

pub use catalog::{FieldCatalog, FieldInfo};
pub use error::{Error, Result};
pub use filter::compile::{compile, resolve_value, IdentityResolver, ValueResolver};
pub use filter::document::{parse, serialize, Document};
pub use filter::model::{Condition, FilterModel, Group, JoinOp, Operator};
pub use values::{sample_values, SampleMode};
