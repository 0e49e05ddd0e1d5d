mod check;
mod fields;

pub use check::{Check, Contract, ContractSection, FnCheck, SharedCheck, check_fn};
pub use fields::{FieldKind, Fields, RequiredParams};
