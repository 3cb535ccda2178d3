// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod event;
pub mod selector;
pub mod value;

pub use event::Event;
pub use selector::{FieldSelector, PrimitiveType};
pub use value::FieldValue;
