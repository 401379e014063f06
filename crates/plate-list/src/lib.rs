mod core;
pub mod ids;
pub mod list;
mod markup;
mod ops;
mod plugin;
mod serde_value;

pub use crate::core::*;
pub use crate::ids::*;
pub use crate::list::*;
pub use crate::markup::*;
pub use crate::ops::*;
pub use crate::plugin::*;
pub use crate::serde_value::*;
