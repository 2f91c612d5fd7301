/// The typography table used by the blog.
pub mod defaults;
/// [`Component`] and [`ComponentTable`].
pub mod types;

pub use types::{Component, ComponentTable};
