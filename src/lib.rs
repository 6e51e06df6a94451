pub mod form;
pub mod prelude;
pub mod tree;

#[cfg(test)]
mod test_public_api;

pub use tree::{Children, FormNode, NodeRole, provide_form_context};
