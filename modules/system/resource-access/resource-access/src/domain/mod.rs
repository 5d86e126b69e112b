pub mod collaborators;
pub mod filter;
pub mod handlers;
pub mod id_codec;
pub mod locator;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod service;
pub mod shape;
