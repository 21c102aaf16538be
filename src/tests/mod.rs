mod fixtures;

mod loader;
mod node;
mod schema;
mod uri;
