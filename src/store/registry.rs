use serde::Deserialize;

use crate::node::{ContentType, Taxonomy, UserRole};

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FrontPage {
    /// The front page lists the latest posts
    #[default]
    Posts,
    /// A static page is the front page
    Page,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ReadingSettings {
    #[serde(default)]
    pub show_on_front: FrontPage,
    #[serde(default)]
    pub page_on_front: Option<i64>,
    #[serde(default)]
    pub page_for_posts: Option<i64>,
    /// Permalink structure of the ``post`` type, e.g. ``/%year%/%postname%/``
    #[serde(default = "default_permalink_structure")]
    pub permalink_structure: String,
    #[serde(default = "default_author_base")]
    pub author_base: String,
}

impl Default for ReadingSettings {
    fn default() -> Self {
        Self {
            show_on_front: FrontPage::default(),
            page_on_front: None,
            page_for_posts: None,
            permalink_structure: default_permalink_structure(),
            author_base: default_author_base(),
        }
    }
}

fn default_permalink_structure() -> String {
    "/%postname%/".to_string()
}

fn default_author_base() -> String {
    "author".to_string()
}

/// The registered content types, taxonomies and roles
///
/// Shared read-only by every request.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Registry {
    #[serde(default)]
    pub content_types: Vec<ContentType>,
    #[serde(default)]
    pub taxonomies: Vec<Taxonomy>,
    #[serde(default)]
    pub roles: Vec<UserRole>,
    #[serde(default)]
    pub settings: ReadingSettings,
}

impl Registry {
    pub fn content_type(&self, name: &str) -> Option<&ContentType> {
        self.content_types.iter().find(|t| t.name == name)
    }

    pub fn taxonomy(&self, name: &str) -> Option<&Taxonomy> {
        self.taxonomies.iter().find(|t| t.name == name)
    }

    pub fn role(&self, name: &str) -> Option<&UserRole> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn public_content_types(&self) -> impl Iterator<Item = &ContentType> {
        self.content_types.iter().filter(|t| t.public)
    }
}
