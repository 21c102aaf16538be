use log::error;

use super::{DependencyKind, EntityKind, Node};
use crate::{
    context::RequestContext,
    fallible::{ResolveError, ResolveResult},
};

/// A hook consulted after the built-in dispatch. Returning ``Some`` replaces
/// whatever type was resolved so far.
pub type NodeTypeHook = Box<dyn Fn(&Node) -> Option<String> + Send + Sync>;

/// Determines the GraphQL object type of a [`Node`]
///
/// Built once when the schema is assembled and shared read-only by all
/// requests afterwards.
#[derive(Default)]
pub struct NodeTypeResolver {
    hooks: Vec<NodeTypeHook>,
}

impl NodeTypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook for node types the built-in dispatch does not know
    /// about, or to override its answer. Hooks run in registration order.
    pub fn register<F>(&mut self, hook: F)
    where
        F: Fn(&Node) -> Option<String> + Send + Sync + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    pub async fn resolve_type(&self, ctx: &RequestContext, node: &Node) -> ResolveResult<String> {
        let mut type_name = self.builtin_type(ctx, node).await?;

        for hook in &self.hooks {
            if let Some(name) = hook(node) {
                type_name = Some(name);
            }
        }

        match type_name.filter(|name| !name.is_empty()) {
            Some(name) => Ok(ucfirst(&name)),
            None => {
                error!(
                    "no type was found matching the {} node {}",
                    node.kind(),
                    node.key()
                );
                Err(ResolveError::UnresolvedNodeType(node.kind().to_string()))
            }
        }
    }

    async fn builtin_type(&self, ctx: &RequestContext, node: &Node) -> ResolveResult<Option<String>> {
        let registry = ctx.registry();
        Ok(match node {
            Node::Post(post) => {
                let mut post_type = None;
                if post.is_revision() {
                    if let Some(parent_id) = post.parent_id {
                        // revisions are exposed as the type of the post they revise, even
                        // when the viewer may not read that post
                        if let Some(Node::Post(parent)) = ctx
                            .get_unchecked(EntityKind::Post, &parent_id.to_string())
                            .await?
                        {
                            post_type = Some(parent.post_type);
                        }
                    }
                }
                let post_type = post_type.unwrap_or_else(|| post.post_type.clone());
                registry
                    .content_type(&post_type)
                    .map(|t| t.graphql_single_name.clone())
            }
            Node::Term(term) => registry
                .taxonomy(&term.taxonomy)
                .map(|t| t.graphql_single_name.clone()),
            Node::Comment(_) => Some("Comment".to_string()),
            Node::ContentType(_) => Some("ContentType".to_string()),
            Node::Taxonomy(_) => Some("Taxonomy".to_string()),
            Node::Theme(_) => Some("Theme".to_string()),
            Node::User(_) => Some("User".to_string()),
            Node::Plugin(_) => Some("Plugin".to_string()),
            Node::CommentAuthor(_) => Some("CommentAuthor".to_string()),
            Node::Menu(_) => Some("Menu".to_string()),
            Node::UserRole(_) => Some("UserRole".to_string()),
            Node::Dependency(dependency) => Some(
                match dependency.kind {
                    DependencyKind::Script => "EnqueuedScript",
                    DependencyKind::Stylesheet => "EnqueuedStylesheet",
                }
                .to_string(),
            ),
        })
    }
}

pub(crate) fn ucfirst(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::ucfirst;

    #[test]
    fn test_ucfirst() {
        assert_eq!(ucfirst("post"), "Post");
        assert_eq!(ucfirst("Page"), "Page");
        assert_eq!(ucfirst("ébook"), "Ébook");
        assert_eq!(ucfirst(""), "");
    }
}
