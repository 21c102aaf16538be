//! Connection, edge and page info types plus the arguments of connection
//! fields
use async_graphql::{
    dynamic::{
        Enum, Field, FieldFuture, FieldValue, InputObject, InputValue, Object, ObjectAccessor,
        ResolverContext, SchemaBuilder, TypeRef,
    },
    ErrorExtensions, Value,
};
use chrono::NaiveDateTime;

use super::fields::{typed, DATE_FORMAT};
use crate::{
    connection::{
        Comments, Connection, ConnectionArgs, ConnectionKind, ConnectionResolver, Edge, PageInfo,
        Plugins, Posts, Terms, Themes, UserRoles, Users,
    },
    context::RequestContext,
    fallible::ResolveError,
    node::{CommentStatus, Node, PostStatus},
    store::{
        CommentCriteria, OrderField, PluginCriteria, PluginStatus, PostCriteria, SortDirection,
        TermCriteria, UserCriteria, UserSearchColumn,
    },
};

pub const PAGE_INFO: &str = "PageInfo";
pub const ORDER_ENUM: &str = "OrderEnum";
pub const POST_STATUS_ENUM: &str = "PostStatusEnum";
pub const COMMENT_STATUS_ENUM: &str = "CommentStatusEnum";
pub const PLUGIN_STATUS_ENUM: &str = "PluginStatusEnum";
pub const USER_SEARCH_COLUMN_ENUM: &str = "UsersConnectionSearchColumnEnum";

/// The graphql side of a [`ConnectionKind`]
pub trait GraphKind: ConnectionKind {
    /// Prefix of the input and enum types of the kind
    const PREFIX: &'static str;

    /// Values of the orderby enum, each one parses as an [`OrderField`]
    const ORDER_FIELDS: &'static [&'static str];

    /// The fields of the ``where`` input, if the kind has one
    fn where_fields() -> Vec<InputValue> {
        Vec::new()
    }

    fn parse_where(input: &ObjectAccessor) -> async_graphql::Result<Self::Where>;

    fn where_input_name() -> String {
        format!("{}ConnectionWhereArgs", Self::PREFIX)
    }

    fn orderby_enum_name() -> String {
        format!("{}ConnectionOrderbyEnum", Self::PREFIX)
    }

    fn orderby_input_name() -> String {
        format!("{}ConnectionOrderbyInput", Self::PREFIX)
    }
}

fn list_of(ty: &str) -> TypeRef {
    TypeRef::named_list(ty)
}

impl GraphKind for Users {
    const PREFIX: &'static str = "User";
    const ORDER_FIELDS: &'static [&'static str] =
        &["LOGIN", "NICENAME", "DISPLAY_NAME", "EMAIL", "URL", "REGISTERED", "ID"];

    fn where_fields() -> Vec<InputValue> {
        vec![
            InputValue::new("role", TypeRef::named(TypeRef::STRING))
                .description("Users must have this role."),
            InputValue::new("roleIn", list_of(TypeRef::STRING))
                .description("Users must have at least one of these roles."),
            InputValue::new("roleNotIn", list_of(TypeRef::STRING)),
            InputValue::new("include", list_of(TypeRef::INT)),
            InputValue::new("exclude", list_of(TypeRef::INT)),
            InputValue::new("search", TypeRef::named(TypeRef::STRING)).description(
                "Leading and trailing wildcards are implied. Without searchColumns the \
                 columns are picked from the search term.",
            ),
            InputValue::new("searchColumns", list_of(USER_SEARCH_COLUMN_ENUM)),
            InputValue::new("nicename", TypeRef::named(TypeRef::STRING)),
            InputValue::new("nicenameIn", list_of(TypeRef::STRING)),
            InputValue::new("nicenameNotIn", list_of(TypeRef::STRING)),
            InputValue::new("login", TypeRef::named(TypeRef::STRING)),
            InputValue::new("loginIn", list_of(TypeRef::STRING)),
            InputValue::new("loginNotIn", list_of(TypeRef::STRING)),
            InputValue::new("hasPublishedPosts", list_of(TypeRef::STRING))
                .description("Only users with published posts of these content types."),
        ]
    }

    fn parse_where(input: &ObjectAccessor) -> async_graphql::Result<UserCriteria> {
        let search_columns = enums(input, "searchColumns")?
            .iter()
            .map(|column| {
                column
                    .parse::<UserSearchColumn>()
                    .map_err(|e| ResolveError::InvalidArgument(e).extend())
            })
            .collect::<async_graphql::Result<_>>()?;

        Ok(UserCriteria {
            role: string(input, "role")?,
            role_in: strings(input, "roleIn")?,
            role_not_in: strings(input, "roleNotIn")?,
            include: ints(input, "include")?,
            exclude: ints(input, "exclude")?,
            search: string(input, "search")?,
            search_columns,
            nicename: string(input, "nicename")?,
            nicename_in: strings(input, "nicenameIn")?,
            nicename_not_in: strings(input, "nicenameNotIn")?,
            login: string(input, "login")?,
            login_in: strings(input, "loginIn")?,
            login_not_in: strings(input, "loginNotIn")?,
            has_published_posts: strings(input, "hasPublishedPosts")?,
        })
    }
}

impl GraphKind for Posts {
    const PREFIX: &'static str = "ContentNode";
    const ORDER_FIELDS: &'static [&'static str] =
        &["DATE", "MODIFIED", "TITLE", "MENU_ORDER", "SLUG", "ID"];

    fn where_fields() -> Vec<InputValue> {
        vec![
            InputValue::new("contentTypes", list_of(TypeRef::STRING)),
            InputValue::new("status", list_of(POST_STATUS_ENUM))
                .description("Defaults to published content only."),
            InputValue::new("author", TypeRef::named(TypeRef::INT)),
            InputValue::new("parent", TypeRef::named(TypeRef::INT))
                .description("0 selects top level content."),
            InputValue::new("in", list_of(TypeRef::INT)),
            InputValue::new("notIn", list_of(TypeRef::INT)),
            InputValue::new("search", TypeRef::named(TypeRef::STRING)),
            InputValue::new("name", TypeRef::named(TypeRef::STRING)).description("The slug"),
            InputValue::new("termId", TypeRef::named(TypeRef::INT)),
        ]
    }

    fn parse_where(input: &ObjectAccessor) -> async_graphql::Result<PostCriteria> {
        let statuses = enums(input, "status")?
            .iter()
            .map(|status| {
                PostStatus::parse(status).ok_or_else(|| {
                    ResolveError::invalid_argument(format!("{} is not a post status.", status))
                        .extend()
                })
            })
            .collect::<async_graphql::Result<_>>()?;

        Ok(PostCriteria {
            content_types: strings(input, "contentTypes")?,
            statuses,
            author: int(input, "author")?,
            parent: int(input, "parent")?,
            include: ints(input, "in")?,
            exclude: ints(input, "notIn")?,
            search: string(input, "search")?,
            name: string(input, "name")?,
            term_id: int(input, "termId")?,
        })
    }
}

impl GraphKind for Terms {
    const PREFIX: &'static str = "Term";
    const ORDER_FIELDS: &'static [&'static str] = &["NAME", "SLUG", "COUNT", "ID"];

    fn where_fields() -> Vec<InputValue> {
        vec![
            InputValue::new("taxonomies", list_of(TypeRef::STRING)),
            InputValue::new("include", list_of(TypeRef::INT)),
            InputValue::new("exclude", list_of(TypeRef::INT)),
            InputValue::new("parent", TypeRef::named(TypeRef::INT))
                .description("0 selects top level terms."),
            InputValue::new("slug", list_of(TypeRef::STRING)),
            InputValue::new("search", TypeRef::named(TypeRef::STRING)),
            InputValue::new("hideEmpty", TypeRef::named(TypeRef::BOOLEAN)),
            InputValue::new("objectId", TypeRef::named(TypeRef::INT))
                .description("Only terms assigned to this content node."),
        ]
    }

    fn parse_where(input: &ObjectAccessor) -> async_graphql::Result<TermCriteria> {
        Ok(TermCriteria {
            taxonomies: strings(input, "taxonomies")?,
            include: ints(input, "include")?,
            exclude: ints(input, "exclude")?,
            parent: int(input, "parent")?,
            slug: strings(input, "slug")?,
            search: string(input, "search")?,
            hide_empty: boolean(input, "hideEmpty")?.unwrap_or(false),
            object_id: int(input, "objectId")?,
        })
    }
}

impl GraphKind for Comments {
    const PREFIX: &'static str = "Comment";
    const ORDER_FIELDS: &'static [&'static str] = &["DATE", "ID"];

    fn where_fields() -> Vec<InputValue> {
        vec![
            InputValue::new("contentId", TypeRef::named(TypeRef::INT)),
            InputValue::new("authorId", TypeRef::named(TypeRef::INT)),
            InputValue::new("parent", TypeRef::named(TypeRef::INT))
                .description("0 selects top level comments."),
            InputValue::new("status", TypeRef::named(COMMENT_STATUS_ENUM))
                .description("Defaults to approved comments."),
            InputValue::new("in", list_of(TypeRef::INT)),
            InputValue::new("notIn", list_of(TypeRef::INT)),
            InputValue::new("search", TypeRef::named(TypeRef::STRING)),
        ]
    }

    fn parse_where(input: &ObjectAccessor) -> async_graphql::Result<CommentCriteria> {
        let status = match enums(input, "status")?.first() {
            Some(status) => Some(CommentStatus::parse(status).ok_or_else(|| {
                ResolveError::invalid_argument(format!("{} is not a comment status.", status))
                    .extend()
            })?),
            None => None,
        };

        Ok(CommentCriteria {
            content_id: int(input, "contentId")?,
            author_id: int(input, "authorId")?,
            parent: int(input, "parent")?,
            status,
            include: ints(input, "in")?,
            exclude: ints(input, "notIn")?,
            search: string(input, "search")?,
        })
    }
}

impl GraphKind for Plugins {
    const PREFIX: &'static str = "Plugin";
    const ORDER_FIELDS: &'static [&'static str] = &["NAME"];

    fn where_fields() -> Vec<InputValue> {
        vec![
            InputValue::new("search", TypeRef::named(TypeRef::STRING)),
            InputValue::new("status", TypeRef::named(PLUGIN_STATUS_ENUM)),
        ]
    }

    fn parse_where(input: &ObjectAccessor) -> async_graphql::Result<PluginCriteria> {
        let status = match enums(input, "status")?.first().map(String::as_str) {
            Some("ACTIVE") => Some(PluginStatus::Active),
            Some("INACTIVE") => Some(PluginStatus::Inactive),
            Some(other) => {
                return Err(ResolveError::invalid_argument(format!(
                    "{} is not a plugin status.",
                    other
                ))
                .extend())
            }
            None => None,
        };
        Ok(PluginCriteria {
            search: string(input, "search")?,
            status,
        })
    }
}

impl GraphKind for Themes {
    const PREFIX: &'static str = "Theme";
    const ORDER_FIELDS: &'static [&'static str] = &["NAME"];

    fn parse_where(_: &ObjectAccessor) -> async_graphql::Result<()> {
        Ok(())
    }
}

impl GraphKind for UserRoles {
    const PREFIX: &'static str = "UserRole";
    const ORDER_FIELDS: &'static [&'static str] = &["NAME"];

    fn parse_where(_: &ObjectAccessor) -> async_graphql::Result<()> {
        Ok(())
    }
}

/// Registers the ``where`` and ``orderby`` inputs of a kind
pub fn register_kind<K: GraphKind>(builder: SchemaBuilder) -> SchemaBuilder {
    let order_enum = K::ORDER_FIELDS
        .iter()
        .fold(Enum::new(K::orderby_enum_name()), |e, value| e.item(*value));
    let orderby = InputObject::new(K::orderby_input_name())
        .field(InputValue::new("field", TypeRef::named_nn(K::orderby_enum_name())))
        .field(InputValue::new("order", TypeRef::named(ORDER_ENUM)));

    let builder = builder.register(order_enum).register(orderby);

    let fields = K::where_fields();
    if fields.is_empty() {
        return builder;
    }
    builder.register(
        fields
            .into_iter()
            .fold(InputObject::new(K::where_input_name()), |input, field| {
                input.field(field)
            }),
    )
}

/// Registers the enums and the page info shared by every connection
pub fn register_shared(builder: SchemaBuilder) -> SchemaBuilder {
    let enum_of = |name: &str, values: &[&str]| {
        values
            .iter()
            .fold(Enum::new(name), |e, value| e.item(*value))
    };

    builder
        .register(enum_of(ORDER_ENUM, &["ASC", "DESC"]))
        .register(enum_of(
            POST_STATUS_ENUM,
            &[
                "PUBLISH",
                "FUTURE",
                "DRAFT",
                "PENDING",
                "PRIVATE",
                "TRASH",
                "AUTO_DRAFT",
                "INHERIT",
            ],
        ))
        .register(enum_of(
            COMMENT_STATUS_ENUM,
            &["APPROVE", "HOLD", "SPAM", "TRASH"],
        ))
        .register(enum_of(PLUGIN_STATUS_ENUM, &["ACTIVE", "INACTIVE"]))
        .register(enum_of(
            USER_SEARCH_COLUMN_ENUM,
            &["ID", "LOGIN", "NICENAME", "DISPLAY_NAME", "EMAIL", "URL"],
        ))
        .register(page_info())
}

fn page_info() -> Object {
    fn flag(name: &str, get: fn(&PageInfo) -> bool) -> Field {
        Field::new(name, TypeRef::named_nn(TypeRef::BOOLEAN), move |ctx| {
            FieldFuture::new(async move {
                let page_info = ctx.parent_value.try_downcast_ref::<PageInfo>()?;
                Ok(Some(FieldValue::value(get(page_info))))
            })
        })
    }
    fn cursor(name: &str, get: fn(&PageInfo) -> &Option<String>) -> Field {
        Field::new(name, TypeRef::named(TypeRef::STRING), move |ctx| {
            FieldFuture::new(async move {
                let page_info = ctx.parent_value.try_downcast_ref::<PageInfo>()?;
                Ok(get(page_info).clone().map(FieldValue::value))
            })
        })
    }

    Object::new(PAGE_INFO)
        .description("Information about pagination in a connection.")
        .field(flag("hasNextPage", |p| p.has_next_page))
        .field(flag("hasPreviousPage", |p| p.has_previous_page))
        .field(cursor("startCursor", |p| &p.start_cursor))
        .field(cursor("endCursor", |p| &p.end_cursor))
}

/// ``{name}Connection`` and ``{name}ConnectionEdge`` over nodes of
/// ``node_type``
pub fn connection_types(name: &str, node_type: &str) -> [Object; 2] {
    let edge_name = format!("{}ConnectionEdge", name);

    let connection = Object::new(format!("{}Connection", name))
        .field(Field::new(
            "edges",
            TypeRef::named_nn_list_nn(edge_name.clone()),
            |ctx| {
                FieldFuture::new(async move {
                    let connection = ctx.parent_value.try_downcast_ref::<Connection>()?;
                    Ok(Some(FieldValue::list(
                        connection
                            .edges
                            .iter()
                            .map(|edge| FieldValue::borrowed_any(edge)),
                    )))
                })
            },
        ))
        .field(Field::new(
            "nodes",
            TypeRef::named_nn_list_nn(node_type),
            |ctx| {
                FieldFuture::new(async move {
                    let connection = ctx.parent_value.try_downcast_ref::<Connection>()?;
                    let request = ctx.data::<RequestContext>()?;
                    let mut nodes = Vec::with_capacity(connection.edges.len());
                    for node in connection.nodes() {
                        nodes.push(typed(request, node).await?);
                    }
                    Ok(Some(FieldValue::list(nodes)))
                })
            },
        ))
        .field(Field::new(
            "pageInfo",
            TypeRef::named_nn(PAGE_INFO),
            |ctx| {
                FieldFuture::new(async move {
                    let connection = ctx.parent_value.try_downcast_ref::<Connection>()?;
                    Ok(Some(FieldValue::borrowed_any(&connection.page_info)))
                })
            },
        ));

    [connection, edge_type(&edge_name, node_type)]
}

/// An edge object over [`Edge`] parent values
pub fn edge_type(name: &str, node_type: &str) -> Object {
    Object::new(name)
        .field(Field::new(
            "cursor",
            TypeRef::named_nn(TypeRef::STRING),
            |ctx| {
                FieldFuture::new(async move {
                    let edge = ctx.parent_value.try_downcast_ref::<Edge>()?;
                    Ok(Some(FieldValue::value(edge.cursor.clone())))
                })
            },
        ))
        .field(Field::new("node", TypeRef::named_nn(node_type), |ctx| {
            FieldFuture::new(async move {
                let edge = ctx.parent_value.try_downcast_ref::<Edge>()?;
                let request = ctx.data::<RequestContext>()?;
                Ok(Some(typed(request, &edge.node).await?))
            })
        }))
}

/// The edge of ``editingLockedBy``
pub struct EditLockEdge {
    pub edge: Edge,
    pub locked_at: NaiveDateTime,
}

pub fn edit_lock_edge_type(name: &str, node_type: &str) -> Object {
    Object::new(name)
        .field(Field::new(
            "cursor",
            TypeRef::named_nn(TypeRef::STRING),
            |ctx| {
                FieldFuture::new(async move {
                    let lock = ctx.parent_value.try_downcast_ref::<EditLockEdge>()?;
                    Ok(Some(FieldValue::value(lock.edge.cursor.clone())))
                })
            },
        ))
        .field(Field::new("node", TypeRef::named_nn(node_type), |ctx| {
            FieldFuture::new(async move {
                let lock = ctx.parent_value.try_downcast_ref::<EditLockEdge>()?;
                let request = ctx.data::<RequestContext>()?;
                Ok(Some(typed(request, &lock.edge.node).await?))
            })
        }))
        .field(
            Field::new(
                "lockTimestamp",
                TypeRef::named(TypeRef::STRING),
                |ctx| {
                    FieldFuture::new(async move {
                        let lock = ctx.parent_value.try_downcast_ref::<EditLockEdge>()?;
                        Ok(Some(FieldValue::value(
                            lock.locked_at.format(DATE_FORMAT).to_string(),
                        )))
                    })
                },
            )
            .description("When the lock was taken"),
        )
}

/// The ``orderby`` entries, the first one being the primary order
type OrderArg = Vec<(OrderField, Option<SortDirection>)>;

/// A connection field resolving through [`ConnectionResolver`]
///
/// ``scope`` narrows the filters to the parent, e.g. the comments of the
/// content node the field is on.
pub fn connection_field<K, S>(name: &str, connection_type: &str, scope: S) -> Field
where
    K: GraphKind,
    S: Fn(Option<&Node>, &mut K::Where) + Send + Sync + 'static,
{
    let field = Field::new(name, TypeRef::named(connection_type), move |ctx| {
        let prepared = prepare::<K, S>(&ctx, &scope);
        FieldFuture::new(async move {
            let (args, filter, order) = prepared?;
            let request = ctx.data::<RequestContext>()?;

            let mut resolver = ConnectionResolver::<K>::new(request, args).with_where(filter);
            for (field, direction) in order {
                resolver = resolver.order_by(field, direction);
            }
            let connection = resolver.get_connection().await.map_err(|e| e.extend())?;
            Ok(Some(FieldValue::owned_any(connection)))
        })
    })
    .argument(
        InputValue::new("first", TypeRef::named(TypeRef::INT))
            .description("The number of items to return after the referenced \"after\" cursor"),
    )
    .argument(
        InputValue::new("last", TypeRef::named(TypeRef::INT))
            .description("The number of items to return before the referenced \"before\" cursor"),
    )
    .argument(
        InputValue::new("after", TypeRef::named(TypeRef::STRING))
            .description("Cursor used along with the \"first\" argument"),
    )
    .argument(
        InputValue::new("before", TypeRef::named(TypeRef::STRING))
            .description("Cursor used along with the \"last\" argument"),
    )
    .argument(
        InputValue::new("orderby", TypeRef::named_list(K::orderby_input_name()))
            .description("Later entries break the ties of earlier ones"),
    );

    if K::where_fields().is_empty() {
        field
    } else {
        field.argument(InputValue::new("where", TypeRef::named(K::where_input_name())))
    }
}

fn prepare<K, S>(
    ctx: &ResolverContext,
    scope: &S,
) -> async_graphql::Result<(ConnectionArgs, K::Where, OrderArg)>
where
    K: GraphKind,
    S: Fn(Option<&Node>, &mut K::Where),
{
    let args = ConnectionArgs {
        first: int(&ctx.args, "first")?,
        last: int(&ctx.args, "last")?,
        after: string(&ctx.args, "after")?,
        before: string(&ctx.args, "before")?,
    };

    let mut filter = match ctx.args.get("where").filter(|v| !v.is_null()) {
        Some(input) => K::parse_where(&input.object()?)?,
        None => K::Where::default(),
    };
    scope(ctx.parent_value.try_downcast_ref::<Node>().ok(), &mut filter);

    let order = match ctx.args.get("orderby").filter(|v| !v.is_null()) {
        // a single input is accepted in place of a list of one
        Some(value) => match value.as_value() {
            Value::List(_) => value
                .list()?
                .iter()
                .filter(|v| !v.is_null())
                .map(|v| order_entry(&v.object()?))
                .collect::<async_graphql::Result<_>>()?,
            _ => vec![order_entry(&value.object()?)?],
        },
        None => Vec::new(),
    };

    Ok((args, filter, order))
}

fn order_entry(input: &ObjectAccessor) -> async_graphql::Result<(OrderField, Option<SortDirection>)> {
    let field = input
        .try_get("field")?
        .enum_name()?
        .parse::<OrderField>()
        .map_err(|e| ResolveError::InvalidArgument(e).extend())?;
    let direction = match input.get("order").filter(|v| !v.is_null()) {
        Some(order) => Some(
            order
                .enum_name()?
                .parse::<SortDirection>()
                .map_err(|e| ResolveError::InvalidArgument(e).extend())?,
        ),
        None => None,
    };
    Ok((field, direction))
}

fn string(input: &ObjectAccessor, name: &str) -> async_graphql::Result<Option<String>> {
    input
        .get(name)
        .filter(|v| !v.is_null())
        .map(|v| v.string().map(str::to_string))
        .transpose()
}

fn int(input: &ObjectAccessor, name: &str) -> async_graphql::Result<Option<i64>> {
    input
        .get(name)
        .filter(|v| !v.is_null())
        .map(|v| v.i64())
        .transpose()
}

fn boolean(input: &ObjectAccessor, name: &str) -> async_graphql::Result<Option<bool>> {
    input
        .get(name)
        .filter(|v| !v.is_null())
        .map(|v| v.boolean())
        .transpose()
}

fn strings(input: &ObjectAccessor, name: &str) -> async_graphql::Result<Vec<String>> {
    match input.get(name).filter(|v| !v.is_null()) {
        Some(list) => list
            .list()?
            .iter()
            .map(|v| v.string().map(str::to_string))
            .collect(),
        None => Ok(Vec::new()),
    }
}

fn ints(input: &ObjectAccessor, name: &str) -> async_graphql::Result<Vec<i64>> {
    match input.get(name).filter(|v| !v.is_null()) {
        Some(list) => list.list()?.iter().map(|v| v.i64()).collect(),
        None => Ok(Vec::new()),
    }
}

/// Reads an enum or a list of enums as their names
fn enums(input: &ObjectAccessor, name: &str) -> async_graphql::Result<Vec<String>> {
    let value = match input.get(name).filter(|v| !v.is_null()) {
        Some(value) => value,
        None => return Ok(Vec::new()),
    };
    match value.as_value() {
        Value::List(_) => value
            .list()?
            .iter()
            .map(|v| v.enum_name().map(str::to_string))
            .collect(),
        _ => Ok(vec![value.enum_name()?.to_string()]),
    }
}
