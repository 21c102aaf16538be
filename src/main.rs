use std::sync::Arc;

use actix_web::{guard, post, web, App, HttpMessage, HttpRequest, HttpResponse, HttpServer, Result};

use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql::{Response, ServerError};
use async_graphql_actix_web::GraphQLRequest;

use log::{error, info, warn};

use content_graph::config::Config;
use content_graph::context::RequestContext;
use content_graph::graphql::{build_schema, GraphQLSchema};
use content_graph::node::NodeTypeResolver;
use content_graph::store::{ContentStore, MemoryStore, Viewer};

const GRAPHQL_ENDPOINT: &str = "/graphql";
const GRAPHQL_PLAYGROUND_ENDPOINT: &str = "/playground";

/// Shared by every request
struct AppState {
    config: Config,
    schema: GraphQLSchema,
    store: Arc<dyn ContentStore>,
    node_types: Arc<NodeTypeResolver>,
}

#[post("/graphql")]
async fn execute_graphql(
    state: web::Data<AppState>,
    req: GraphQLRequest,
    http_request: HttpRequest,
) -> HttpResponse {
    // every request gets fresh loaders and thus a fresh cache
    let context = RequestContext::new(
        state.store.clone(),
        Viewer::anonymous(),
        state.node_types.clone(),
        state.config.connections,
        state.config.loader,
    );
    let req = req.into_inner().data(context);

    let response = match tokio::time::timeout(
        state.config.request_timeout(),
        state.schema.execute(req),
    )
    .await
    {
        Ok(response) => response,
        Err(_) => {
            warn!(
                "A request took longer than {}s and was cancelled",
                state.config.request_timeout_secs
            );
            Response::from_errors(vec![ServerError::new("The request timed out", None)])
        }
    };

    let body = match http_request.content_type() {
        "application/json" => serde_json::to_vec(&response).map_err(anyhow::Error::from),
        _ => serde_cbor::to_vec(&response).map_err(anyhow::Error::from),
    };
    match body {
        Ok(body) => HttpResponse::Ok()
            .content_type(match http_request.content_type() {
                "application/json" => "application/json",
                _ => "application/cbor",
            })
            .body(body),
        Err(e) => {
            error!("Cannot serialize the response: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn getsdl(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().body(state.schema.sdl())
}

async fn playground() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(playground_source(GraphQLPlaygroundConfig::new(
            GRAPHQL_ENDPOINT,
        ))))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    // Load config
    let config = Config::load()?;

    let store: Arc<dyn ContentStore> = Arc::new(MemoryStore::load(&config.content_path)?);

    // build the graphql schema
    let schema = build_schema(store.registry())?;

    let listen = config.listen.clone();
    let state = web::Data::new(AppState {
        config,
        schema,
        store,
        node_types: Arc::new(NodeTypeResolver::new()),
    });

    info!("Starting http server on {}", listen);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(execute_graphql)
            .route("/graphql/sdl", web::get().to(getsdl))
            .service(
                web::resource(GRAPHQL_PLAYGROUND_ENDPOINT)
                    .guard(guard::Get())
                    .to(playground),
            )
    })
    .bind(listen)?
    .run()
    .await?;
    Ok(())
}
