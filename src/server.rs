use crate::api::{
    api_add_category, api_add_snippet, api_delete_snippet, api_delete_variable, api_expand,
    api_export_snippets, api_export_variables, api_get_categories, api_get_snippets,
    api_get_variables, api_import_snippets, api_import_variables, api_set_variable,
    api_update_snippet,
};
use crate::config::EngineConfig;
use crate::context::ResolutionContext;
use crate::error::Result;
use crate::models::Snippet;
use crate::services::Services;
use crate::storage::Store;
use crate::template::TemplateEngine;
use serde::Deserialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;
use warp::hyper::body::Bytes;
use warp::Filter;

/// What every route handler shares
pub struct AppState {
    pub store: Arc<Store>,
    pub engine: Arc<TemplateEngine>,
    listener: JoinHandle<()>,
}

impl AppState {
    /// Build the engine over `store` and keep its context following store writes.
    /// Must be called inside a tokio runtime.
    pub fn new(store: Arc<Store>, services: Services, config: EngineConfig) -> Result<Self> {
        let (context, listener) = ResolutionContext::follow(Arc::clone(&store))?;
        let engine = Arc::new(TemplateEngine::new(context, services, config));
        Ok(Self {
            store,
            engine,
            listener,
        })
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[derive(Deserialize)]
struct DeleteSnippet {
    id: String,
}

#[derive(Deserialize)]
struct AddCategory {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetVariable {
    name: String,
    value: String,
    #[serde(default)]
    old_name: Option<String>,
}

#[derive(Deserialize)]
struct DeleteVariable {
    name: String,
}

#[derive(Deserialize)]
struct ExpandRequest {
    template: String,
}

#[derive(Deserialize)]
struct ImportQuery {
    policy: Option<String>,
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&state))
}

/// Every API route, without CORS
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let get_snippets = warp::path!("api" / "snippets")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: Arc<AppState>| warp::reply::json(&api_get_snippets(&state.store)));

    let add_snippet = warp::path!("api" / "snippets")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .map(|body: Snippet, state: Arc<AppState>| {
            warp::reply::json(&api_add_snippet(&state.store, body))
        });

    let update_snippet = warp::path!("api" / "snippets")
        .and(warp::put())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .map(|body: Snippet, state: Arc<AppState>| {
            warp::reply::json(&api_update_snippet(&state.store, body))
        });

    let delete_snippet = warp::path!("api" / "snippets")
        .and(warp::delete())
        .and(warp::query::<DeleteSnippet>())
        .and(with_state(state.clone()))
        .map(|query: DeleteSnippet, state: Arc<AppState>| {
            warp::reply::json(&api_delete_snippet(&state.store, &query.id))
        });

    let get_categories = warp::path!("api" / "categories")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: Arc<AppState>| warp::reply::json(&api_get_categories(&state.store)));

    let add_category = warp::path!("api" / "categories")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .map(|body: AddCategory, state: Arc<AppState>| {
            warp::reply::json(&api_add_category(&state.store, &body.name))
        });

    let get_variables = warp::path!("api" / "variables")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: Arc<AppState>| warp::reply::json(&api_get_variables(&state.store)));

    let set_variable = warp::path!("api" / "variables")
        .and(warp::put())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .map(|body: SetVariable, state: Arc<AppState>| {
            warp::reply::json(&api_set_variable(
                &state.store,
                &body.name,
                &body.value,
                body.old_name.as_deref(),
            ))
        });

    let delete_variable = warp::path!("api" / "variables")
        .and(warp::delete())
        .and(warp::query::<DeleteVariable>())
        .and(with_state(state.clone()))
        .map(|query: DeleteVariable, state: Arc<AppState>| {
            warp::reply::json(&api_delete_variable(&state.store, &query.name))
        });

    let expand = warp::path!("api" / "expand")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(|body: ExpandRequest, state: Arc<AppState>| async move {
            let response = api_expand(&state.engine, &body.template).await;
            Ok::<_, Infallible>(warp::reply::json(&response))
        });

    let export_snippets = warp::path!("api" / "export" / "snippets")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: Arc<AppState>| warp::reply::json(&api_export_snippets(&state.store)));

    let export_variables = warp::path!("api" / "export" / "variables")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: Arc<AppState>| warp::reply::json(&api_export_variables(&state.store)));

    let import_snippets = warp::path!("api" / "import" / "snippets")
        .and(warp::post())
        .and(warp::query::<ImportQuery>())
        .and(warp::body::bytes())
        .and(with_state(state.clone()))
        .map(|query: ImportQuery, body: Bytes, state: Arc<AppState>| {
            warp::reply::json(&api_import_snippets(
                &state.store,
                &body,
                query.policy.as_deref(),
            ))
        });

    let import_variables = warp::path!("api" / "import" / "variables")
        .and(warp::post())
        .and(warp::query::<ImportQuery>())
        .and(warp::body::bytes())
        .and(with_state(state))
        .map(|query: ImportQuery, body: Bytes, state: Arc<AppState>| {
            warp::reply::json(&api_import_variables(
                &state.store,
                &body,
                query.policy.as_deref(),
            ))
        });

    // Health check endpoint
    let health = warp::path!("health").map(|| "Quickfill API is running");

    get_snippets
        .or(add_snippet)
        .or(update_snippet)
        .or(delete_snippet)
        .or(get_categories)
        .or(add_category)
        .or(get_variables)
        .or(set_variable)
        .or(delete_variable)
        .or(expand)
        .or(export_snippets)
        .or(export_variables)
        .or(import_snippets)
        .or(import_variables)
        .or(health)
}

pub async fn start_api_server(state: Arc<AppState>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting API server on http://{}", addr);

    // CORS for the browser extension and local tools
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["Content-Type"])
        .allow_methods(vec!["GET", "POST", "DELETE", "PUT"]);

    warp::serve(routes(state).with(cors)).run(addr).await;

    Ok(())
}
