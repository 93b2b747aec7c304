use crate::error::QuickfillError;
use crate::models::{Snippet, Variables};
use crate::storage::Store;
use crate::template::TemplateEngine;
use crate::transfer::{self, ConflictPolicy, ImportReport};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

// Get all snippets
pub fn api_get_snippets(store: &Store) -> ApiResponse<Vec<Snippet>> {
    match store.load_snippets() {
        Ok(snippets) => ApiResponse::success(snippets),
        Err(e) => ApiResponse::error(format!("Failed to load snippets: {}", e)),
    }
}

// Add a new snippet; any id sent by the client is ignored
pub fn api_add_snippet(store: &Store, mut snippet: Snippet) -> ApiResponse<Snippet> {
    snippet.id.clear();
    match store.save_snippet(snippet) {
        Ok(saved) => ApiResponse::success(saved),
        Err(e) => ApiResponse::error(format!("Failed to add snippet: {}", e)),
    }
}

// Update an existing snippet by id
pub fn api_update_snippet(store: &Store, snippet: Snippet) -> ApiResponse<Snippet> {
    let exists = store
        .load_snippets()
        .map(|snippets| snippets.iter().any(|s| !snippet.id.is_empty() && s.id == snippet.id));
    let result = match exists {
        Ok(true) => store.save_snippet(snippet),
        Ok(false) => Err(QuickfillError::NotFound(format!("snippet '{}'", snippet.id))),
        Err(e) => Err(e),
    };
    match result {
        Ok(saved) => ApiResponse::success(saved),
        Err(e) => ApiResponse::error(format!("Failed to update snippet: {}", e)),
    }
}

// Delete a snippet
pub fn api_delete_snippet(store: &Store, id: &str) -> ApiResponse<()> {
    match store.delete_snippet(id) {
        Ok(_) => ApiResponse::success(()),
        Err(e) => ApiResponse::error(format!("Failed to delete snippet: {}", e)),
    }
}

pub fn api_get_categories(store: &Store) -> ApiResponse<Vec<String>> {
    match store.load_categories() {
        Ok(categories) => ApiResponse::success(categories),
        Err(e) => ApiResponse::error(format!("Failed to load categories: {}", e)),
    }
}

pub fn api_add_category(store: &Store, name: &str) -> ApiResponse<()> {
    match store.save_category(name) {
        Ok(_) => ApiResponse::success(()),
        Err(e) => ApiResponse::error(format!("Failed to add category: {}", e)),
    }
}

pub fn api_get_variables(store: &Store) -> ApiResponse<Variables> {
    match store.load_custom_variables() {
        Ok(variables) => ApiResponse::success(variables),
        Err(e) => ApiResponse::error(format!("Failed to load variables: {}", e)),
    }
}

// Set a variable, renaming it from `old_name` when given
pub fn api_set_variable(
    store: &Store,
    name: &str,
    value: &str,
    old_name: Option<&str>,
) -> ApiResponse<()> {
    match store.save_custom_variable(name, value, old_name) {
        Ok(_) => ApiResponse::success(()),
        Err(e) => ApiResponse::error(format!("Failed to save variable: {}", e)),
    }
}

pub fn api_delete_variable(store: &Store, name: &str) -> ApiResponse<()> {
    match store.delete_custom_variable(name) {
        Ok(_) => ApiResponse::success(()),
        Err(e) => ApiResponse::error(format!("Failed to delete variable: {}", e)),
    }
}

// Expand a template against the live snippets and variables
pub async fn api_expand(engine: &TemplateEngine, template: &str) -> ApiResponse<String> {
    ApiResponse::success(engine.expand(template).await)
}

pub fn api_export_snippets(store: &Store) -> ApiResponse<String> {
    match store
        .load_snippets()
        .and_then(|snippets| transfer::export_snippets(&snippets))
    {
        Ok(json) => ApiResponse::success(json),
        Err(e) => ApiResponse::error(format!("Failed to export snippets: {}", e)),
    }
}

pub fn api_export_variables(store: &Store) -> ApiResponse<String> {
    match store
        .load_custom_variables()
        .and_then(|variables| transfer::export_variables(&variables))
    {
        Ok(json) => ApiResponse::success(json),
        Err(e) => ApiResponse::error(format!("Failed to export variables: {}", e)),
    }
}

fn parse_policy(policy: Option<&str>) -> Result<ConflictPolicy, QuickfillError> {
    policy.map_or(Ok(ConflictPolicy::default()), |p| p.parse())
}

fn import_body(body: &[u8]) -> Result<&str, QuickfillError> {
    std::str::from_utf8(body)
        .map_err(|e| QuickfillError::InvalidImport(format!("body is not valid UTF-8: {}", e)))
}

pub fn api_import_snippets(store: &Store, body: &[u8], policy: Option<&str>) -> ApiResponse<ImportReport> {
    match parse_policy(policy).and_then(|policy| {
        let json = import_body(body)?;
        transfer::import_snippets(store, json, policy)
    }) {
        Ok(report) => ApiResponse::success(report),
        Err(e) => ApiResponse::error(format!("Failed to import snippets: {}", e)),
    }
}

pub fn api_import_variables(store: &Store, body: &[u8], policy: Option<&str>) -> ApiResponse<ImportReport> {
    match parse_policy(policy).and_then(|policy| {
        let json = import_body(body)?;
        transfer::import_variables(store, json, policy)
    }) {
        Ok(report) => ApiResponse::success(report),
        Err(e) => ApiResponse::error(format!("Failed to import variables: {}", e)),
    }
}
