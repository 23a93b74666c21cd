//! Knowledge Graph Handlers
//!
//! Endpoints for knowledge graph management operations.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use axum::{extract::Path, Extension, Json};

use crate::protocol::rest::dto::{
    ApiResponse, CreateKnowledgeGraphRequest, KnowledgeGraphDto, KnowledgeGraphListDto,
    OntologyDefinition, OntologyStatusDto,
};
use crate::protocol::rest::error::RestError;
use crate::protocol::wire::WireValue;
use crate::protocol::Handler;

/// List all knowledge graphs
#[utoipa::path(
    get,
    path = "/knowledge-graphs",
    tag = "knowledge-graphs",
    responses(
        (status = 200, description = "List of knowledge graphs", body = ApiResponse<KnowledgeGraphListDto>),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn list_knowledge_graphs(
    Extension(handler): Extension<Arc<Handler>>,
) -> Result<Json<ApiResponse<KnowledgeGraphListDto>>, RestError> {
    let storage = handler.get_storage();

    let kg_names = storage.list_knowledge_graphs();
    let current_name = storage
        .current_knowledge_graph()
        .map(std::string::ToString::to_string);

    // Build knowledge graph list with basic info
    let knowledge_graphs: Vec<KnowledgeGraphDto> = kg_names
        .into_iter()
        .map(|name| KnowledgeGraphDto {
            name,
            description: None,
            relations_count: 0, // Would need to switch to each KG to count
            views_count: 0,
            ontologies: None,
        })
        .collect();

    drop(storage);

    // Check if current KG exists in the list
    let (current, warning) = if let Some(ref name) = current_name {
        if knowledge_graphs.iter().any(|kg| kg.name == *name) {
            (Some(name.clone()), None)
        } else {
            // Current KG doesn't exist - report warning and suggest first available
            let fallback = knowledge_graphs.first().map(|kg| kg.name.clone());
            (
                fallback,
                Some(format!("Knowledge graph '{name}' not found")),
            )
        }
    } else {
        (knowledge_graphs.first().map(|kg| kg.name.clone()), None)
    };

    let result = KnowledgeGraphListDto {
        knowledge_graphs,
        current,
        warning,
    };

    Ok(Json(ApiResponse::success(result)))
}

/// Get knowledge graph details
#[utoipa::path(
    get,
    path = "/knowledge-graphs/{name}",
    tag = "knowledge-graphs",
    params(
        ("name" = String, Path, description = "Knowledge graph name")
    ),
    responses(
        (status = 200, description = "Knowledge graph details", body = ApiResponse<KnowledgeGraphDto>),
        (status = 404, description = "Knowledge graph not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn get_knowledge_graph(
    Extension(handler): Extension<Arc<Handler>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<KnowledgeGraphDto>>, RestError> {
    let storage = handler.get_storage();

    // Check if knowledge graph exists
    storage
        .ensure_knowledge_graph(&name)
        .map_err(|e| RestError::not_found(format!("Knowledge graph '{name}' not found: {e}")))?;

    // Get relations count
    let relations_count = storage
        .list_relations_in(&name)
        .map(|r| r.len())
        .unwrap_or(0);

    let kg = KnowledgeGraphDto {
        name,
        description: None,
        relations_count,
        views_count: 0,
        ontologies: None,
    };

    Ok(Json(ApiResponse::success(kg)))
}

/// Create a new knowledge graph
#[utoipa::path(
    post,
    path = "/knowledge-graphs",
    tag = "knowledge-graphs",
    request_body = CreateKnowledgeGraphRequest,
    responses(
        (status = 200, description = "Knowledge graph created", body = ApiResponse<KnowledgeGraphDto>),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn create_knowledge_graph(
    Extension(handler): Extension<Arc<Handler>>,
    Json(request): Json<CreateKnowledgeGraphRequest>,
) -> Result<Json<ApiResponse<KnowledgeGraphDto>>, RestError> {
    {
        let storage = handler.get_storage();
        storage.create_knowledge_graph(&request.name).map_err(|e| {
            let msg = format!("{e}");
            if msg.contains("already exists") {
                RestError::bad_request(msg)
            } else {
                RestError::internal(msg)
            }
        })?;
    }

    // Deploy ontologies if provided
    let ontologies = match request.ontologies {
        Some(ontology_defs) => {
            let mut statuses = Vec::new();
            let kg_name = request.name.clone();
            for ontology in ontology_defs {
                let prefix = ontology.prefix.clone();

                // Validate prefix: must be non-empty, alphanumeric + underscores, no quotes
                if prefix.is_empty() {
                    statuses.push(OntologyStatusDto {
                        prefix,
                        status: "error".to_string(),
                        error: Some("Ontology prefix cannot be empty".to_string()),
                    });
                    continue;
                }
                if !prefix
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    statuses.push(OntologyStatusDto {
                        prefix,
                        status: "error".to_string(),
                        error: Some(
                            "Ontology prefix must contain only alphanumeric characters and underscores"
                                .to_string(),
                        ),
                    });
                    continue;
                }

                let hash = compute_ontology_hash(&ontology);

                // Check ontology_meta for existing entry with this prefix
                let mut is_update = false;
                let mut hash_matches = false;
                let check_query = format!("?ontology_meta(\"{prefix}\", _V, _H, _T)");
                if let Ok(result) = handler
                    .query_program(Some(kg_name.clone()), check_query)
                    .await
                {
                    for row in &result.rows {
                        if row.values.len() == 4 {
                            if let WireValue::String(existing_hash) = &row.values[2] {
                                if *existing_hash == hash {
                                    hash_matches = true;
                                }
                            }
                        }
                    }
                    if !result.rows.is_empty() {
                        is_update = true;
                    }
                }

                if hash_matches {
                    statuses.push(OntologyStatusDto {
                        prefix,
                        status: "unchanged".to_string(),
                        error: None,
                    });
                    continue;
                }

                // Validate all statements (parse only)
                let all_stmts: Vec<&str> = ontology
                    .schemas
                    .iter()
                    .chain(ontology.rules.iter())
                    .chain(ontology.indexes.iter())
                    .map(String::as_str)
                    .collect();

                let mut validation_error = None;
                for (i, stmt) in all_stmts.iter().enumerate() {
                    if let Err(e) = crate::statement::parse_statement(stmt) {
                        validation_error = Some(format!("Statement {}: {e}", i + 1));
                        break;
                    }
                }

                if let Some(err) = validation_error {
                    statuses.push(OntologyStatusDto {
                        prefix,
                        status: "error".to_string(),
                        error: Some(err),
                    });
                    continue;
                }

                // Drop existing rules with prefix (if updating)
                if is_update {
                    let _ = handler.drop_rules_by_prefix_in(&kg_name, &prefix);
                }

                // Execute all statements: schemas → rules → indexes
                let mut program = String::new();
                for s in &ontology.schemas {
                    program.push_str(s.trim());
                    program.push('\n');
                }
                for r in &ontology.rules {
                    program.push_str(r.trim());
                    program.push('\n');
                }
                for idx in &ontology.indexes {
                    program.push_str(idx.trim());
                    program.push('\n');
                }

                if !program.trim().is_empty() {
                    if let Err(e) = handler.query_program(Some(kg_name.clone()), program).await {
                        statuses.push(OntologyStatusDto {
                            prefix,
                            status: "error".to_string(),
                            error: Some(e),
                        });
                        continue;
                    }
                }

                // Delete old ontology_meta entry for this prefix (if updating)
                if is_update {
                    let delete_stmt = format!("-ontology_meta(P, V, H, T) <- P = \"{prefix}\"");
                    if let Err(e) = handler
                        .query_program(Some(kg_name.clone()), delete_stmt)
                        .await
                    {
                        statuses.push(OntologyStatusDto {
                            prefix,
                            status: "error".to_string(),
                            error: Some(format!("Failed to delete old metadata: {e}")),
                        });
                        continue;
                    }
                }

                // Insert new ontology_meta entry
                let timestamp = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map_or(0, |d| d.as_secs() as i64);
                let insert_stmt = format!(
                    "+ontology_meta[(\"{prefix}\", \"{}\", \"{hash}\", {timestamp})]",
                    ontology.version
                );
                if let Err(e) = handler
                    .query_program(Some(kg_name.clone()), insert_stmt)
                    .await
                {
                    statuses.push(OntologyStatusDto {
                        prefix,
                        status: "error".to_string(),
                        error: Some(format!("Failed to insert metadata: {e}")),
                    });
                    continue;
                }

                let status = if is_update { "migrated" } else { "installed" };
                statuses.push(OntologyStatusDto {
                    prefix,
                    status: status.to_string(),
                    error: None,
                });
            }
            Some(statuses)
        }
        None => None,
    };

    let kg = KnowledgeGraphDto {
        name: request.name,
        description: request.description,
        relations_count: 0,
        views_count: 0,
        ontologies,
    };

    Ok(Json(ApiResponse::success(kg)))
}

/// Compute a deterministic hash of an ontology's version and statements.
fn compute_ontology_hash(ontology: &OntologyDefinition) -> String {
    let mut hasher = DefaultHasher::new();
    ontology.version.hash(&mut hasher);
    for s in &ontology.schemas {
        s.hash(&mut hasher);
    }
    for s in &ontology.rules {
        s.hash(&mut hasher);
    }
    for s in &ontology.indexes {
        s.hash(&mut hasher);
    }
    format!("{:016x}", hasher.finish())
}

/// Delete a knowledge graph
#[utoipa::path(
    delete,
    path = "/knowledge-graphs/{name}",
    tag = "knowledge-graphs",
    params(
        ("name" = String, Path, description = "Knowledge graph name")
    ),
    responses(
        (status = 200, description = "Knowledge graph deleted", body = ApiResponse<()>),
        (status = 404, description = "Knowledge graph not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn delete_knowledge_graph(
    Extension(handler): Extension<Arc<Handler>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<()>>, RestError> {
    let mut storage = handler.get_storage_mut();

    storage
        .drop_knowledge_graph(&name)
        .map_err(|e| RestError::not_found(format!("Knowledge graph '{name}' not found: {e}")))?;

    Ok(Json(ApiResponse {
        success: true,
        data: None,
        error: None,
    }))
}
