use actix_web::{web, HttpResponse};

use crate::error::AppResult;
use crate::middleware::Principal;
use crate::models::resource_tag::{
    AssignTagsForm, AssignTagsResponse, ReplaceTagsForm, ResourceTagsQuery, SearchByTagsForm,
    SearchByTagsResponse, SuccessResponse, UnassignTagsForm,
};
use crate::models::tag::{
    CreateTagForm, CreateTagResponse, ListTagsQuery, TagListResponse, TagStatusForm, UpdateTagForm,
};
use crate::services::tag::TagService;
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list_tags))
            .route(web::post().to(create_tag)),
    )
    .service(web::resource("/all").route(web::get().to(all_tags)))
    .service(web::resource("/assign").route(web::post().to(assign_tags)))
    .service(web::resource("/unassign").route(web::post().to(unassign_tags)))
    .service(web::resource("/replace").route(web::post().to(replace_tags)))
    .service(web::resource("/resource").route(web::get().to(get_resource_tags)))
    .service(web::resource("/search").route(web::post().to(search_by_tags)))
    .service(
        web::resource("/{id}")
            .route(web::get().to(get_tag))
            .route(web::delete().to(delete_tag)),
    )
    .service(web::resource("/{id}/update").route(web::post().to(update_tag)))
    .service(web::resource("/{id}/status").route(web::post().to(update_tag_status)))
    .service(web::resource("/{id}/resources").route(web::get().to(get_tag_resources)));
}

fn tag_service(state: &AppState) -> TagService {
    TagService::new(state.tag_store.clone(), state.resource_tag_store.clone())
}

async fn create_tag(
    state: web::Data<AppState>,
    principal: Principal,
    payload: web::Json<CreateTagForm>,
) -> AppResult<HttpResponse> {
    let id = tag_service(&state).create_tag(principal.id, &payload).await?;

    Ok(HttpResponse::Ok().json(CreateTagResponse { id }))
}

async fn list_tags(
    state: web::Data<AppState>,
    query: web::Query<ListTagsQuery>,
) -> AppResult<HttpResponse> {
    let (list, total) = tag_service(&state)
        .list_tags(query.page, query.page_size, &query.keyword)
        .await?;

    Ok(HttpResponse::Ok().json(TagListResponse { total, list }))
}

async fn all_tags(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let tags = tag_service(&state).all_tags().await?;

    Ok(HttpResponse::Ok().json(tags))
}

async fn get_tag(state: web::Data<AppState>, id: web::Path<i64>) -> AppResult<HttpResponse> {
    let info = tag_service(&state).get_tag(*id).await?;

    Ok(HttpResponse::Ok().json(info))
}

async fn update_tag(
    state: web::Data<AppState>,
    principal: Principal,
    id: web::Path<i64>,
    payload: web::Json<UpdateTagForm>,
) -> AppResult<HttpResponse> {
    tag_service(&state)
        .update_tag(principal.id, *id, &payload)
        .await?;

    Ok(HttpResponse::Ok().json(SuccessResponse { success: true }))
}

async fn delete_tag(state: web::Data<AppState>, id: web::Path<i64>) -> AppResult<HttpResponse> {
    tag_service(&state).delete_tag(*id).await?;

    Ok(HttpResponse::Ok().json(SuccessResponse { success: true }))
}

async fn update_tag_status(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    payload: web::Json<TagStatusForm>,
) -> AppResult<HttpResponse> {
    tag_service(&state)
        .update_tag_status(*id, payload.status)
        .await?;

    Ok(HttpResponse::Ok().json(SuccessResponse { success: true }))
}

async fn get_tag_resources(
    state: web::Data<AppState>,
    id: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let resources = tag_service(&state).get_tag_resources(*id).await?;

    Ok(HttpResponse::Ok().json(resources))
}

async fn assign_tags(
    state: web::Data<AppState>,
    payload: web::Json<AssignTagsForm>,
) -> AppResult<HttpResponse> {
    let assigned_count = tag_service(&state)
        .assign_tags(payload.resource_id, &payload.resource_type, &payload.tag_ids)
        .await?;

    Ok(HttpResponse::Ok().json(AssignTagsResponse {
        success: true,
        assigned_count,
    }))
}

async fn unassign_tags(
    state: web::Data<AppState>,
    payload: web::Json<UnassignTagsForm>,
) -> AppResult<HttpResponse> {
    tag_service(&state)
        .unassign_tags(payload.resource_id, &payload.resource_type, &payload.tag_ids)
        .await?;

    Ok(HttpResponse::Ok().json(SuccessResponse { success: true }))
}

async fn replace_tags(
    state: web::Data<AppState>,
    payload: web::Json<ReplaceTagsForm>,
) -> AppResult<HttpResponse> {
    tag_service(&state)
        .replace_tags(payload.resource_id, &payload.resource_type, &payload.tag_ids)
        .await?;

    Ok(HttpResponse::Ok().json(SuccessResponse { success: true }))
}

async fn get_resource_tags(
    state: web::Data<AppState>,
    query: web::Query<ResourceTagsQuery>,
) -> AppResult<HttpResponse> {
    let tags = tag_service(&state)
        .get_resource_tags(query.resource_id, &query.resource_type)
        .await?;

    Ok(HttpResponse::Ok().json(tags))
}

async fn search_by_tags(
    state: web::Data<AppState>,
    payload: web::Json<SearchByTagsForm>,
) -> AppResult<HttpResponse> {
    let resources = tag_service(&state)
        .search_by_tags(&payload.tag_ids, &payload.resource_type)
        .await?;

    Ok(HttpResponse::Ok().json(SearchByTagsResponse {
        total: resources.len() as i64,
        resources,
    }))
}
