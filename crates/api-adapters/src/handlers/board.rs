//! `/board` endpoints.

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use domains::{DeleteReport, DomainError, PostId, PostPage, PostView};
use serde::{Deserialize, Serialize};

use super::Message;
use crate::error::ApiResult;
use crate::identity::CurrentIdentity;
use crate::multipart::BoardForm;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "first_page")]
    pub p: i64,
}

fn first_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Created {
    pub message: String,
    pub id: PostId,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: String,
    #[serde(flatten)]
    pub report: DeleteReport,
}

/// POST /board/add
pub async fn add(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    multipart: Multipart,
) -> ApiResult<Json<Created>> {
    let form = BoardForm::read(multipart).await?;
    let id = state
        .posts
        .create(&form.title, &form.content, identity.as_ref(), &form.files)
        .await?;
    Ok(Json(Created {
        message: "post created".into(),
        id,
    }))
}

/// GET /board/list?q=&p=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PostPage>> {
    Ok(Json(state.posts.list(&params.q, params.p).await?))
}

/// GET /board/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> ApiResult<Json<PostView>> {
    let view = state
        .posts
        .get(id)
        .await?
        .ok_or_else(|| DomainError::not_found("post", id))?;
    Ok(Json(view))
}

/// PUT /board/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
    identity: CurrentIdentity,
    multipart: Multipart,
) -> ApiResult<Json<Message>> {
    let form = BoardForm::read(multipart).await?;
    state
        .posts
        .update(
            id,
            &form.title,
            &form.content,
            identity.as_ref(),
            &form.files,
            &form.delete_file_names,
        )
        .await?;
    Ok(Json(Message::new("post updated")))
}

/// DELETE /board/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
    identity: CurrentIdentity,
) -> ApiResult<Json<Deleted>> {
    let report = state.posts.delete(id, identity.as_ref()).await?;
    Ok(Json(Deleted {
        message: "post deleted".into(),
        report,
    }))
}
