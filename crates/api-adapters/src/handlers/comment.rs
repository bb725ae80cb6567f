//! `/comment` endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use domains::{CommentId, CommentView, PostId};
use serde::{Deserialize, Serialize};

use super::Message;
use crate::error::ApiResult;
use crate::identity::CurrentIdentity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentBody {
    pub board_id: PostId,
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct EditCommentBody {
    pub comment: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub board_id: PostId,
}

#[derive(Debug, Serialize)]
pub struct CommentList {
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
pub struct Created {
    pub message: String,
    pub id: CommentId,
}

/// POST /comment
pub async fn add(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Json(body): Json<NewCommentBody>,
) -> ApiResult<Json<Created>> {
    let id = state
        .comments
        .add(body.board_id, &body.comment, identity.as_ref())
        .await?;
    Ok(Json(Created {
        message: "comment added".into(),
        id,
    }))
}

/// GET /comment/list?boardId=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<CommentList>> {
    let comments = state.comments.list_by_post(params.board_id).await?;
    Ok(Json(CommentList { comments }))
}

/// PUT /comment/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<CommentId>,
    identity: CurrentIdentity,
    Json(body): Json<EditCommentBody>,
) -> ApiResult<Json<Message>> {
    state
        .comments
        .update(id, &body.comment, identity.as_ref())
        .await?;
    Ok(Json(Message::new("comment updated")))
}

/// DELETE /comment/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<CommentId>,
    identity: CurrentIdentity,
) -> ApiResult<Json<Message>> {
    state.comments.delete(id, identity.as_ref()).await?;
    Ok(Json(Message::new("comment deleted")))
}
