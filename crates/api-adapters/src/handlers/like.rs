//! `/like` endpoints.

use axum::extract::{Path, State};
use axum::Json;
use domains::{LikeState, PostId};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::identity::CurrentIdentity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleBody {
    pub board_id: PostId,
}

/// PUT /like
pub async fn toggle(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Json(body): Json<ToggleBody>,
) -> ApiResult<Json<LikeState>> {
    Ok(Json(state.likes.toggle(body.board_id, identity.as_ref()).await?))
}

/// GET /like/board/{boardId}
pub async fn get(
    State(state): State<AppState>,
    Path(board_id): Path<PostId>,
    identity: CurrentIdentity,
) -> ApiResult<Json<LikeState>> {
    Ok(Json(state.likes.get(board_id, identity.as_ref()).await?))
}
