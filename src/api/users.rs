//! User endpoints
//!
//! Single users and the full list are cached under `user:<id>` and
//! `users:all`; writes evict those keys. Page keys are left alone and expire
//! on their own.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;

use super::handlers::{instrumented, json_body, parse_id, AppState};
use crate::cache::{user_key, USERS_ALL_KEY};
use crate::error::{ApiError, Result};
use crate::models::{PageQuery, PageRequest, PageResponse, User, UserInput};

const RESOURCE: &str = "users";

/// Handler for GET /api/v1/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    let users = state
        .cache
        .get_or_compute(USERS_ALL_KEY, || state.users.list_all())?;
    Ok(Json(users))
}

/// Handler for GET /api/v1/users/paginated
///
/// The request is validated before the cache is consulted. A hit is served
/// directly; on a miss the page and count queries run on the worker pool.
pub async fn list_users_paginated(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<User>>> {
    let metrics = state.metrics.clone();
    instrumented(metrics.as_ref(), async move {
        let request = PageRequest::try_from(query)?;
        let key = request.cache_key(RESOURCE);
        debug!(key = %key, "Paginated users request");

        let pool = state.pool.clone();
        let users = state.users.clone();
        let page = state
            .cache
            .get_or_compute_async(&key, move || async move {
                match pool.execute(move || users.fetch_page(&request)).await {
                    Ok(page) => page,
                    Err(e) => Err(ApiError::from(e)),
                }
            })
            .await?;

        Ok::<_, ApiError>(Json(page))
    })
    .await
}

/// Handler for GET /api/v1/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>> {
    let id = parse_id(&id)?;
    let user = state
        .cache
        .get_or_compute(&user_key(id), || state.users.get_by_id(id))?;
    Ok(Json(user))
}

/// Handler for POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UserInput>, JsonRejection>,
) -> Result<(StatusCode, Json<User>)> {
    let input = json_body(payload)?;
    let user = state.users.create(input)?;

    state.cache.evict(USERS_ALL_KEY);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Handler for PUT /api/v1/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UserInput>, JsonRejection>,
) -> Result<Json<User>> {
    let id = parse_id(&id)?;
    let input = json_body(payload)?;
    let user = state.users.update(id, input)?;

    evict_user(&state, id);
    Ok(Json(user))
}

/// Handler for DELETE /api/v1/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(&id)?;
    state.users.delete(id)?;

    evict_user(&state, id);
    Ok(StatusCode::NO_CONTENT)
}

fn evict_user(state: &AppState, id: u64) {
    state.cache.evict(&user_key(id));
    state.cache.evict(USERS_ALL_KEY);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn state() -> AppState {
        AppState::from_config(&Config::default())
    }

    fn input(name: &str) -> std::result::Result<Json<UserInput>, JsonRejection> {
        Ok(Json(UserInput {
            name: name.to_string(),
        }))
    }

    #[tokio::test]
    async fn test_get_user_is_cached() {
        let state = state();
        let (_, Json(created)) = create_user(State(state.clone()), input("Alice"))
            .await
            .unwrap();

        let id = created.id.to_string();
        get_user(State(state.clone()), Path(id.clone())).await.unwrap();
        get_user(State(state.clone()), Path(id)).await.unwrap();

        let stats = state.cache.stats();
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_count, 1);
    }

    #[tokio::test]
    async fn test_update_evicts_single_and_list_keys() {
        let state = state();
        let (_, Json(created)) = create_user(State(state.clone()), input("Alice"))
            .await
            .unwrap();
        let id = created.id.to_string();
        get_user(State(state.clone()), Path(id.clone())).await.unwrap();
        list_users(State(state.clone())).await.unwrap();

        update_user(State(state.clone()), Path(id.clone()), input("Alicia"))
            .await
            .unwrap();

        let Json(fresh) = get_user(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(fresh.name, "Alicia");
        let Json(all) = list_users(State(state)).await.unwrap();
        assert_eq!(all[0].name, "Alicia");
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let state = state();

        let result = get_user(State(state.clone()), Path("9".to_string())).await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert_eq!(state.cache.stats().size, 0);
    }

    #[tokio::test]
    async fn test_invalid_page_request_skips_cache() {
        let state = state();
        let query = PageQuery {
            size: Some("0".to_string()),
            ..PageQuery::default()
        };

        let result = list_users_paginated(State(state.clone()), Query(query)).await;

        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert_eq!(state.cache.stats().miss_count, 0);
    }

    #[tokio::test]
    async fn test_cached_page_served_after_pool_shutdown() {
        let state = state();
        create_user(State(state.clone()), input("Alice"))
            .await
            .unwrap();
        list_users_paginated(State(state.clone()), Query(PageQuery::default()))
            .await
            .unwrap();

        state.pool.shutdown().await;
        assert!(!state.pool.is_accepting());

        let Json(page) =
            list_users_paginated(State(state.clone()), Query(PageQuery::default()))
                .await
                .unwrap();
        assert_eq!(page.content[0].name, "Alice");
        assert_eq!(state.cache.stats().hit_count, 1);

        let miss = PageQuery {
            page: Some("1".to_string()),
            ..PageQuery::default()
        };
        let result = list_users_paginated(State(state), Query(miss)).await;
        assert!(matches!(result, Err(ApiError::ServiceUnavailable(_))));
    }
}
