//! Trade endpoints
//!
//! Mirrors the user endpoints under `trade:<id>` and `trades:all`. Paginated
//! trades go through the asynchronous cache path, with the worker pool doing
//! the blocking queries on a miss.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;

use super::handlers::{instrumented, json_body, parse_id, AppState};
use crate::cache::{trade_key, TRADES_ALL_KEY};
use crate::error::{ApiError, Result};
use crate::models::{PageQuery, PageRequest, PageResponse, Trade, TradeInput};

const RESOURCE: &str = "trades";

/// Handler for GET /api/v1/trades
pub async fn list_trades(State(state): State<AppState>) -> Result<Json<Vec<Trade>>> {
    let trades = state
        .cache
        .get_or_compute(TRADES_ALL_KEY, || state.trades.list_all())?;
    Ok(Json(trades))
}

/// Handler for GET /api/v1/trades/paginated
pub async fn list_trades_paginated(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<Trade>>> {
    let metrics = state.metrics.clone();
    instrumented(metrics.as_ref(), async move {
        let request = PageRequest::try_from(query)?;
        let key = request.cache_key(RESOURCE);
        debug!(key = %key, "Paginated trades request");

        let pool = state.pool.clone();
        let trades = state.trades.clone();
        let page = state
            .cache
            .get_or_compute_async(&key, move || async move {
                match pool.execute(move || trades.fetch_page(&request)).await {
                    Ok(page) => page,
                    Err(e) => Err(ApiError::from(e)),
                }
            })
            .await?;

        Ok::<_, ApiError>(Json(page))
    })
    .await
}

/// Handler for GET /api/v1/trades/:id
pub async fn get_trade(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Trade>> {
    let id = parse_id(&id)?;
    let trade = state
        .cache
        .get_or_compute(&trade_key(id), || state.trades.get_by_id(id))?;
    Ok(Json(trade))
}

/// Handler for POST /api/v1/trades
pub async fn create_trade(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TradeInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Trade>)> {
    let input = json_body(payload)?;
    let trade = state.trades.create(input)?;

    state.cache.evict(TRADES_ALL_KEY);
    Ok((StatusCode::CREATED, Json(trade)))
}

/// Handler for PUT /api/v1/trades/:id
pub async fn update_trade(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<TradeInput>, JsonRejection>,
) -> Result<Json<Trade>> {
    let id = parse_id(&id)?;
    let input = json_body(payload)?;
    let trade = state.trades.update(id, input)?;

    evict_trade(&state, id);
    Ok(Json(trade))
}

/// Handler for DELETE /api/v1/trades/:id
pub async fn delete_trade(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(&id)?;
    state.trades.delete(id)?;

    evict_trade(&state, id);
    Ok(StatusCode::NO_CONTENT)
}

fn evict_trade(state: &AppState, id: u64) {
    state.cache.evict(&trade_key(id));
    state.cache.evict(TRADES_ALL_KEY);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::NaiveDate;

    fn state() -> AppState {
        AppState::from_config(&Config::default())
    }

    fn input(symbol: &str) -> std::result::Result<Json<TradeInput>, JsonRejection> {
        Ok(Json(TradeInput {
            symbol: symbol.to_string(),
            quantity: 100,
            price: 12.5,
            trade_type: "BUY".to_string(),
            status: "PENDING".to_string(),
            trade_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            settlement_date: NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(),
            counterparty: "Citi".to_string(),
            notes: None,
        }))
    }

    #[tokio::test]
    async fn test_paginated_trades_served_from_cache() {
        let state = state();
        for symbol in ["A", "B", "C"] {
            create_trade(State(state.clone()), input(symbol)).await.unwrap();
        }
        let query = PageQuery {
            size: Some("2".to_string()),
            ..PageQuery::default()
        };

        let Json(first) = list_trades_paginated(State(state.clone()), Query(query.clone()))
            .await
            .unwrap();
        let Json(second) = list_trades_paginated(State(state.clone()), Query(query))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.content.len(), 2);
        assert_eq!(first.metadata.total_elements, 3);
        let stats = state.cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let state = state();
        let (_, Json(trade)) = create_trade(State(state.clone()), input("X")).await.unwrap();
        let id = trade.id.to_string();
        get_trade(State(state.clone()), Path(id.clone())).await.unwrap();

        let status = delete_trade(State(state.clone()), Path(id.clone())).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let result = get_trade(State(state), Path(id)).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_bad_id_is_rejected() {
        let result = get_trade(State(state()), Path("abc".to_string())).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }
}
