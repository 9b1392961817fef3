use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Result;
use crate::services::{NewQuote, NowSnapshot, NowUpdate, Quote};

use super::AppState;

/// Stored weather and image plus a freshly drawn quote.
pub async fn get_now(State(state): State<Arc<AppState>>) -> Json<NowSnapshot> {
    let (weather, image) = state.now.current().await;
    let quote = state.quotes.random().await;
    Json(NowSnapshot {
        weather,
        image,
        quote,
    })
}

pub async fn update_now(
    State(state): State<Arc<AppState>>,
    Json(update): Json<NowUpdate>,
) -> Result<Json<Value>> {
    state.now.update(update).await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteQuery {
    pub tag: Option<String>,
}

pub async fn list_quotes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuoteQuery>,
) -> Json<Vec<Quote>> {
    Json(state.quotes.list(query.tag.as_deref()).await)
}

pub async fn add_quote(
    State(state): State<Arc<AppState>>,
    Json(quote): Json<NewQuote>,
) -> Result<Json<Quote>> {
    Ok(Json(state.quotes.add(quote).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::testing;

    #[tokio::test]
    async fn now_serves_nulls_and_a_default_quote() {
        let (state, _dir) = testing::state().await;
        let Json(snapshot) = get_now(State(state)).await;

        let body = serde_json::to_value(&snapshot).unwrap();
        assert!(body["weather"].is_null());
        assert!(body["image"].is_null());
        assert!(body["quote"]["text"].is_string());
    }

    #[tokio::test]
    async fn posted_weather_is_served_back() {
        let (state, _dir) = testing::state().await;
        let update: NowUpdate =
            serde_json::from_value(json!({"weather": {"temp": "20", "location": "Home"}}))
                .unwrap();
        update_now(State(state.clone()), Json(update)).await.unwrap();

        let Json(snapshot) = get_now(State(state)).await;
        let weather = snapshot.weather.unwrap();
        assert_eq!(weather["temp"], "20");
        assert!(weather.contains_key("updatedAt"));
    }

    #[tokio::test]
    async fn quotes_filter_by_tag() {
        let (state, _dir) = testing::state().await;
        for (text, tag) in [("One", "work"), ("Two", "life")] {
            add_quote(
                State(state.clone()),
                Json(NewQuote {
                    text: text.to_string(),
                    author: "A".to_string(),
                    source: None,
                    tags: vec![tag.to_string()],
                }),
            )
            .await
            .unwrap();
        }

        let Json(work) = list_quotes(
            State(state),
            Query(QuoteQuery {
                tag: Some("work".to_string()),
            }),
        )
        .await;
        assert_eq!(work.len(), 1);
        assert_eq!(work[0].text, "One");
    }
}
