use axum::extract::{Query, State};
use axum::response::Json;
use chrono::Local;

use crate::db::queries::expenses;
use crate::error::AppResult;
use crate::handlers::stats::MonthParams;
use crate::models::{Category, Expense};
use crate::month::MonthKey;
use crate::services::stats::{monthly_stats, MonthlyStats};
use crate::state::AppState;

/// Every stored expense, newest first.
pub async fn list_expenses(State(state): State<AppState>) -> AppResult<Json<Vec<Expense>>> {
    let conn = state.db.get()?;
    Ok(Json(expenses::list_expenses(&conn)?))
}

pub async fn stats(
    State(state): State<AppState>,
    Query(params): Query<MonthParams>,
) -> AppResult<Json<MonthlyStats>> {
    let now = state.clock.now();
    let selected = params.resolve(MonthKey::containing(now, &Local));

    let all = {
        let conn = state.db.get()?;
        expenses::list_expenses(&conn)?
    };

    Ok(Json(monthly_stats(
        &all,
        selected,
        now,
        &Local,
        state.config.average_basis,
        &state.categories,
    )))
}

pub async fn categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.categories.all().to_vec())
}
