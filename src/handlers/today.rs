use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use chrono::{Local, NaiveDate, TimeZone};
use serde::Deserialize;

use crate::error::{AppError, AppResult, RenderHtml};
use crate::models::{Expense, ExpenseDraft};
use crate::money::format_money;
use crate::month::local_date;
use crate::services::ledger;
use crate::state::AppState;
use crate::VERSION;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// One ledger entry, ready to render.
pub struct LedgerRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category_name: String,
    pub category_emoji: String,
    pub amount: String,
    pub time: String,
}

impl LedgerRow {
    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }
}

pub struct CategoryOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "pages/today.html")]
pub struct TodayTemplate {
    pub title: String,
    pub version: &'static str,
    pub nav: &'static str,
    pub show_logout: bool,
    pub xsrf_token: String,
    pub day: String,
    pub day_label: String,
    pub is_today: bool,
    pub prev_day: String,
    pub next_day: String,
    pub rows: Vec<LedgerRow>,
    pub total: String,
    pub categories: Vec<CategoryOption>,
}

impl TodayTemplate {
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TodayParams {
    pub day: Option<String>,
    /// Invite token from an emailed link. Signed-in users get the clean URL.
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    pub day: Option<String>,
}

fn today(state: &AppState) -> NaiveDate {
    local_date(state.clock.now_millis(), &Local)
}

fn parse_day(raw: Option<&str>, fallback: NaiveDate) -> AppResult<NaiveDate> {
    match raw.map(str::trim).filter(|d| !d.is_empty()) {
        None => Ok(fallback),
        Some(d) => NaiveDate::parse_from_str(d, DAY_FORMAT)
            .map_err(|_| AppError::Validation(format!("Invalid day '{}', expected YYYY-MM-DD", d))),
    }
}

fn ledger_row(state: &AppState, expense: &Expense) -> LedgerRow {
    let category = state.categories.resolve(&expense.category_id);
    let time = Local
        .timestamp_millis_opt(expense.created_at)
        .earliest()
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default();

    LedgerRow {
        id: expense.id.clone(),
        title: expense.title.clone(),
        description: expense.description.clone().unwrap_or_default(),
        category_name: category.name,
        category_emoji: category.emoji,
        amount: format_money(expense.amount_cents, state.currency()),
        time,
    }
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<TodayParams>,
) -> AppResult<Response> {
    if params.token.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let today = today(&state);
    let day = parse_day(params.day.as_deref(), today)?;

    let conn = state.db.get()?;
    let ledger = ledger::load_day(&conn, day, &Local)?;

    let rows = ledger
        .entries()
        .iter()
        .map(|e| ledger_row(&state, e))
        .collect();

    let default_id = state.categories.default_id().unwrap_or_default();
    let categories = state
        .categories
        .all()
        .iter()
        .map(|c| CategoryOption {
            id: c.id.clone(),
            label: c.option_label(),
            selected: c.id == default_id,
        })
        .collect();

    let day_label = if day == today {
        "Today".to_string()
    } else {
        day.format("%a, %b %-d %Y").to_string()
    };

    let template = TodayTemplate {
        title: day_label.clone(),
        version: VERSION,
        nav: "today",
        show_logout: state.config.requires_login(),
        xsrf_token: state.xsrf(),
        day: day.format(DAY_FORMAT).to_string(),
        day_label,
        is_today: day == today,
        prev_day: day.pred_opt().unwrap_or(day).format(DAY_FORMAT).to_string(),
        next_day: day.succ_opt().unwrap_or(day).format(DAY_FORMAT).to_string(),
        rows,
        total: format_money(ledger.total_cents(), state.currency()),
        categories,
    };

    Ok(template.render_html()?.into_response())
}

pub async fn create(
    State(state): State<AppState>,
    Form(mut draft): Form<ExpenseDraft>,
) -> AppResult<Redirect> {
    if draft.category_id.trim().is_empty() {
        if let Some(id) = state.categories.default_id() {
            draft.category_id = id.to_string();
        }
    }

    let conn = state.db.get()?;
    let mut ledger = ledger::load_day(&conn, today(&state), &Local)?;
    ledger::record(&conn, &mut ledger, &draft, state.clock.as_ref())?;

    Ok(Redirect::to("/"))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> AppResult<Redirect> {
    let today = today(&state);
    let day = parse_day(form.day.as_deref(), today)?;

    let conn = state.db.get()?;
    let mut ledger = ledger::load_day(&conn, day, &Local)?;
    ledger::remove(&conn, &mut ledger, &id)?;

    if day == today {
        Ok(Redirect::to("/"))
    } else {
        Ok(Redirect::to(&format!("/?day={}", day.format(DAY_FORMAT))))
    }
}
