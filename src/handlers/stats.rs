use askama::Template;
use axum::extract::{Query, State};
use axum::response::Html;
use chrono::Local;
use serde::Deserialize;

use crate::db::queries::expenses;
use crate::error::{AppResult, RenderHtml};
use crate::money::{format_money, format_percent};
use crate::month::{recent_months, MonthKey};
use crate::services::stats::{monthly_stats, CategoryRow, MonthlyStats};
use crate::state::AppState;
use crate::VERSION;

/// Number of months offered in the month scroller.
const SCROLLER_MONTHS: usize = 6;

#[derive(Debug, Default, Deserialize)]
pub struct MonthParams {
    pub year: Option<i32>,
    /// 0-based; out-of-range values roll over.
    pub month: Option<i32>,
}

impl MonthParams {
    /// The requested month, defaulting each missing part to `current`.
    pub fn resolve(&self, current: MonthKey) -> MonthKey {
        MonthKey::new(
            self.year.unwrap_or(current.year),
            self.month.unwrap_or(current.month),
        )
    }
}

pub struct MonthLink {
    pub label: String,
    pub query: String,
    pub selected: bool,
}

pub struct BreakdownRow {
    pub name: String,
    pub emoji: String,
    pub color: String,
    pub amount: String,
    pub percent: String,
}

#[derive(Template)]
#[template(path = "pages/stats.html")]
pub struct StatsTemplate {
    pub title: String,
    pub version: &'static str,
    pub nav: &'static str,
    pub show_logout: bool,
    pub xsrf_token: String,
    pub month_label: String,
    pub months: Vec<MonthLink>,
    pub prev_query: String,
    pub next_query: String,
    pub is_empty: bool,
    pub total: String,
    pub average: String,
    pub pie_style: String,
    pub rows: Vec<BreakdownRow>,
}

/// CSS `conic-gradient` drawing the category rows as pie slices.
pub fn pie_gradient(rows: &[CategoryRow]) -> String {
    if rows.is_empty() {
        return "conic-gradient(#e5e7eb 0% 100%)".to_string();
    }

    let mut stops = Vec::with_capacity(rows.len());
    let mut from = 0.0_f64;
    for (i, row) in rows.iter().enumerate() {
        let to = if i + 1 == rows.len() {
            100.0
        } else {
            (from + row.percentage).min(100.0)
        };
        stops.push(format!("{} {:.2}% {:.2}%", row.color, from, to));
        from = to;
    }
    format!("conic-gradient({})", stops.join(", "))
}

fn average_text(stats: &MonthlyStats, currency: &str) -> String {
    match stats.average_per_day_cents {
        Some(avg) => format_money(avg, currency),
        None => "n/a".to_string(),
    }
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<MonthParams>,
) -> AppResult<Html<String>> {
    let now = state.clock.now();
    let current = MonthKey::containing(now, &Local);
    let selected = params.resolve(current);

    let all = {
        let conn = state.db.get()?;
        expenses::list_expenses(&conn)?
    };

    let stats = monthly_stats(
        &all,
        selected,
        now,
        &Local,
        state.config.average_basis,
        &state.categories,
    );

    let currency = state.currency();
    let months = recent_months(current, SCROLLER_MONTHS)
        .into_iter()
        .map(|m| MonthLink {
            label: m.label(),
            query: m.query_string(),
            selected: m == stats.month,
        })
        .collect();

    let rows = stats
        .rows
        .iter()
        .map(|row| BreakdownRow {
            name: row.name.clone(),
            emoji: row.emoji.clone(),
            color: row.color.clone(),
            amount: format_money(row.total_cents, currency),
            percent: format_percent(row.percentage),
        })
        .collect();

    let template = StatsTemplate {
        title: format!("Stats · {}", stats.label),
        version: VERSION,
        nav: "stats",
        show_logout: state.config.requires_login(),
        xsrf_token: state.xsrf(),
        month_label: stats.label.clone(),
        months,
        prev_query: stats.month.prev().query_string(),
        next_query: stats.month.next().query_string(),
        is_empty: stats.is_empty(),
        total: format_money(stats.total_cents, currency),
        average: average_text(&stats, currency),
        pie_style: pie_gradient(&stats.rows),
        rows,
    };

    template.render_html()
}
