//! Server-rendered pages: login form and dashboard.
//!
//! These routes share the session cookie with the JSON API but answer with
//! HTML and redirects instead of JSON errors.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use rust_decimal::Decimal;
use sea_orm::DbErr;
use shareslice_core::portfolio::Holding;
use shareslice_db::{
    AssetRepository, PortfolioRepository, TransactionRepository,
    entities::{assets, sea_orm_active_enums::{AssetStatus, TransactionType}, transactions},
};
use shareslice_shared::{auth::LoginRequest, types::PageRequest};
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    middleware::auth::{end_session, resolve_session, start_session},
    routes::auth::authenticate,
};

const DASHBOARD_ROWS: u32 = 10;

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate<'a> {
    login: &'a str,
    error: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate<'a> {
    username: &'a str,
    is_manager: bool,
    holdings: &'a [Holding],
    total_value: Decimal,
    transactions: &'a [TransactionRow],
    assets: &'a [assets::Model],
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    status: u16,
    message: &'a str,
}

/// One line of the dashboard's recent activity table.
struct TransactionRow {
    kind: &'static str,
    direction: &'static str,
    quantity: i64,
    unit_price: Option<Decimal>,
    at: String,
}

impl TransactionRow {
    fn new(tx: &transactions::Model, viewer: Uuid) -> Self {
        let kind = match tx.transaction_type {
            TransactionType::Issue => "issue",
            TransactionType::Transfer => "transfer",
            TransactionType::Trade => "trade",
        };
        Self {
            kind,
            direction: if tx.to_owner_id == viewer { "in" } else { "out" },
            quantity: tx.quantity,
            unit_price: tx.unit_price,
            at: tx.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// An error rendered as an HTML page.
#[derive(Debug)]
pub struct PageError {
    status: StatusCode,
    message: String,
}

impl From<ApiError> for PageError {
    fn from(err: ApiError) -> Self {
        if err.0.is_server_error() {
            tracing::error!(error = %err.0, "Page request failed");
        }
        Self {
            status: err.status(),
            message: err.public_message(),
        }
    }
}

impl From<DbErr> for PageError {
    fn from(err: DbErr) -> Self {
        ApiError::from(err).into()
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let page = ErrorTemplate {
            status: self.status.as_u16(),
            message: &self.message,
        };
        render(self.status, &page)
    }
}

/// Renders a template, falling back to plain text if rendering fails.
fn render(status: StatusCode, template: &impl Template) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Template rendering failed").into_response()
        }
    }
}

/// Creates the page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_form).post(login_submit))
        .route("/dashboard", get(dashboard))
        .route("/logout", post(logout))
}

/// GET / - Dashboard when signed in, login otherwise.
async fn index(State(state): State<AppState>, jar: CookieJar) -> Result<Redirect, PageError> {
    Ok(match resolve_session(&state, &jar).await? {
        Some(_) => Redirect::to("/dashboard"),
        None => Redirect::to("/login"),
    })
}

/// GET /login
async fn login_form() -> Response {
    render(
        StatusCode::OK,
        &LoginTemplate {
            login: "",
            error: None,
        },
    )
}

/// POST /login - Form login.
async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Form(form): Form<LoginRequest>,
) -> Result<Response, PageError> {
    let user = match authenticate(&state, &form).await {
        Ok(user) => user,
        Err(e) if e.0.is_server_error() => return Err(e.into()),
        Err(e) => {
            let message = e.public_message();
            let page = LoginTemplate {
                login: &form.login,
                error: Some(&message),
            };
            return Ok(render(StatusCode::UNAUTHORIZED, &page));
        }
    };

    let (jar, _) = start_session(&state, jar, &headers, user.id).await?;
    tracing::info!(user_id = %user.id, "User logged in via form");
    Ok((jar, Redirect::to("/dashboard")).into_response())
}

/// GET /dashboard - Portfolio, recent activity and approved assets.
async fn dashboard(State(state): State<AppState>, jar: CookieJar) -> Result<Response, PageError> {
    let Some(user) = resolve_session(&state, &jar).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let rows = PageRequest {
        page: 1,
        per_page: DASHBOARD_ROWS,
    };

    let portfolio = PortfolioRepository::new(state.conn())
        .for_user(user.id)
        .await?;
    let (recent, _) = TransactionRepository::new(state.conn())
        .list_for_user(user.id, None, rows)
        .await?;
    let (approved, _) = AssetRepository::new(state.conn())
        .list(AssetStatus::Approved, rows)
        .await?;

    let transactions: Vec<TransactionRow> = recent
        .iter()
        .map(|tx| TransactionRow::new(tx, user.id))
        .collect();

    let page = DashboardTemplate {
        username: &user.username,
        is_manager: user.is_manager,
        holdings: &portfolio.holdings,
        total_value: portfolio.total_value,
        transactions: &transactions,
        assets: &approved,
    };
    Ok(render(StatusCode::OK, &page))
}

/// POST /logout
async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<Response, PageError> {
    let jar = end_session(&state, jar).await?;
    Ok((jar, Redirect::to("/login")).into_response())
}
