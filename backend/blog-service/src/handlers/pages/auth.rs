use super::{html, see_other, LOGIN_PATH};
use crate::error::AppError;
use crate::middleware::{clear_session_cookie, session_cookie, Viewer};
use crate::models::{LoginRequest, RegisterRequest};
use crate::services::AuthService;
use crate::views::{self, RegisterForm};
use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};

fn register_response(viewer: &Viewer, form: &RegisterForm) -> HttpResponse {
    // Rendered with 200 so htmx swaps the form back in with its messages
    html(
        StatusCode::OK,
        views::page("Cadastro", viewer.user(), &views::register_page(form)),
    )
}

/// Redirect after a successful registration. htmx would follow a 303 inside
/// its XHR and swap `/login` into the page, so its requests get
/// `HX-Redirect` instead.
fn registered_redirect(req: &HttpRequest) -> HttpResponse {
    if req.headers().contains_key("HX-Request") {
        HttpResponse::Ok()
            .insert_header(("HX-Redirect", LOGIN_PATH))
            .finish()
    } else {
        see_other(LOGIN_PATH)
    }
}

pub async fn register_form(viewer: Viewer) -> HttpResponse {
    register_response(&viewer, &RegisterForm::default())
}

pub async fn register_submit(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    viewer: Viewer,
    form: web::Form<RegisterRequest>,
) -> HttpResponse {
    let request = form.into_inner();
    let mut state = RegisterForm {
        name: request.name.clone(),
        email: request.email.clone(),
        ..Default::default()
    };

    match auth.register(request).await {
        Ok(_) => registered_redirect(&req),
        Err(AppError::Validation(fields)) => {
            state.errors = fields;
            register_response(&viewer, &state)
        }
        Err(err) => {
            state.banner = Some(match err {
                AppError::Database(_) => "Erro interno do servidor".to_string(),
                other => other.message(),
            });
            register_response(&viewer, &state)
        }
    }
}

pub async fn login_form(viewer: Viewer) -> HttpResponse {
    html(
        StatusCode::OK,
        views::page("Entrar", viewer.user(), &views::login_page("", None)),
    )
}

pub async fn login_submit(
    auth: web::Data<AuthService>,
    viewer: Viewer,
    form: web::Form<LoginRequest>,
) -> HttpResponse {
    let request = form.into_inner();
    let email = request.email.clone();

    match auth.login(request).await {
        Ok((_, token)) => HttpResponse::SeeOther()
            .insert_header((actix_web::http::header::LOCATION, "/"))
            .cookie(session_cookie(token, auth.sessions()))
            .finish(),
        Err(err) => {
            let status = match err {
                AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let message = match err {
                AppError::Database(_) => "Erro interno do servidor".to_string(),
                other => other.message(),
            };
            html(
                status,
                views::page(
                    "Entrar",
                    viewer.user(),
                    &views::login_page(&email, Some(&message)),
                ),
            )
        }
    }
}

pub async fn logout() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((actix_web::http::header::LOCATION, "/"))
        .cookie(clear_session_cookie())
        .finish()
}
