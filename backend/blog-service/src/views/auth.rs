use super::layout::escape_html;
use crate::error::FieldErrors;

/// State of the registration form as last submitted
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    /// Every failing rule of every field
    pub errors: FieldErrors,
    /// Server rejection shown above the form, verbatim
    pub banner: Option<String>,
}

fn field_errors(errors: &FieldErrors, field: &str) -> String {
    errors
        .get(field)
        .map(|messages| {
            messages
                .iter()
                .map(|m| format!(r#"<p class="field-error">{}</p>"#, escape_html(m)))
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn banner(message: Option<&str>) -> String {
    message
        .map(|m| format!(r#"<p class="banner" role="alert">{}</p>"#, escape_html(m)))
        .unwrap_or_default()
}

/// Registration form. While the request is in flight htmx disables the
/// submit button and shows the busy indicator.
pub fn register_page(form: &RegisterForm) -> String {
    format!(
        r##"<h1>Cadastro</h1>
{banner}
<form id="register-form" method="post" action="/register" hx-post="/register" hx-target="body" hx-disabled-elt="button[type=submit]" hx-indicator="#register-busy" novalidate>
  <label>Nome
    <input name="name" value="{name}" autocomplete="username">
  </label>
  {name_errors}
  <label>Email
    <input name="email" type="email" value="{email}" autocomplete="email">
  </label>
  {email_errors}
  <label>Senha
    <input name="password" type="password" autocomplete="new-password">
  </label>
  {password_errors}
  <button type="submit">Cadastrar</button>
  <span id="register-busy" class="htmx-indicator">Enviando...</span>
</form>
<p>Já tem conta? <a href="/login">Entre</a></p>"##,
        banner = banner(form.banner.as_deref()),
        name = escape_html(&form.name),
        email = escape_html(&form.email),
        name_errors = field_errors(&form.errors, "name"),
        email_errors = field_errors(&form.errors, "email"),
        password_errors = field_errors(&form.errors, "password"),
    )
}

pub fn login_page(email: &str, error: Option<&str>) -> String {
    format!(
        r#"<h1>Entrar</h1>
{banner}
<form method="post" action="/login">
  <label>Email
    <input name="email" type="email" value="{email}" autocomplete="email">
  </label>
  <label>Senha
    <input name="password" type="password" autocomplete="current-password">
  </label>
  <button type="submit">Entrar</button>
</form>
<p>Ainda não tem conta? <a href="/register">Cadastre-se</a></p>"#,
        banner = banner(error),
        email = escape_html(email),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::{NAME_TOO_SHORT, PASSWORD_RULE};

    #[test]
    fn every_field_message_is_listed() {
        let mut errors = FieldErrors::new();
        errors.insert("name".to_string(), vec![NAME_TOO_SHORT.to_string()]);
        errors.insert("password".to_string(), vec![PASSWORD_RULE.to_string()]);

        let html = register_page(&RegisterForm {
            name: "ab".to_string(),
            errors,
            ..Default::default()
        });
        assert!(html.contains(NAME_TOO_SHORT));
        assert!(html.contains(PASSWORD_RULE));
        assert!(html.contains(r#"value="ab""#));
        assert!(!html.contains(r#"role="alert""#));
    }

    #[test]
    fn banner_shows_server_message_once() {
        let html = register_page(&RegisterForm {
            banner: Some("Email já cadastrado".to_string()),
            ..Default::default()
        });
        assert_eq!(html.matches("Email já cadastrado").count(), 1);
    }

    #[test]
    fn submit_is_disabled_while_in_flight() {
        let html = register_page(&RegisterForm::default());
        assert!(html.contains(r#"hx-disabled-elt="button[type=submit]""#));
        assert!(html.contains("htmx-indicator"));
    }
}
