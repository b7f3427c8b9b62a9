use crate::services::SessionUser;
use chrono::{DateTime, Utc};

const HTMX_SCRIPT: &str = r#"<script src="https://unpkg.com/htmx.org@1.9.12" crossorigin="anonymous"></script>"#;

const STYLES: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 760px; margin: 0 auto; padding: 0 16px; color: #1f2937; }
header { display: flex; justify-content: space-between; align-items: center; padding: 16px 0; border-bottom: 1px solid #e5e7eb; }
header nav a { margin-left: 12px; }
a { color: #2563eb; text-decoration: none; }
.post-row { display: flex; gap: 12px; padding: 12px 0; border-bottom: 1px solid #f3f4f6; }
.post-rank { color: #9ca3af; min-width: 2em; text-align: right; }
.post-meta, .comment-meta { color: #6b7280; font-size: 0.85em; }
.comment { margin: 12px 0; }
.comment-children { margin-left: 20px; padding-left: 12px; border-left: 2px solid #e5e7eb; }
.comment-actions form, .comment-actions a { display: inline; margin-right: 8px; }
.banner { background: #fee2e2; color: #991b1b; padding: 10px 12px; border-radius: 6px; }
.field-error { color: #b91c1c; font-size: 0.85em; margin: 2px 0; }
.spinner { text-align: center; color: #6b7280; padding: 16px; }
.htmx-request .spinner-idle { display: none; }
.all-loaded { text-align: center; color: #6b7280; padding: 24px 0; }
button.link { background: none; border: none; color: #2563eb; cursor: pointer; padding: 0; }
"#;

/// Escape text for HTML element and attribute content
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// pt-BR distance between `then` and `now`, in the wording of date-fns
/// `formatDistance`; callers append "atrás".
pub fn format_distance(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    let minutes = (seconds as f64 / 60.0).round() as i64;

    const DAY: i64 = 1440;
    const MONTH: i64 = 43_200;

    if minutes < 2 {
        return if minutes == 0 {
            "menos de um minuto".to_string()
        } else {
            "1 minuto".to_string()
        };
    }
    if minutes < 45 {
        return format!("{} minutos", minutes);
    }
    if minutes < 90 {
        return "cerca de 1 hora".to_string();
    }
    if minutes < DAY {
        let hours = (minutes as f64 / 60.0).round() as i64;
        return format!("cerca de {} horas", hours);
    }
    if minutes < 2520 {
        return "1 dia".to_string();
    }
    if minutes < MONTH {
        let days = (minutes as f64 / DAY as f64).round() as i64;
        return format!("{} dias", days);
    }
    if minutes < 2 * MONTH {
        let months = (minutes as f64 / MONTH as f64).round() as i64;
        return if months == 1 {
            "cerca de 1 mês".to_string()
        } else {
            format!("cerca de {} meses", months)
        };
    }

    let months = minutes / MONTH;
    if months < 12 {
        let nearest = (minutes as f64 / MONTH as f64).round() as i64;
        return format!("{} meses", nearest);
    }

    let years = months / 12;
    let plural = |n: i64| if n == 1 { "ano" } else { "anos" };
    match months % 12 {
        0..=2 => format!("cerca de {} {}", years, plural(years)),
        3..=8 => format!("mais de {} {}", years, plural(years)),
        _ => format!("quase {} {}", years + 1, plural(years + 1)),
    }
}

/// "cerca de 2 horas atrás"
pub fn time_ago(then: DateTime<Utc>) -> String {
    format!("{} atrás", format_distance(then, Utc::now()))
}

/// Full HTML document around `body`
pub fn page(title: &str, viewer: Option<&SessionUser>, body: &str) -> String {
    let nav = match viewer {
        Some(user) => format!(
            r#"<a href="/{name_url}">{name}</a>
      <form method="post" action="/logout" style="display:inline"><button class="link" type="submit">Sair</button></form>"#,
            name_url = urlencoding::encode(&user.name),
            name = escape_html(&user.name),
        ),
        None => r#"<a href="/login">Entrar</a> <a href="/register">Cadastrar</a>"#.to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <style>{styles}</style>
  {htmx}
</head>
<body>
  <header>
    <a href="/"><strong>blog</strong></a>
    <nav>
      <a href="/">Em alta</a>
      <a href="/recent">Recentes</a>
      {nav}
    </nav>
  </header>
  <main>
{body}
  </main>
</body>
</html>"#,
        title = escape_html(title),
        styles = STYLES,
        htmx = HTMX_SCRIPT,
        nav = nav,
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ago(d: Duration) -> String {
        let now = Utc::now();
        format_distance(now - d, now)
    }

    #[test]
    fn escapes_markup_and_quotes() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn distances_read_like_date_fns() {
        assert_eq!(ago(Duration::seconds(10)), "menos de um minuto");
        assert_eq!(ago(Duration::seconds(70)), "1 minuto");
        assert_eq!(ago(Duration::minutes(5)), "5 minutos");
        assert_eq!(ago(Duration::minutes(60)), "cerca de 1 hora");
        assert_eq!(ago(Duration::hours(5)), "cerca de 5 horas");
        assert_eq!(ago(Duration::hours(30)), "1 dia");
        assert_eq!(ago(Duration::days(3)), "3 dias");
        assert_eq!(ago(Duration::days(35)), "cerca de 1 mês");
        assert_eq!(ago(Duration::days(95)), "3 meses");
        assert_eq!(ago(Duration::days(370)), "cerca de 1 ano");
        assert_eq!(ago(Duration::days(365 * 2 + 150)), "mais de 2 anos");
        assert_eq!(ago(Duration::days(365 * 2 + 320)), "quase 3 anos");
    }

    #[test]
    fn future_timestamps_clamp_to_now() {
        let now = Utc::now();
        assert_eq!(
            format_distance(now + Duration::minutes(5), now),
            "menos de um minuto"
        );
    }

    #[test]
    fn page_shows_login_links_for_anonymous_viewers() {
        let html = page("Início", None, "<p>oi</p>");
        assert!(html.contains(r#"href="/login""#));
        assert!(html.contains("<p>oi</p>"));
        assert!(html.contains("htmx.org"));
    }
}
