//! HTML served by the session layer itself: the login form and the application shell.
//! The registry pages proper are rendered client-side against the external API.

use axum::extract::Request;
use axum::response::{Html, IntoResponse, Response};

use crate::identity::RequestContext;

const LOGIN_HTML: &str = r#"<!doctype html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<title>Entrar · Cadastro de Apólices</title>
<link rel="stylesheet" href="/static/app.css">
</head>
<body>
<form id="login" class="card">
  <h1>Entrar</h1>
  <p>Acesse com seu usuário e perfil.</p>
  <label>E-mail <input id="email" type="email" required autofocus></label>
  <label>Senha <input id="senha" type="password" required></label>
  <div id="erro" class="error" hidden></div>
  <button type="submit">Entrar</button>
</form>
<script>
// only same-origin paths; anything else ("javascript:", "//host", "/\host") goes home
function safeFrom(raw) {
  if (!raw || raw.charAt(0) !== "/" || raw.charAt(1) === "/") return "/";
  if (/[\\\u0000-\u001f\u007f]/.test(raw)) return "/";
  return raw;
}
const from = safeFrom(new URLSearchParams(location.search).get("from"));
fetch("/api/auth/me", { cache: "no-store" })
  .then(r => r.json())
  .then(d => { if (d && d.user) location.replace(from); })
  .catch(() => {});
document.getElementById("login").addEventListener("submit", async (e) => {
  e.preventDefault();
  const erro = document.getElementById("erro");
  erro.hidden = true;
  const res = await fetch("/api/auth/login", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify({
      email: document.getElementById("email").value.trim(),
      password: document.getElementById("senha").value,
    }),
  });
  if (res.ok) { location.replace(from); return; }
  erro.textContent = "Usuário ou senha inválidos.";
  erro.hidden = false;
});
</script>
</body>
</html>
"#;

pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_HTML)
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Shell for every gated page. Admin-only affordances are advisory here; the gate's role
/// check and the domain API are what enforce them.
pub fn render_shell(ctx: &RequestContext) -> String {
    let role_label = if ctx.user.role.is_admin() { "Administrador" } else { "Visualização" };
    let admin_controls = if ctx.user.role.is_admin() {
        r#"<a class="btn" href="/apolices?novo=1" data-admin>Nova apólice</a>"#
    } else {
        ""
    };
    format!(
        r#"<!doctype html>
<html lang="pt-BR">
<head><meta charset="utf-8"><title>Cadastro de Apólices</title><link rel="stylesheet" href="/static/app.css"></head>
<body data-path="{path}" data-role="{role}">
<header class="navbar">
  <span class="title">Cadastro de Apólices</span>
  <nav><a href="/">Início</a> <a href="/pessoas">Pessoas</a> <a href="/imoveis">Imóveis</a> <a href="/apolices">Apólices</a></nav>
  <span class="user">{name} · {role_label}</span>
  {admin_controls}
  <button id="sair">Sair</button>
</header>
<main id="app"></main>
<script>
document.getElementById("sair").addEventListener("click", async () => {{
  try {{ await fetch("/api/auth/logout", {{ method: "POST" }}); }} catch (_) {{}}
  location.href = "/login";
}});
</script>
<script src="/static/app.js"></script>
</body>
</html>
"#,
        path = escape_html(&ctx.path),
        role = ctx.user.role.as_str(),
        name = escape_html(&ctx.user.name),
        role_label = role_label,
        admin_controls = admin_controls,
    )
}

/// Fallback for every path not routed elsewhere. Only reached past the gate.
pub async fn app_shell(req: Request) -> Response {
    match req.extensions().get::<RequestContext>() {
        Some(ctx) => Html(render_shell(ctx)).into_response(),
        None => axum::http::StatusCode::NOT_FOUND.into_response(),
    }
}
