//! HTML pages
//!
//! Small inline templates. Every caller-supplied value is escaped.

use axum::response::Html;
use html_escape::encode_text;

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title} - sessiongate</title>
</head>
<body>
{body}
</body>
</html>
"#,
        title = encode_text(title),
        body = body,
    )
}

/// Login form posting to /login
pub fn login_page() -> String {
    layout(
        "Login",
        r#"    <h1>Login</h1>
    <form method="post" action="/login">
        <label>Username <input type="text" name="username" required></label>
        <label>Password <input type="password" name="password" required></label>
        <button type="submit">Log in</button>
    </form>"#,
    )
}

/// Profile page for `username`
pub fn profile_page(username: &str) -> String {
    let username = encode_text(username);
    layout(
        "Profile",
        &format!(
            r#"    <h1>Welcome, {username}!</h1>
    <p>This is your profile page.</p>
    <form method="post" action="/logout">
        <button type="submit">Log out</button>
    </form>"#
        ),
    )
}

/// Error page with a link back to the login form
pub fn error_page(title: &str, message: &str) -> Html<String> {
    Html(layout(
        title,
        &format!(
            r#"    <h1>{title}</h1>
    <p>{message}</p>
    <a href="/login">Back to login</a>"#,
            title = encode_text(title),
            message = encode_text(message),
        ),
    ))
}
