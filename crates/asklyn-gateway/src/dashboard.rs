//! Embedded single-page chat UI served at `/`.

const DASHBOARD_HTML: &str = include_str!("dashboard.html");

pub fn dashboard_html() -> &'static str {
    DASHBOARD_HTML
}
