//! Server-side HTML rendering
//!
//! Pages are assembled with a small append-only writer. Every piece of
//! user or database text goes through [`esc`].

use risk_inference::{RiskAssessment, RiskLevel};

use crate::i18n::{Language, Translations};
use crate::models::{AdminPredictionRow, PredictionRecord, RiskStats};
use crate::session::{Flash, SessionUser};

const CSS: &str = "body{font-family:system-ui,sans-serif;margin:0;background:#f4f6f8;color:#222}\
header{background:#1f3b57;color:#fff;padding:12px 24px;display:flex;gap:16px;align-items:center}\
header a{color:#fff}header .spacer{flex:1}\
main{max-width:1100px;margin:24px auto;padding:0 16px}\
section{background:#fff;border-radius:6px;padding:16px 20px;margin-bottom:20px}\
table{width:100%;border-collapse:collapse}th,td{padding:6px 8px;border-bottom:1px solid #ddd;text-align:start}\
.alert-danger{background:#f8d7da;color:#721c24;padding:10px;border-radius:4px}\
.level-low{color:#1e7e34}.level-medium{color:#b8860b}.level-high{color:#c82333}\
.bar{height:12px;border-radius:3px}.bar.level-low{background:#28a745}\
.bar.level-medium{background:#ffc107}.bar.level-high{background:#dc3545}\
form.inline label{display:inline-block;margin:0 12px 8px 0}";

struct Html {
    buf: String,
}

impl Html {
    fn new() -> Self {
        Self { buf: String::with_capacity(8 * 1024) }
    }

    fn push<S: AsRef<str>>(&mut self, s: S) {
        self.buf.push_str(s.as_ref());
    }

    fn text(&mut self, s: &str) {
        self.buf.push_str(&esc(s));
    }

    fn finish(self) -> String {
        self.buf
    }
}

/// Escape text for element content and quoted attributes.
pub fn esc(s: &str) -> String {
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

fn level_class(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "level-low",
        RiskLevel::Medium => "level-medium",
        RiskLevel::High => "level-high",
    }
}

fn open_page(w: &mut Html, lang: Language, title: &str) {
    w.push("<!DOCTYPE html><html lang=\"");
    w.push(lang.code());
    w.push("\" dir=\"");
    w.push(lang.dir());
    w.push("\"><head><meta charset=\"utf-8\">");
    w.push("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"><title>");
    w.text(title);
    w.push("</title><style>");
    w.push(CSS);
    w.push("</style></head><body>");
}

fn close_page(w: &mut Html) {
    w.push("</main></body></html>");
}

fn language_link(w: &mut Html, lang: Language, t: &Translations) {
    let other = match lang {
        Language::Ar => Language::En,
        Language::En => Language::Ar,
    };
    w.push("<a href=\"/lang/");
    w.push(other.code());
    w.push("\">");
    w.text(t.switch_language);
    w.push("</a>");
}

fn header(w: &mut Html, lang: Language, user: Option<&SessionUser>) {
    let t = lang.texts();
    w.push("<header><strong>");
    w.text(t.title);
    w.push("</strong><span class=\"spacer\"></span>");
    if let Some(user) = user {
        w.push("<a href=\"/\">");
        w.text(t.dashboard);
        w.push("</a>");
        if user.role.is_admin() {
            w.push("<a href=\"/admin\">");
            w.text(t.admin_panel);
            w.push("</a>");
        }
        w.push("<span class=\"user\">");
        w.text(&user.username);
        w.push(" (");
        w.text(user.role.as_str());
        w.push(")</span><a href=\"/logout\">");
        w.text(t.logout);
        w.push("</a>");
    }
    language_link(w, lang, t);
    w.push("</header><main>");
}

fn flashes(w: &mut Html, flashes: &[Flash]) {
    for flash in flashes {
        w.push("<div class=\"alert alert-");
        w.text(&flash.category);
        w.push("\">");
        w.text(&flash.message);
        w.push("</div>");
    }
}

/// Login form
pub fn login_page(lang: Language, pending: &[Flash]) -> String {
    let t = lang.texts();
    let mut w = Html::new();
    open_page(&mut w, lang, t.login);
    header(&mut w, lang, None);

    w.push("<section><h1>");
    w.text(t.project_title);
    w.push("</h1><h2>");
    w.text(t.login);
    w.push("</h2>");
    flashes(&mut w, pending);
    w.push("<form method=\"post\" action=\"/login\"><p><label>");
    w.text(t.username);
    w.push("<br><input name=\"username\" required></label></p><p><label>");
    w.text(t.password);
    w.push("<br><input name=\"password\" type=\"password\" required></label></p><button type=\"submit\">");
    w.text(t.submit);
    w.push("</button></form></section>");

    close_page(&mut w);
    w.finish()
}

/// Everything the dashboard shows
pub struct DashboardView<'a> {
    pub lang: Language,
    pub user: &'a SessionUser,
    pub days: &'a [String],
    pub locations: &'a [String],
    pub latest: Option<RiskAssessment>,
    pub history: &'a [PredictionRecord],
    pub stats: RiskStats,
}

fn select(w: &mut Html, name: &str, label: &str, options: &[String]) {
    w.push("<label>");
    w.text(label);
    w.push("<br><select name=\"");
    w.push(name);
    w.push("\" required>");
    for option in options {
        w.push("<option value=\"");
        w.text(option);
        w.push("\">");
        w.text(option);
        w.push("</option>");
    }
    w.push("</select></label>");
}

fn number_input(w: &mut Html, name: &str, label: &str, max: Option<u32>) {
    w.push("<label>");
    w.text(label);
    w.push("<br><input type=\"number\" name=\"");
    w.push(name);
    w.push("\" min=\"0\"");
    if let Some(max) = max {
        w.push(format!(" max=\"{max}\""));
    }
    w.push(" required></label>");
}

fn stats_section(w: &mut Html, t: &Translations, stats: &RiskStats) {
    w.push(format!(
        "<section class=\"stats\" data-low=\"{}\" data-medium=\"{}\" data-high=\"{}\" data-total=\"{}\"><h2>",
        stats.low, stats.medium, stats.high, stats.total
    ));
    w.text(t.statistics);
    w.push("</h2><table>");
    for level in RiskLevel::all() {
        let pct = stats.percent(level);
        w.push("<tr><td class=\"");
        w.push(level_class(level));
        w.push("\">");
        w.text(t.level(level));
        w.push(format!(
            "</td><td>{}</td><td>{pct:.1}%</td><td style=\"width:50%\"><div class=\"bar {}\" style=\"width:{pct:.1}%\"></div></td></tr>",
            stats.count(level),
            level_class(level)
        ));
    }
    w.push("<tr><th>");
    w.text(t.total);
    w.push(format!("</th><th>{}</th><th></th><th></th></tr></table></section>", stats.total));
}

fn history_header(w: &mut Html, t: &Translations, with_user: bool) {
    w.push("<table><thead><tr>");
    if with_user {
        w.push("<th>");
        w.text(t.user);
        w.push("</th>");
    }
    for label in [t.day, t.hour, t.injuries, t.location, t.result, t.created_at] {
        w.push("<th>");
        w.text(label);
        w.push("</th>");
    }
    w.push("</tr></thead><tbody>");
}

fn history_cells(w: &mut Html, r: &PredictionRecord) {
    w.push("<td>");
    w.text(&r.day);
    w.push(format!("</td><td>{}</td><td>{}</td><td>", r.hour, r.injuries));
    w.text(&r.location);
    w.push("</td><td class=\"");
    w.push(level_class(r.risk_level));
    w.push("\">");
    w.text(&r.prediction_result);
    w.push("</td><td>");
    w.push(r.created_at.format("%Y-%m-%d %H:%M:%S").to_string());
    w.push("</td>");
}

/// Prediction form, latest result, statistics and personal history
pub fn dashboard(view: &DashboardView<'_>) -> String {
    let lang = view.lang;
    let t = lang.texts();
    let mut w = Html::new();
    open_page(&mut w, lang, t.title);
    header(&mut w, lang, Some(view.user));

    w.push("<section><h1>");
    w.text(t.project_title);
    w.push("</h1><form class=\"inline\" method=\"post\" action=\"/\">");
    select(&mut w, "day", t.day, view.days);
    number_input(&mut w, "hour", t.hour, Some(23));
    number_input(&mut w, "injuries", t.injuries, None);
    select(&mut w, "location", t.location, view.locations);
    w.push("<br><button type=\"submit\">");
    w.text(t.predict);
    w.push("</button></form></section>");

    if let Some(latest) = view.latest {
        w.push("<section class=\"result\"><h2>");
        w.text(t.result);
        w.push("</h2><p>");
        w.text(t.risk_score);
        w.push(format!(": <strong>{}</strong></p><p>", latest.score));
        w.text(t.risk_level);
        w.push(": <strong class=\"");
        w.push(level_class(latest.level));
        w.push("\">");
        w.text(t.level(latest.level));
        w.push("</strong></p><p class=\"result-string\">");
        w.text(&latest.result_string());
        w.push("</p></section>");
    }

    stats_section(&mut w, t, &view.stats);

    w.push("<section><h2>");
    w.text(t.history);
    w.push("</h2>");
    if view.history.is_empty() {
        w.push("<p>");
        w.text(t.no_history);
        w.push("</p>");
    } else {
        history_header(&mut w, t, false);
        for record in view.history {
            w.push("<tr>");
            history_cells(&mut w, record);
            w.push("</tr>");
        }
        w.push("</tbody></table>");
    }
    w.push("</section>");

    close_page(&mut w);
    w.finish()
}

/// Recent predictions across all users
pub fn admin(lang: Language, user: &SessionUser, rows: &[AdminPredictionRow]) -> String {
    let t = lang.texts();
    let mut w = Html::new();
    open_page(&mut w, lang, t.admin_panel);
    header(&mut w, lang, Some(user));

    w.push("<section><h1>");
    w.text(t.admin_panel);
    w.push("</h1>");
    if rows.is_empty() {
        w.push("<p>");
        w.text(t.no_history);
        w.push("</p>");
    } else {
        history_header(&mut w, t, true);
        for row in rows {
            w.push("<tr><td>");
            w.text(&row.username);
            w.push("</td>");
            history_cells(&mut w, &row.record);
            w.push("</tr>");
        }
        w.push("</tbody></table>");
    }
    w.push("</section>");

    close_page(&mut w);
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Utc;

    fn user() -> SessionUser {
        SessionUser { id: 1, username: "<script>".into(), role: Role::User }
    }

    #[test]
    fn test_escape() {
        assert_eq!(esc(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_login_page_direction_and_flash() {
        let flash = Flash { category: "danger".into(), message: "bad".into() };
        let html = login_page(Language::Ar, &[flash]);
        assert!(html.contains("dir=\"rtl\""));
        assert!(html.contains("<div class=\"alert alert-danger\">bad</div>"));
        assert!(html.contains("/lang/en"));

        let html = login_page(Language::En, &[]);
        assert!(html.contains("dir=\"ltr\""));
        assert!(!html.contains("<div class=\"alert "));
    }

    #[test]
    fn test_dashboard_escapes_user_data() {
        let u = user();
        let record = PredictionRecord {
            id: 1,
            user_id: 1,
            day: "Mon<b>".into(),
            hour: 3,
            injuries: 1,
            location: "A & B".into(),
            prediction_result: "0.1% (Low)".into(),
            risk_score: 0.1,
            risk_level: RiskLevel::Low,
            created_at: Utc::now(),
        };
        let days = vec!["Mon<b>".to_string()];
        let view = DashboardView {
            lang: Language::En,
            user: &u,
            days: &days,
            locations: &[],
            latest: Some(RiskAssessment::from_score(0.1)),
            history: std::slice::from_ref(&record),
            stats: RiskStats::from_records([&record]),
        };
        let html = dashboard(&view);
        assert!(!html.contains("<script>"));
        assert!(!html.contains("Mon<b>"));
        assert!(html.contains("A &amp; B"));
        assert!(html.contains("data-total=\"1\""));
        assert!(html.contains("0.1% (Low)"));
    }

    #[test]
    fn test_admin_link_only_for_admins() {
        let mut u = user();
        let view = DashboardView {
            lang: Language::En,
            user: &u,
            days: &[],
            locations: &[],
            latest: None,
            history: &[],
            stats: RiskStats::default(),
        };
        assert!(!dashboard(&view).contains("href=\"/admin\""));

        u.role = Role::Admin;
        assert!(admin(Language::En, &u, &[]).contains("href=\"/admin\""));
    }
}
