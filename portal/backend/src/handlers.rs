//! Request Handlers

use axum::{
    extract::{Path, State},
    http::{header::{REFERER, SET_COOKIE}, HeaderMap},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    Form,
};
use risk_inference::{Incident, RiskAssessment};
use serde::Deserialize;

use crate::{
    auth,
    error::PortalError,
    i18n::Language,
    models::{NewPrediction, RiskStats},
    render::{self, DashboardView},
    session::{self, AdminUser, CurrentUser, Session},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct PredictionForm {
    #[serde(default)]
    day: String,
    #[serde(default)]
    hour: String,
    #[serde(default)]
    injuries: String,
    #[serde(default)]
    location: String,
}

impl PredictionForm {
    fn into_incident(self) -> Result<Incident, PortalError> {
        let hour = self
            .hour
            .trim()
            .parse::<u8>()
            .map_err(|_| PortalError::Validation(format!("hour {:?} is not a valid hour", self.hour)))?;
        let injuries = self.injuries.trim().parse::<u32>().map_err(|_| {
            PortalError::Validation(format!("injuries {:?} is not a non-negative integer", self.injuries))
        })?;
        Ok(Incident { day: self.day, hour, injuries, location: self.location })
    }
}

pub async fn health() -> &'static str {
    "OK"
}

// ============ Auth ============

pub async fn login_page(State(state): State<AppState>, mut session: Session) -> Result<Response, PortalError> {
    let pending = session.take_flashes();
    let page = Html(render::login_page(session.language, &pending));
    if pending.is_empty() {
        Ok(page.into_response())
    } else {
        session.respond(&state.sessions, page)
    }
}

pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, PortalError> {
    let username = form.username.trim();
    let password = form.password.trim();

    match auth::authenticate(state.users.as_ref(), username, password).await? {
        Some(user) => {
            tracing::info!(user_id = user.id, username = %user.username, role = user.role.as_str(), "login succeeded");
            session.login(&user);
            session.respond(&state.sessions, Redirect::to("/"))
        }
        None => {
            tracing::warn!("login failed");
            let message = session.language.texts().bad_login;
            session.flash("danger", message);
            session.respond(&state.sessions, Redirect::to("/login"))
        }
    }
}

pub async fn logout(session: Session) -> Response {
    if let Some(user) = &session.user {
        tracing::info!(user_id = user.id, "logout");
    }
    (AppendHeaders([(SET_COOKIE, session::expired_cookie())]), Redirect::to("/login")).into_response()
}

pub async fn set_language(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    mut session: Session,
) -> Result<Response, PortalError> {
    session.language = Language::from_code_or_default(&code);
    let target = headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("/");
    session.respond(&state.sessions, Redirect::to(target))
}

// ============ Dashboard ============

pub async fn dashboard(State(state): State<AppState>, current: CurrentUser) -> Result<Html<String>, PortalError> {
    render_dashboard(&state, &current, None).await
}

pub async fn submit_prediction(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<PredictionForm>,
) -> Result<Html<String>, PortalError> {
    let incident = form.into_incident()?;
    let assessment = state.engine.predict_risk(&incident)?;

    let record = state
        .predictions
        .insert(NewPrediction { user_id: current.user.id, incident, assessment })
        .await?;
    tracing::info!(
        user_id = current.user.id,
        prediction_id = record.id,
        score = assessment.score,
        level = %assessment.level,
        "prediction stored"
    );

    render_dashboard(&state, &current, Some(assessment)).await
}

async fn render_dashboard(
    state: &AppState,
    current: &CurrentUser,
    latest: Option<RiskAssessment>,
) -> Result<Html<String>, PortalError> {
    let history = state
        .predictions
        .recent_for_user(current.user.id, state.limits.history)
        .await?;
    let stats = RiskStats::from_records(&history);

    Ok(Html(render::dashboard(&DashboardView {
        lang: current.session.language,
        user: &current.user,
        days: state.engine.known_days(),
        locations: state.engine.known_locations(),
        latest,
        history: &history,
        stats,
    })))
}

// ============ Admin ============

pub async fn admin(State(state): State<AppState>, AdminUser(current): AdminUser) -> Result<Html<String>, PortalError> {
    let rows = state.predictions.recent_all(state.limits.admin).await?;
    Ok(Html(render::admin(current.session.language, &current.user, &rows)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{hash_password, SessionKeys},
        build_router,
        i18n::{AR, EN},
        models::{NewUser, Role},
        store::{InMemoryStore, PredictionRepository, UserRepository},
        Limits,
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use risk_inference::{LabelEncoder, RiskEngine, RiskModel};
    use risk_inference::models::LinearModel;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        store: Arc<InMemoryStore>,
        keys: Arc<SessionKeys>,
    }

    // score = 0.1 * injuries, so injuries 2 / 5 / 8 give Low / Medium / High
    fn engine() -> RiskEngine {
        RiskEngine::new(
            RiskModel::Linear(LinearModel { intercept: 0.0, coefficients: vec![0.0, 0.0, 0.1, 0.0] }),
            LabelEncoder::from_classes("day", vec!["Friday".into(), "Monday".into()]).unwrap(),
            LabelEncoder::from_classes("location", vec!["Olaya St".into(), "Ring Rd".into()]).unwrap(),
        )
        .unwrap()
    }

    async fn harness() -> Harness {
        let store = Arc::new(InMemoryStore::new());
        for (name, role, language) in [
            ("admin", Role::Admin, None),
            ("sara", Role::User, None),
            ("omar", Role::User, Some(Language::En)),
        ] {
            store
                .create(NewUser {
                    username: name.into(),
                    password_hash: hash_password(&format!("{name}-pw")).unwrap(),
                    role,
                    language,
                })
                .await
                .unwrap();
        }
        let keys = Arc::new(SessionKeys::new(b"test-secret", 8));
        let state = AppState {
            users: store.clone(),
            predictions: store.clone(),
            engine: Arc::new(engine()),
            sessions: keys.clone(),
            limits: Limits { history: 50, admin: 200 },
        };
        Harness { app: build_router(state), store, keys }
    }

    impl Harness {
        async fn send(&self, req: Request<Body>) -> Response {
            self.app.clone().oneshot(req).await.unwrap()
        }

        async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
            let mut req = Request::get(uri);
            if let Some(c) = cookie {
                req = req.header(header::COOKIE, c);
            }
            self.send(req.body(Body::empty()).unwrap()).await
        }

        async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response {
            let mut req = Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
            if let Some(c) = cookie {
                req = req.header(header::COOKIE, c);
            }
            self.send(req.body(Body::from(body.to_string())).unwrap()).await
        }

        async fn login(&self, username: &str, password: &str) -> String {
            let resp = self
                .post_form("/login", None, &format!("username={username}&password={password}"))
                .await;
            assert_eq!(resp.status(), StatusCode::SEE_OTHER);
            session_cookie(&resp).expect("login sets a cookie")
        }

        fn decode(&self, cookie: &str) -> Session {
            let token = cookie.strip_prefix("portal_session=").unwrap();
            self.keys.verify_token(token).unwrap()
        }
    }

    fn session_cookie(resp: &Response) -> Option<String> {
        let raw = resp.headers().get(header::SET_COOKIE)?.to_str().ok()?;
        raw.split(';').next().map(str::to_string)
    }

    fn location(resp: &Response) -> &str {
        resp.headers().get(header::LOCATION).unwrap().to_str().unwrap()
    }

    async fn body(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_protected_pages_redirect_to_login() {
        let h = harness().await;
        for uri in ["/", "/admin"] {
            let resp = h.get(uri, None).await;
            assert_eq!(resp.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&resp), "/login");
        }
        let resp = h.post_form("/", None, "day=Monday&hour=1&injuries=1&location=Ring+Rd").await;
        assert_eq!(location(&resp), "/login");
        assert_eq!(h.store.prediction_count(), 0);
    }

    #[tokio::test]
    async fn test_login_establishes_session() {
        let h = harness().await;
        let resp = h.post_form("/login", None, "username=+sara+&password=sara-pw").await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/");

        let cookie = session_cookie(&resp).unwrap();
        let session = h.decode(&cookie);
        let user = session.user.unwrap();
        assert_eq!(user.id, 2);
        assert_eq!(user.username, "sara");
        assert_eq!(user.role, Role::User);

        let resp = h.get("/", Some(&cookie)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body(resp).await.contains("sara"));
    }

    #[tokio::test]
    async fn test_bad_login_never_establishes_session() {
        let h = harness().await;
        for form in ["username=sara&password=wrong", "username=nobody&password=sara-pw", ""] {
            let resp = h.post_form("/login", None, form).await;
            assert_eq!(location(&resp), "/login");
            let cookie = session_cookie(&resp).unwrap();
            assert!(h.decode(&cookie).user.is_none());

            let page = h.get("/login", Some(&cookie)).await;
            assert!(session_cookie(&page).is_some(), "flash consumed");
            assert!(body(page).await.contains(AR.bad_login));

            let dash = h.get("/", Some(&cookie)).await;
            assert_eq!(location(&dash), "/login");
        }
    }

    #[derive(Clone, Default)]
    struct LogCapture(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_login_log_omits_username() {
        let h = harness().await;
        let capture = LogCapture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        h.post_form("/login", None, "username=my-secret-pw&password=x").await;

        let logs = String::from_utf8(capture.0.lock().clone()).unwrap();
        assert!(logs.contains("login failed"));
        assert!(!logs.contains("my-secret-pw"));
    }

    #[tokio::test]
    async fn test_login_uses_account_language_or_keeps_session_language() {
        let h = harness().await;

        let omar = h.login("omar", "omar-pw").await;
        assert_eq!(h.decode(&omar).language, Language::En);

        let resp = h.get("/lang/en", None).await;
        let english = session_cookie(&resp).unwrap();
        let resp = h
            .post_form("/login", Some(&english), "username=sara&password=sara-pw")
            .await;
        assert_eq!(h.decode(&session_cookie(&resp).unwrap()).language, Language::En);
    }

    #[tokio::test]
    async fn test_prediction_inserts_exactly_one_row() {
        let h = harness().await;
        let cookie = h.login("sara", "sara-pw").await;

        let resp = h
            .post_form("/", Some(&cookie), "day=Monday&hour=17&injuries=5&location=Olaya+St")
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let page = body(resp).await;
        assert_eq!(h.store.prediction_count(), 1);

        let stored = h.store.recent_for_user(2, 50).await.unwrap();
        assert_eq!(stored.len(), 1);
        let expected = RiskAssessment::from_score(stored[0].risk_score).result_string();
        assert_eq!(stored[0].prediction_result, expected);
        assert!(stored[0].prediction_result.ends_with("% (Medium)"));
        assert_eq!((stored[0].hour, stored[0].injuries), (17, 5));
        assert!(page.contains(&expected));
    }

    #[tokio::test]
    async fn test_dashboard_statistics() {
        let h = harness().await;
        let cookie = h.login("sara", "sara-pw").await;
        for injuries in [1, 2, 5, 9, 9] {
            let form = format!("day=Friday&hour=8&injuries={injuries}&location=Ring+Rd");
            h.post_form("/", Some(&cookie), &form).await;
        }
        let page = body(h.get("/", Some(&cookie)).await).await;
        assert!(page.contains(
            "data-low=\"2\" data-medium=\"1\" data-high=\"2\" data-total=\"5\""
        ));

        // other users see only their own history
        let omar = h.login("omar", "omar-pw").await;
        let page = body(h.get("/", Some(&omar)).await).await;
        assert!(page.contains("data-total=\"0\""));
        assert!(page.contains(EN.no_history));
    }

    #[tokio::test]
    async fn test_invalid_prediction_input_rejected() {
        let h = harness().await;
        let cookie = h.login("sara", "sara-pw").await;
        for form in [
            "day=Monday&hour=abc&injuries=1&location=Olaya+St",
            "day=Monday&hour=24&injuries=1&location=Olaya+St",
            "day=Monday&hour=3&injuries=-1&location=Olaya+St",
            "day=Caturday&hour=3&injuries=1&location=Olaya+St",
            "day=Monday&hour=3&injuries=1&location=Atlantis",
        ] {
            let resp = h.post_form("/", Some(&cookie), form).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{form}");
        }
        assert_eq!(h.store.prediction_count(), 0);
    }

    #[tokio::test]
    async fn test_admin_view_requires_admin_role() {
        let h = harness().await;
        let sara = h.login("sara", "sara-pw").await;
        h.post_form("/", Some(&sara), "day=Monday&hour=2&injuries=8&location=Ring+Rd").await;

        let resp = h.get("/admin", Some(&sara)).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/");
        assert!(!body(resp).await.contains("Ring Rd"));

        let admin = h.login("admin", "admin-pw").await;
        let resp = h.get("/admin", Some(&admin)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let page = body(resp).await;
        assert!(page.contains("<td>sara</td>"));
        assert!(page.contains("(High)"));
    }

    #[tokio::test]
    async fn test_language_switch() {
        let h = harness().await;

        let resp = h.get("/lang/fr", None).await;
        assert_eq!(location(&resp), "/");
        assert_eq!(h.decode(&session_cookie(&resp).unwrap()).language, Language::Ar);

        let resp = h
            .send(Request::get("/lang/en").header(header::REFERER, "/admin").body(Body::empty()).unwrap())
            .await;
        assert_eq!(location(&resp), "/admin");
        let cookie = session_cookie(&resp).unwrap();

        // persists on later requests in the same session
        let page = body(h.get("/login", Some(&cookie)).await).await;
        assert!(page.contains(EN.submit));
        assert!(page.contains("lang=\"en\""));

        let resp = h.get("/lang/ar", Some(&cookie)).await;
        let cookie = session_cookie(&resp).unwrap();
        let page = body(h.get("/login", Some(&cookie)).await).await;
        assert!(page.contains(AR.submit));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let h = harness().await;
        let cookie = h.login("omar", "omar-pw").await;

        let resp = h.get("/logout", Some(&cookie)).await;
        assert_eq!(location(&resp), "/login");
        let set = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set.starts_with("portal_session=;"));
        assert!(set.contains("Max-Age=0"));

        let cleared = session_cookie(&resp).unwrap();
        assert_eq!(location(&h.get("/", Some(&cleared)).await), "/login");
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness().await;
        let resp = h.get("/health", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(resp).await, "OK");
    }
}
