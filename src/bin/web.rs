//! Single binary web server: HTML from templates/, static from /static, bracket API via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! Other env: CATALOG_PATH, FIELD_SIZE, AWARD_YEAR, ADMIN_TOKEN, SESSION_KEY, SECURE_COOKIES.

use actix_files::Files;
use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::{
    cookie::Key,
    delete, get, post, put,
    web::{self, Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use track_award_web::{
    build_bracket, decide_grand_final, decide_lower_match, decide_upper_match, derive_placements,
    load_catalog, rank_releases, select_field, Access, BracketError, BracketState, FieldOptions,
    Placements, Release, ReleaseKind, Side, DEFAULT_FIELD_SIZE,
};
use uuid::Uuid;

/// Unique identifier for a voting session's bracket.
type BracketId = Uuid;

/// Per-bracket entry: bracket state + last activity time (for auto-cleanup).
struct BracketEntry {
    bracket: BracketState,
    last_activity: Instant,
}

/// In-memory state: one bracket per voting session. Entries are removed after 12h inactivity.
type AppState = Data<RwLock<HashMap<BracketId, BracketEntry>>>;

/// Releases loaded at startup.
type Catalog = Data<Vec<Release>>;

type Settings = Data<ServerConfig>;

/// Inactivity threshold: brackets not accessed for this long are removed.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

/// Session key holding the operator flag.
const OPERATOR_KEY: &str = "operator";

const DEFAULT_TOP_LIMIT: usize = 100;

/// Settings read from the environment at startup.
struct ServerConfig {
    host: String,
    port: u16,
    catalog_path: String,
    field_size: usize,
    award_year: Option<i32>,
    admin_token: Option<String>,
    session_key: Option<String>,
    secure_cookies: bool,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| default_host()),
            port: env_parse("PORT").unwrap_or_else(default_port),
            catalog_path: std::env::var("CATALOG_PATH").unwrap_or_else(|_| default_catalog_path()),
            field_size: env_parse("FIELD_SIZE").unwrap_or(DEFAULT_FIELD_SIZE),
            award_year: env_parse("AWARD_YEAR"),
            admin_token: std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
            session_key: std::env::var("SESSION_KEY").ok(),
            secure_cookies: env_parse("SECURE_COOKIES").unwrap_or(false),
        }
    }

    fn field_options(&self, size: Option<usize>, year: Option<i32>) -> FieldOptions {
        FieldOptions {
            kind: ReleaseKind::Track,
            year: year.or(self.award_year),
            size: size.unwrap_or(self.field_size),
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_catalog_path() -> String {
    "data/releases.csv".to_string()
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Serialize)]
struct SessionResponse {
    operator: bool,
}

/// Bracket as returned by the API: state plus the standings derived from it.
#[derive(Serialize)]
struct BracketView<'a> {
    id: BracketId,
    bracket: &'a BracketState,
    placements: Placements,
}

impl<'a> BracketView<'a> {
    fn new(id: BracketId, bracket: &'a BracketState) -> Self {
        Self {
            id,
            bracket,
            placements: derive_placements(bracket),
        }
    }
}

#[derive(Deserialize)]
struct TopQuery {
    kind: Option<ReleaseKind>,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct OperatorLoginBody {
    token: String,
}

#[derive(Deserialize, Default)]
struct CreateBracketBody {
    size: Option<usize>,
    year: Option<i32>,
}

#[derive(Deserialize)]
struct DecideMatchBody {
    round: usize,
    match_index: usize,
    side: Side,
}

#[derive(Deserialize)]
struct DecideGrandFinalBody {
    side: Side,
}

/// Path segment: bracket id (e.g. /api/brackets/{id})
#[derive(Deserialize)]
struct BracketPath {
    id: BracketId,
}

/// Operator capability of the current session. Unreadable sessions count as observers.
fn session_access(session: &Session) -> Access {
    let flag = session.get::<bool>(OPERATOR_KEY).unwrap_or_else(|e| {
        log::warn!("Could not read session: {}", e);
        None
    });
    Access::from_flag(flag.unwrap_or(false))
}

fn bracket_error(e: BracketError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        BracketError::Unauthorized => HttpResponse::Forbidden().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn no_bracket() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "No bracket" }))
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "track-award-web",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Top releases of one kind by official total (default: tracks, 100 entries).
#[get("/api/top")]
async fn api_top(catalog: Catalog, query: Query<TopQuery>) -> HttpResponse {
    let kind = query.kind.unwrap_or_default();
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    let top: Vec<&Release> = rank_releases(&catalog, kind).into_iter().take(limit).collect();
    HttpResponse::Ok().json(top)
}

/// Candidates a new bracket would be seeded with.
#[get("/api/field")]
async fn api_field(catalog: Catalog, settings: Settings) -> HttpResponse {
    let field = select_field(&catalog, &settings.field_options(None, None));
    HttpResponse::Ok().json(field)
}

/// Whether the current session may pick winners.
#[get("/api/session")]
async fn api_session(session: Session) -> HttpResponse {
    HttpResponse::Ok().json(SessionResponse {
        operator: session_access(&session).is_operator(),
    })
}

/// Become an operator by presenting ADMIN_TOKEN.
#[post("/api/session/operator")]
async fn api_operator_login(
    session: Session,
    settings: Settings,
    body: Json<OperatorLoginBody>,
) -> HttpResponse {
    let Some(expected) = settings.admin_token.as_deref() else {
        return HttpResponse::Forbidden()
            .json(serde_json::json!({ "error": "Operator login is disabled" }));
    };
    if !Access::from_token(&body.token, Some(expected)).is_operator() {
        log::warn!("Rejected operator login: wrong token");
        return HttpResponse::Forbidden().json(serde_json::json!({ "error": "Wrong token" }));
    }
    session.renew();
    if let Err(e) = session.insert(OPERATOR_KEY, true) {
        log::error!("Could not store operator session: {}", e);
        return HttpResponse::InternalServerError().body("session error");
    }
    log::info!("Operator session started");
    HttpResponse::Ok().json(SessionResponse { operator: true })
}

/// Drop the operator capability from the current session.
#[delete("/api/session/operator")]
async fn api_operator_logout(session: Session) -> HttpResponse {
    session.remove(OPERATOR_KEY);
    HttpResponse::Ok().json(SessionResponse { operator: false })
}

/// Create a bracket from the current catalog (returns it with id; client stores id for subsequent requests).
#[post("/api/brackets")]
async fn api_create_bracket(
    state: AppState,
    catalog: Catalog,
    settings: Settings,
    body: Option<Json<CreateBracketBody>>,
) -> HttpResponse {
    let body = body.map(Json::into_inner).unwrap_or_default();
    let field = select_field(&catalog, &settings.field_options(body.size, body.year));
    let bracket = build_bracket(&field);
    let id = Uuid::new_v4();
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = g.entry(id).or_insert(BracketEntry {
        bracket,
        last_activity: Instant::now(),
    });
    HttpResponse::Ok().json(BracketView::new(id, &entry.bracket))
}

/// Get a bracket by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/brackets/{id}")]
async fn api_get_bracket(state: AppState, path: Path<BracketPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&path.id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            HttpResponse::Ok().json(BracketView::new(path.id, &entry.bracket))
        }
        None => no_bracket(),
    }
}

/// Current standings only.
#[get("/api/brackets/{id}/placements")]
async fn api_get_placements(state: AppState, path: Path<BracketPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get(&path.id) {
        Some(entry) => HttpResponse::Ok().json(derive_placements(&entry.bracket)),
        None => no_bracket(),
    }
}

/// Pick the winner of an upper-bracket match (operators only).
#[put("/api/brackets/{id}/upper/winner")]
async fn api_decide_upper(
    state: AppState,
    session: Session,
    path: Path<BracketPath>,
    body: Json<DecideMatchBody>,
) -> HttpResponse {
    let access = session_access(&session);
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_bracket(),
    };
    entry.last_activity = Instant::now();
    let b = &mut entry.bracket;
    match decide_upper_match(b, access, body.round, body.match_index, body.side) {
        Ok(()) => HttpResponse::Ok().json(BracketView::new(path.id, b)),
        Err(e) => bracket_error(e),
    }
}

/// Pick the winner of a lower-bracket match (operators only).
#[put("/api/brackets/{id}/lower/winner")]
async fn api_decide_lower(
    state: AppState,
    session: Session,
    path: Path<BracketPath>,
    body: Json<DecideMatchBody>,
) -> HttpResponse {
    let access = session_access(&session);
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_bracket(),
    };
    entry.last_activity = Instant::now();
    let b = &mut entry.bracket;
    match decide_lower_match(b, access, body.round, body.match_index, body.side) {
        Ok(()) => HttpResponse::Ok().json(BracketView::new(path.id, b)),
        Err(e) => bracket_error(e),
    }
}

/// Pick the grand final winner (operators only).
#[put("/api/brackets/{id}/grand-final/winner")]
async fn api_decide_grand_final(
    state: AppState,
    session: Session,
    path: Path<BracketPath>,
    body: Json<DecideGrandFinalBody>,
) -> HttpResponse {
    let access = session_access(&session);
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_bracket(),
    };
    entry.last_activity = Instant::now();
    let b = &mut entry.bracket;
    match decide_grand_final(b, access, body.side) {
        Ok(()) => HttpResponse::Ok().json(BracketView::new(path.id, b)),
        Err(e) => bracket_error(e),
    }
}

/// Cookie signing key: SESSION_KEY when it is long enough, otherwise a per-process key.
fn session_key(config: &ServerConfig) -> Key {
    match config.session_key.as_deref().map(|k| Key::try_from(k.as_bytes())) {
        Some(Ok(key)) => key,
        Some(Err(_)) => {
            log::warn!("SESSION_KEY must be at least 64 bytes; generating a key for this process");
            Key::generate()
        }
        None => Key::generate(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    let releases = match load_catalog(&config.catalog_path) {
        Ok(releases) => {
            log::info!("Loaded {} releases from {}", releases.len(), config.catalog_path);
            releases
        }
        Err(e) => {
            log::error!("{} ({}); starting with an empty catalog", e, config.catalog_path);
            Vec::new()
        }
    };
    if config.admin_token.is_none() {
        log::warn!("ADMIN_TOKEN is not set; nobody can pick bracket winners");
    }

    let key = session_key(&config);
    let secure_cookies = config.secure_cookies;
    let host = config.host.clone();
    let port = config.port;
    log::info!("Starting server at http://{}:{}", host, port);

    let state = Data::new(RwLock::new(HashMap::<BracketId, BracketEntry>::new()));
    let catalog = Data::new(releases);
    let settings = Data::new(config);

    // Background task: every 30 minutes, remove brackets inactive for 12+ hours
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < INACTIVITY_TIMEOUT);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive bracket(s) (no activity for 12h)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
                    .cookie_secure(secure_cookies)
                    .build(),
            )
            .app_data(state.clone())
            .app_data(catalog.clone())
            .app_data(settings.clone())
            .route("/", web::get().to(serve_index_async))
            .service(api_health)
            .service(favicon)
            .service(api_top)
            .service(api_field)
            .service(api_session)
            .service(api_operator_login)
            .service(api_operator_logout)
            .service(api_create_bracket)
            .service(api_get_bracket)
            .service(api_get_placements)
            .service(api_decide_upper)
            .service(api_decide_lower)
            .service(api_decide_grand_final)
            .service(Files::new("/static", "static"))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

async fn serve_index_async() -> HttpResponse {
    let html = include_str!("../../templates/index.html");
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}
