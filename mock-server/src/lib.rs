use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, Query, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollOption {
    pub id: i64,
    pub text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Poll {
    pub id: i64,
    pub question: String,
    pub options: Vec<PollOption>,
    pub created_by: i64,
}

#[derive(Deserialize)]
pub struct NewPoll {
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Deserialize)]
pub struct VoteRequest {
    pub option_id: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vote {
    pub id: i64,
    pub poll_id: i64,
    pub option_id: i64,
    pub user_id: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionTally {
    pub option_id: i64,
    pub text: String,
    pub votes: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollResults {
    pub poll_id: i64,
    pub question: String,
    pub results: Vec<OptionTally>,
}

/// Error body, shaped like `{"detail": "..."}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Detail {
    pub detail: String,
}

#[derive(Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
pub struct Store {
    accounts: HashMap<String, Account>,
    /// token -> username
    sessions: HashMap<String, String>,
    polls: Vec<Poll>,
    votes: Vec<Vote>,
    next_user_id: i64,
    next_option_id: i64,
    next_vote_id: i64,
}

pub type Db = Arc<RwLock<Store>>;

type Failure = (StatusCode, Json<Detail>);

fn failure(status: StatusCode, detail: &str) -> Failure {
    (
        status,
        Json(Detail {
            detail: detail.to_string(),
        }),
    )
}

/// `Json` that reports unparseable bodies as 422, like any other invalid
/// payload. Plain `Json` answers 400 to syntax errors.
struct JsonBody<T>(T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Failure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection @ (JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_))) => {
                Err(failure(StatusCode::UNPROCESSABLE_ENTITY, &rejection.body_text()))
            }
            Err(rejection) => Err(failure(rejection.status(), &rejection.body_text())),
        }
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/polls", get(list_polls).post(create_poll))
        .route("/polls/{id}/vote", post(cast_vote))
        .route("/polls/{id}/results", get(poll_results))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock polling service listening");
    }
    axum::serve(listener, app()).await
}

/// Resolve the bearer token in `headers` to the caller's user.
fn authenticate(store: &Store, headers: &HeaderMap) -> Result<User, Failure> {
    let unauthorized = || failure(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;
    store
        .sessions
        .get(token)
        .and_then(|username| store.accounts.get(username))
        .map(|account| account.user.clone())
        .ok_or_else(unauthorized)
}

async fn register(
    State(db): State<Db>,
    JsonBody(input): JsonBody<Credentials>,
) -> Result<Json<User>, Failure> {
    let mut store = db.write().await;
    if store.accounts.contains_key(&input.username) {
        return Err(failure(StatusCode::BAD_REQUEST, "Username already registered"));
    }
    store.next_user_id += 1;
    let user = User {
        id: store.next_user_id,
        username: input.username.clone(),
    };
    store.accounts.insert(
        input.username,
        Account {
            user: user.clone(),
            password: input.password,
        },
    );
    Ok(Json(user))
}

async fn login(
    State(db): State<Db>,
    Form(input): Form<Credentials>,
) -> Result<Json<Token>, Failure> {
    let mut store = db.write().await;
    let valid = store
        .accounts
        .get(&input.username)
        .is_some_and(|account| account.password == input.password);
    if !valid {
        return Err(failure(StatusCode::BAD_REQUEST, "Incorrect username or password"));
    }
    let access_token = Uuid::new_v4().to_string();
    store.sessions.insert(access_token.clone(), input.username);
    Ok(Json(Token {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

async fn list_polls(State(db): State<Db>, Query(page): Query<Page>) -> Json<Vec<Poll>> {
    let store = db.read().await;
    Json(
        store
            .polls
            .iter()
            .skip(page.skip)
            .take(page.limit)
            .cloned()
            .collect(),
    )
}

async fn create_poll(
    State(db): State<Db>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<NewPoll>,
) -> Result<Json<Poll>, Failure> {
    let mut store = db.write().await;
    let user = authenticate(&store, &headers)?;
    if input.question.trim().is_empty() || input.options.is_empty() {
        return Err(failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            "A poll needs a question and at least one option",
        ));
    }

    let mut options = Vec::with_capacity(input.options.len());
    for text in input.options {
        store.next_option_id += 1;
        options.push(PollOption {
            id: store.next_option_id,
            text,
        });
    }
    let poll = Poll {
        id: store.polls.len() as i64 + 1,
        question: input.question,
        options,
        created_by: user.id,
    };
    store.polls.push(poll.clone());
    Ok(Json(poll))
}

fn find_poll(store: &Store, id: i64) -> Result<&Poll, Failure> {
    store
        .polls
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Poll not found"))
}

async fn cast_vote(
    State(db): State<Db>,
    Path(poll_id): Path<i64>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<VoteRequest>,
) -> Result<Json<Vote>, Failure> {
    let mut store = db.write().await;
    let user = authenticate(&store, &headers)?;
    let poll = find_poll(&store, poll_id)?;
    if !poll.options.iter().any(|o| o.id == input.option_id) {
        return Err(failure(StatusCode::NOT_FOUND, "Option not found"));
    }
    if store
        .votes
        .iter()
        .any(|v| v.poll_id == poll_id && v.user_id == user.id)
    {
        return Err(failure(StatusCode::BAD_REQUEST, "User has already voted on this poll"));
    }

    store.next_vote_id += 1;
    let vote = Vote {
        id: store.next_vote_id,
        poll_id,
        option_id: input.option_id,
        user_id: user.id,
    };
    store.votes.push(vote.clone());
    Ok(Json(vote))
}

async fn poll_results(
    State(db): State<Db>,
    Path(poll_id): Path<i64>,
) -> Result<Json<PollResults>, Failure> {
    let store = db.read().await;
    let poll = find_poll(&store, poll_id)?;
    let results = poll
        .options
        .iter()
        .map(|option| OptionTally {
            option_id: option.id,
            text: option.text.clone(),
            votes: store
                .votes
                .iter()
                .filter(|v| v.option_id == option.id)
                .count() as u64,
        })
        .collect();
    Ok(Json(PollResults {
        poll_id,
        question: poll.question.clone(),
        results,
    }))
}
