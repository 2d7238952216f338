use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::session::{display_text, Session, TranslationJob};
use crate::state::AppState;
use crate::translate::{Language, LanguagePair, TranslationResult};

/// Result posted back from a translation worker to its socket loop
#[derive(Debug)]
pub struct WorkerResult {
    pub token: Uuid,
    pub result: TranslationResult,
}

/// Per-socket state owned by the connection loop
pub struct Connection {
    pub client_uid: String,
    pub session: Session,
    pub results: mpsc::UnboundedSender<WorkerResult>,
}

impl Connection {
    pub fn new(
        client_uid: String,
        pair: LanguagePair,
        results: mpsc::UnboundedSender<WorkerResult>,
    ) -> Self {
        Self {
            client_uid,
            session: Session::new(pair),
            results,
        }
    }
}

/// Handle one inbound text frame, returning the messages to send back.
pub async fn handle_message(
    state: &AppState,
    conn: &mut Connection,
    text: &str,
) -> anyhow::Result<Vec<Value>> {
    let msg: Value = serde_json::from_str(text)?;
    let msg_type = msg.get("type").and_then(|v| v.as_str());

    let replies = match msg_type {
        Some("fetch-languages") => vec![languages_message(), pair_message(conn.session.pair())],
        Some("set-languages") => handle_set_languages(conn, &msg),
        Some("swap-languages") => {
            if !conn.session.swap() {
                debug!("Swap ignored for {}: source is auto-detect", conn.client_uid);
            }
            vec![pair_message(conn.session.pair())]
        }
        Some("text-changed") => {
            let text = msg.get("text").and_then(|v| v.as_str()).unwrap_or("");
            vec![status_message(&conn.session, text)]
        }
        Some("translate") => handle_translate(state, conn, &msg).await,
        Some("fetch-credential-status") => vec![credential_message(state)],
        Some("set-credential") => handle_set_credential(state, conn, &msg).await?,
        _ => {
            warn!("Unknown message type: {:?}", msg_type);
            vec![error_message(&format!("unknown message type: {}", msg_type.unwrap_or("<none>")))]
        }
    };

    Ok(replies)
}

fn handle_set_languages(conn: &mut Connection, msg: &Value) -> Vec<Value> {
    let pair = serde_json::from_value::<LanguagePair>(msg.clone())
        .map_err(|e| e.to_string())
        .and_then(|pair| conn.session.set_pair(pair).map_err(|e| e.to_string()));

    match pair {
        Ok(()) => vec![pair_message(conn.session.pair())],
        Err(e) => vec![error_message(&e), pair_message(conn.session.pair())],
    }
}

async fn handle_translate(state: &AppState, conn: &mut Connection, msg: &Value) -> Vec<Value> {
    let text = msg.get("text").and_then(|v| v.as_str()).unwrap_or("");

    let Some(job) = conn.session.begin(text) else {
        return vec![status_message(&conn.session, text)];
    };

    let token = job.token;
    spawn_worker(state, conn, job).await;

    vec![
        json!({
            "type": "translation-started",
            "token": token,
        }),
        status_message(&conn.session, text),
    ]
}

async fn spawn_worker(state: &AppState, conn: &Connection, job: TranslationJob) {
    let translator = state.translator().await;
    let results = conn.results.clone();
    let client_uid = conn.client_uid.clone();

    let handle = tokio::spawn(async move {
        let result = translator
            .translate(&job.text, job.pair.source, job.pair.target)
            .await;
        // The socket may be gone by now; dropping the result is fine.
        if results.send(WorkerResult { token: job.token, result }).is_err() {
            debug!("Connection {} closed before translation {} finished", client_uid, job.token);
        }
    });

    if let Some(previous) = state
        .translation_tasks
        .insert(conn.client_uid.clone(), handle.abort_handle())
    {
        previous.abort();
    }
}

async fn handle_set_credential(
    state: &AppState,
    conn: &mut Connection,
    msg: &Value,
) -> anyhow::Result<Vec<Value>> {
    let Some(api_key) = msg.get("api_key").and_then(|v| v.as_str()) else {
        return Ok(vec![error_message("api_key is required")]);
    };

    state.replace_credential(api_key.to_string()).await?;
    let mut replies = vec![credential_message(state)];

    // Results from a call made with the old credential are no longer wanted.
    if let Some(token) = cancel_in_flight(state, conn) {
        info!("Abandoning translation {} after credential change", token);
        replies.push(json!({
            "type": "translation-cancelled",
            "token": token,
        }));
        replies.push(translating_message(&conn.session));
    }

    Ok(replies)
}

/// Drop the outstanding call for this connection and abort its worker.
fn cancel_in_flight(state: &AppState, conn: &mut Connection) -> Option<Uuid> {
    let token = conn.session.abandon();
    if let Some((_, handle)) = state.translation_tasks.remove(&conn.client_uid) {
        handle.abort();
    }
    token
}

/// Tear down a closed connection. A worker still running is aborted.
pub fn disconnect(state: &AppState, conn: &mut Connection) {
    if let Some(token) = cancel_in_flight(state, conn) {
        debug!("Abandoned translation {} on disconnect", token);
    }
}

/// Apply a finished translation to the session. Stale results produce nothing.
pub fn handle_worker_result(state: &AppState, conn: &mut Connection, done: WorkerResult) -> Option<Value> {
    let token = done.token;
    let accepted = conn.session.complete(token, done.result)?;
    state.translation_tasks.remove(&conn.client_uid);
    Some(result_message(token, accepted))
}

pub fn language_entries() -> Vec<Value> {
    Language::all()
        .iter()
        .map(|lang| {
            json!({
                "code": lang.code(),
                "name": lang.display_name(),
                "auto": lang.is_auto(),
            })
        })
        .collect()
}

pub fn languages_message() -> Value {
    json!({
        "type": "languages",
        "languages": language_entries(),
    })
}

pub fn pair_message(pair: LanguagePair) -> Value {
    json!({
        "type": "language-pair",
        "source_lang": pair.source,
        "target_lang": pair.target,
        "can_swap": !pair.source.is_auto(),
    })
}

fn status_message(session: &Session, text: &str) -> Value {
    let status = session.status(text);
    json!({
        "type": "status",
        "character_count": status.character_count,
        "character_limit": status.character_limit,
        "over_limit": status.over_limit,
        "translating": status.translating,
    })
}

pub fn translating_message(session: &Session) -> Value {
    json!({
        "type": "status",
        "translating": session.is_translating(),
    })
}

pub fn credential_message(state: &AppState) -> Value {
    json!({
        "type": "credential-status",
        "configured": state.credentials.is_configured(),
    })
}

fn result_message(token: Uuid, result: &TranslationResult) -> Value {
    let display = display_text(result);
    match result {
        TranslationResult::Success { text, detected_source_language } => json!({
            "type": "translation-result",
            "token": token,
            "status": "success",
            "text": text,
            "detected_source_language": detected_source_language,
            "display": display,
        }),
        TranslationResult::Failure { kind, message } => json!({
            "type": "translation-result",
            "token": token,
            "status": "failure",
            "kind": kind,
            "message": message,
            "display": display,
        }),
    }
}

fn error_message(message: &str) -> Value {
    json!({
        "type": "error",
        "message": message,
    })
}
