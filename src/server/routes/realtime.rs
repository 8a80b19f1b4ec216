//! Realtime websocket endpoint
//!
//! A connection joins the default room straight away and receives the
//! current snapshot. Clients may then switch rooms, leave, or ping.

use crate::monitoring::HealthSystem;
use crate::monitoring::realtime::{ClientMessage, RealtimeEvent, Subscription};
use crate::server::state::AppState;
use crate::utils::error::HealthcastError;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use actix_ws::{CloseReason, Message, MessageStream, Session};
use futures_util::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Upgrade to a websocket and stream health events
pub async fn realtime_socket(
    req: HttpRequest,
    body: web::Payload,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    if !state.config.monitoring().realtime.enabled {
        return Err(HealthcastError::websocket("Realtime channel is disabled").into());
    }

    let (response, session, messages) = actix_ws::handle(&req, body)?;
    let session_id = Uuid::new_v4();
    actix_web::rt::spawn(run_session(
        session_id,
        session,
        messages,
        state.health.clone(),
    ));

    Ok(response)
}

async fn next_event(subscription: &mut Option<Subscription>) -> Option<RealtimeEvent> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

/// Returns false once the peer is gone
async fn send_event(session: &mut Session, event: &RealtimeEvent) -> bool {
    match event.to_frame() {
        Ok(frame) => session.text(frame).await.is_ok(),
        Err(e) => {
            warn!("Failed to encode {} event: {}", event.name(), e);
            true
        }
    }
}

async fn run_session(
    session_id: Uuid,
    mut session: Session,
    mut messages: MessageStream,
    health: HealthSystem,
) {
    let _connection = health.requests().session_opened();
    let broadcaster = health.broadcaster().clone();
    let mut subscription = Some(broadcaster.subscribe(None));
    info!("Realtime session {} connected", session_id);

    let close_reason: Option<CloseReason> = loop {
        tokio::select! {
            message = messages.next() => match message {
                Some(Ok(Message::Text(text))) => match ClientMessage::parse(&text) {
                    Ok(ClientMessage::Subscribe { room }) => {
                        debug!("Session {} subscribing to {:?}", session_id, room);
                        subscription = Some(broadcaster.subscribe(room.as_deref()));
                    }
                    Ok(ClientMessage::Unsubscribe) => {
                        debug!("Session {} unsubscribed", session_id);
                        subscription = None;
                    }
                    Ok(ClientMessage::Ping) => {
                        if !send_event(&mut session, &RealtimeEvent::pong()).await {
                            break None;
                        }
                    }
                    Err(e) => warn!("Session {}: {}", session_id, e),
                },
                Some(Ok(Message::Ping(bytes))) => {
                    if session.pong(&bytes).await.is_err() {
                        break None;
                    }
                }
                Some(Ok(Message::Close(reason))) => break reason,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Session {} protocol error: {}", session_id, e);
                    break None;
                }
                None => break None,
            },
            event = next_event(&mut subscription) => match event {
                Some(event) => {
                    if !send_event(&mut session, &event).await {
                        break None;
                    }
                }
                None => subscription = None,
            },
        }
    };

    drop(subscription);
    let _ = session.close(close_reason).await;
    info!("Realtime session {} closed", session_id);
}
