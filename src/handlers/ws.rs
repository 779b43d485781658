use crate::chat::{
    ChannelLayer, ChatConnection, alert_group, run_chat_socket, run_notification_socket,
};
use crate::handlers::current_user_id;
use crate::services::ChatService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, rt, web};
use actix_ws::{CloseCode, CloseReason};

/// `/ws/chat/{room_id}/`：加入聊天室并转发房间事件
pub async fn chat_socket(
    req: HttpRequest,
    body: web::Payload,
    path: web::Path<i64>,
    chat_service: web::Data<ChatService>,
    layer: web::Data<dyn ChannelLayer>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let room_id = path.into_inner();
    if let Err(e) = chat_service.find_room(room_id).await {
        return Ok(e.error_response());
    }

    let (response, session, stream) = actix_ws::handle(&req, body)?;
    let chat = chat_service.get_ref().clone();
    let layer = layer.into_inner();

    rt::spawn(async move {
        match ChatConnection::open(chat, layer, room_id, user_id).await {
            Ok((conn, rx)) => run_chat_socket(session, stream, conn, rx).await,
            Err(e) => {
                log::error!("User {user_id} failed to join room {room_id}: {e}");
                let reason = CloseReason {
                    code: CloseCode::Error,
                    description: Some(e.to_string()),
                };
                let _ = session.close(Some(reason)).await;
            }
        }
    });

    Ok(response)
}

/// `/ws/notifications/`：接收发给自己的 alert 事件
pub async fn notification_socket(
    req: HttpRequest,
    body: web::Payload,
    layer: web::Data<dyn ChannelLayer>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let layer = layer.into_inner();
    let rx = match layer.subscribe(&alert_group(&user_id.to_string())).await {
        Ok(rx) => rx,
        Err(e) => return Ok(e.error_response()),
    };

    let (response, session, stream) = actix_ws::handle(&req, body)?;
    rt::spawn(run_notification_socket(session, stream, layer, user_id, rx));
    Ok(response)
}

pub fn ws_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ws")
            .route("/chat/{room_id}/", web::get().to(chat_socket))
            .route("/notifications/", web::get().to(notification_socket)),
    );
}
