use crate::handlers::{created, current_user_id, success};
use crate::models::*;
use crate::services::ChatService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/chat/rooms",
    tag = "chat",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "聊天室列表", body = [RoomResponse]))
)]
pub async fn list_rooms(chat_service: web::Data<ChatService>, req: HttpRequest) -> Result<HttpResponse> {
    current_user_id(&req)?;
    match chat_service.list_rooms().await {
        Ok(rooms) => Ok(success(rooms)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/chat/rooms",
    tag = "chat",
    request_body = CreateRoomRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "聊天室已创建", body = RoomResponse),
        (status = 400, description = "名称或简介长度不符"),
        (status = 406, description = "每人最多创建 3 个聊天室")
    )
)]
pub async fn create_room(
    chat_service: web::Data<ChatService>,
    req: HttpRequest,
    request: web::Json<CreateRoomRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match chat_service.create_room(user_id, request.into_inner()).await {
        Ok(room) => Ok(created(room)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/chat/rooms/{room_id}",
    tag = "chat",
    params(("room_id" = i64, Path, description = "聊天室 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "聊天室与在线成员", body = RoomDetailResponse),
        (status = 404, description = "聊天室不存在")
    )
)]
pub async fn get_room(
    chat_service: web::Data<ChatService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    current_user_id(&req)?;
    match chat_service.room_detail(path.into_inner()).await {
        Ok(detail) => Ok(success(detail)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/chat/rooms/{room_id}",
    tag = "chat",
    params(("room_id" = i64, Path, description = "聊天室 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "聊天室已删除"),
        (status = 403, description = "不是房主或仍有在线成员")
    )
)]
pub async fn delete_room(
    chat_service: web::Data<ChatService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match chat_service.delete_room(user_id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/chat/rooms/{room_id}/messages",
    tag = "chat",
    params(("room_id" = i64, Path, description = "聊天室 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "聊天记录，他人消息标记为已读", body = [MessageResponse]),
        (status = 404, description = "聊天室不存在")
    )
)]
pub async fn room_messages(
    chat_service: web::Data<ChatService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match chat_service.history(user_id, path.into_inner()).await {
        Ok(messages) => Ok(success(messages)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn chat_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/chat/rooms")
            .route("", web::get().to(list_rooms))
            .route("", web::post().to(create_room))
            .route("/{room_id}", web::get().to(get_room))
            .route("/{room_id}", web::delete().to(delete_room))
            .route("/{room_id}/messages", web::get().to(room_messages)),
    );
}
