use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::adapter::driver::request_dto::{
    AddGroupItemsRequest, AllotRoomRequest, AvailableRoomsQueryParams, CreatePackageRequest,
    CreatePricingPeriodRequest, CreateReservationRequest, CreateRoomRequest,
    CreateRoomTypeRequest, NightAuditRequest, PostChargeRequest, RemainingQueryParams,
    ReservationsQueryParams, SetExtraBedsRequest, UpdateHousekeepingRequest,
};
use crate::adapter::driver::response_dto::{
    AuditLineResponse, AvailableRoomResponse, GroupBillResponse, NightAuditResponse,
    RemainingResponse, ReservationDetailResponse, ReservationSummaryResponse,
};
use crate::application::service::{
    NightAuditApplicationService, OccupancyQueryService, ReservationApplicationService,
    ReservationQueryService, RoomInventoryApplicationService,
};
use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{
    CompanyCode, GroupId, GuestId, HousekeepingStatus, ItemCode, Money, ReservationId, RoomId,
    RoomTypeId,
};
use crate::domain::port::RepositoryError;

// REST API用のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct CreateReservationResponse {
    pub reservation_id: Uuid,
    pub guest_id: Uuid,
}

#[derive(Serialize, Deserialize)]
pub struct PostedResponse {
    pub posted: u32,
}

#[derive(Serialize, Deserialize)]
pub struct CheckedInGroupResponse {
    pub checked_in: u32,
}

#[derive(Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub invoice: String,
}

#[derive(Serialize, Deserialize)]
pub struct GroupItemsResponse {
    pub reservation_ids: Vec<Uuid>,
}

#[derive(Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

// アプリケーションサービスを含む状態
pub type AppState = AppStateInner;

#[derive(Clone)]
pub struct AppStateInner {
    pub reservation_service: Arc<ReservationApplicationService>,
    pub night_audit_service: Arc<NightAuditApplicationService>,
    pub inventory_service: Arc<RoomInventoryApplicationService>,
    pub reservation_query_service: Arc<ReservationQueryService>,
    pub occupancy_query_service: Arc<OccupancyQueryService>,
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/reservations", post(create_reservation))
        .route("/reservations", get(get_reservations))
        .route("/reservations/:reservation_id", get(get_reservation_by_id))
        .route("/reservations/:reservation_id/allotments", post(allot_room))
        .route(
            "/reservations/:reservation_id/extra-beds",
            put(set_extra_beds),
        )
        .route("/reservations/:reservation_id/book", post(book_reservation))
        .route("/reservations/:reservation_id/check-in", post(check_in))
        .route("/reservations/:reservation_id/check-out", post(check_out))
        .route("/reservations/:reservation_id/charges", post(post_charge))
        .route("/reservations/:reservation_id/invoice", post(make_invoice))
        .route("/reservations/:reservation_id/paid", post(mark_paid))
        .route(
            "/reservations/:reservation_id/group-items",
            post(add_group_items),
        )
        .route("/groups/:group_id/check-in", post(check_in_group))
        .route("/groups/:group_id/bill", get(get_group_bill))
        .route("/groups/:group_id/invoice", post(make_group_invoice))
        .route("/availability/rooms", get(available_rooms))
        .route("/availability/remaining", get(remaining_by_day))
        .route("/room-types", post(create_room_type))
        .route("/rooms", post(create_room))
        .route("/rooms/:room_id/housekeeping", put(update_housekeeping))
        .route("/packages", post(create_package))
        .route("/pricing-periods", post(create_pricing_period))
        .route("/night-audits", post(prepare_night_audit))
        .route("/night-audits/compute", post(compute_night_audit))
        .route("/night-audits/submit", post(submit_night_audit))
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "hotel-reservation-management",
        "version": "0.1.0"
    }))
}

/// ApplicationErrorをHTTPレスポンスに変換する
fn map_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    let (status, code) = match &err {
        ApplicationError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ApplicationError::DomainError(domain) => match domain {
            DomainError::InvalidDateRange(_) | DomainError::MissingSelection(_) => {
                (StatusCode::BAD_REQUEST, "INPUT_ERROR")
            }
            DomainError::RateNotSet { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "RATE_NOT_SET"),
            DomainError::RoomsUnavailable { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "ROOMS_UNAVAILABLE")
            }
            DomainError::DuplicateAllotment { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "DUPLICATE_ALLOTMENT")
            }
            DomainError::AllotmentCountMismatch { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "ALLOTMENT_COUNT_MISMATCH")
            }
            DomainError::PendingCheckout { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "PENDING_CHECKOUT")
            }
            DomainError::InvalidReservationState(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_STATE")
            }
            _ => (StatusCode::UNPROCESSABLE_ENTITY, "DOMAIN_ERROR"),
        },
        ApplicationError::RepositoryError(RepositoryError::ConflictDetected(_)) => {
            (StatusCode::CONFLICT, "CONFLICT")
        }
        ApplicationError::RepositoryError(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "REPOSITORY_ERROR")
        }
        ApplicationError::BillingError(_) => (StatusCode::UNPROCESSABLE_ENTITY, "BILLING_ERROR"),
        ApplicationError::EventPublishingFailed(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "EVENT_ERROR")
        }
    };
    (
        status,
        Json(ApiError {
            error: err.to_string(),
            code: code.to_string(),
        }),
    )
}

fn bad_request(message: String) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: message,
            code: "INPUT_ERROR".to_string(),
        }),
    )
}

fn parse_reservation_id(raw: &str) -> Result<ReservationId, (StatusCode, Json<ApiError>)> {
    ReservationId::from_string(raw).map_err(|e| bad_request(format!("無効な予約ID: {}", e)))
}

fn parse_company(raw: &str) -> Result<CompanyCode, (StatusCode, Json<ApiError>)> {
    CompanyCode::new(raw).map_err(|e| bad_request(e.to_string()))
}

fn parse_item(raw: &str) -> Result<ItemCode, (StatusCode, Json<ApiError>)> {
    ItemCode::new(raw).map_err(|e| bad_request(e.to_string()))
}

// 予約作成エンドポイント
async fn create_reservation(
    State(state): State<AppState>,
    Json(request): Json<CreateReservationRequest>,
) -> Result<Json<CreateReservationResponse>, (StatusCode, Json<ApiError>)> {
    let company = parse_company(&request.company)?;
    let item = parse_item(&request.item)?;
    let guest = request
        .guest_id
        .map(GuestId::from_uuid)
        .unwrap_or_else(GuestId::new);

    match state
        .reservation_service
        .create_reservation(
            company,
            request.from_date,
            request.to_date,
            guest,
            item,
            request.room_count,
        )
        .await
    {
        Ok(reservation_id) => Ok(Json(CreateReservationResponse {
            reservation_id: reservation_id.as_uuid(),
            guest_id: guest.as_uuid(),
        })),
        Err(err) => Err(map_error(err)),
    }
}

// 予約一覧取得エンドポイント
async fn get_reservations(
    State(state): State<AppState>,
    Query(params): Query<ReservationsQueryParams>,
) -> Result<Json<Vec<ReservationSummaryResponse>>, (StatusCode, Json<ApiError>)> {
    let status = params
        .status
        .unwrap_or_else(|| "Booked".to_string());
    match state
        .reservation_query_service
        .get_reservations_by_status_string(status)
        .await
    {
        Ok(reservations) => Ok(Json(
            reservations
                .iter()
                .map(ReservationSummaryResponse::from)
                .collect(),
        )),
        Err(err) => Err(map_error(err)),
    }
}

// 予約詳細取得エンドポイント
async fn get_reservation_by_id(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>,
) -> Result<Json<ReservationDetailResponse>, (StatusCode, Json<ApiError>)> {
    let id = parse_reservation_id(&reservation_id)?;
    match state.reservation_query_service.get_reservation_by_id(id).await {
        Ok(Some(reservation)) => Ok(Json(ReservationDetailResponse::from(&reservation))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: format!("予約が見つかりません: {}", reservation_id),
                code: "NOT_FOUND".to_string(),
            }),
        )),
        Err(err) => Err(map_error(err)),
    }
}

// 客室アサインエンドポイント
async fn allot_room(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>,
    Json(request): Json<AllotRoomRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let id = parse_reservation_id(&reservation_id)?;
    let room = RoomId::new(&request.room).map_err(|e| bad_request(e.to_string()))?;
    let item = parse_item(&request.item)?;
    state
        .reservation_service
        .allot_room(id, room, item, request.from_date, request.to_date)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(map_error)
}

// エキストラベッド設定エンドポイント
async fn set_extra_beds(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>,
    Json(request): Json<SetExtraBedsRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let id = parse_reservation_id(&reservation_id)?;
    state
        .reservation_service
        .set_extra_beds(id, request.extra_beds)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(map_error)
}

// 予約確定エンドポイント
async fn book_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let id = parse_reservation_id(&reservation_id)?;
    state
        .reservation_service
        .book_reservation(id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(map_error)
}

// チェックインエンドポイント
async fn check_in(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let id = parse_reservation_id(&reservation_id)?;
    state
        .reservation_service
        .check_in(id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(map_error)
}

// チェックアウトエンドポイント
async fn check_out(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let id = parse_reservation_id(&reservation_id)?;
    state
        .reservation_service
        .check_out(id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(map_error)
}

// 日次料金転記エンドポイント
async fn post_charge(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>,
    Json(request): Json<PostChargeRequest>,
) -> Result<Json<PostedResponse>, (StatusCode, Json<ApiError>)> {
    let id = parse_reservation_id(&reservation_id)?;
    state
        .reservation_service
        .post_room_and_tax(id, request.date)
        .await
        .map(|posted| Json(PostedResponse { posted }))
        .map_err(map_error)
}

// 請求書発行エンドポイント
async fn make_invoice(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>,
) -> Result<Json<InvoiceResponse>, (StatusCode, Json<ApiError>)> {
    let id = parse_reservation_id(&reservation_id)?;
    state
        .reservation_service
        .make_invoice(id)
        .await
        .map(|invoice| {
            Json(InvoiceResponse {
                invoice: invoice.to_string(),
            })
        })
        .map_err(map_error)
}

// 支払済みマークエンドポイント（請求コラボレーターのコールバック）
async fn mark_paid(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let id = parse_reservation_id(&reservation_id)?;
    state
        .reservation_service
        .mark_reservation_paid(id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(map_error)
}

// グループ予約追加エンドポイント
async fn add_group_items(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>,
    Json(request): Json<AddGroupItemsRequest>,
) -> Result<Json<GroupItemsResponse>, (StatusCode, Json<ApiError>)> {
    let id = parse_reservation_id(&reservation_id)?;
    let item = parse_item(&request.item)?;
    state
        .reservation_service
        .add_group_items(id, item, request.from_date, request.to_date, request.qty)
        .await
        .map(|ids| {
            Json(GroupItemsResponse {
                reservation_ids: ids.iter().map(|id| id.as_uuid()).collect(),
            })
        })
        .map_err(map_error)
}

// グループチェックインエンドポイント
async fn check_in_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<CheckedInGroupResponse>, (StatusCode, Json<ApiError>)> {
    let group_id =
        GroupId::from_string(&group_id).map_err(|e| bad_request(format!("無効なグループID: {}", e)))?;
    state
        .reservation_service
        .check_in_group(group_id)
        .await
        .map(|checked_in| Json(CheckedInGroupResponse { checked_in }))
        .map_err(map_error)
}

// グループ一括請求ビュー取得エンドポイント
async fn get_group_bill(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupBillResponse>, (StatusCode, Json<ApiError>)> {
    let group_id =
        GroupId::from_string(&group_id).map_err(|e| bad_request(format!("無効なグループID: {}", e)))?;
    state
        .reservation_query_service
        .get_group_bill(group_id)
        .await
        .map(|bill| Json(GroupBillResponse::from(&bill)))
        .map_err(map_error)
}

// グループ一括請求書発行エンドポイント
async fn make_group_invoice(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<InvoiceResponse>, (StatusCode, Json<ApiError>)> {
    let group_id =
        GroupId::from_string(&group_id).map_err(|e| bad_request(format!("無効なグループID: {}", e)))?;
    state
        .reservation_service
        .make_group_invoice(group_id)
        .await
        .map(|invoice| {
            Json(InvoiceResponse {
                invoice: invoice.to_string(),
            })
        })
        .map_err(map_error)
}

// アサイン可能客室取得エンドポイント
async fn available_rooms(
    State(state): State<AppState>,
    Query(params): Query<AvailableRoomsQueryParams>,
) -> Result<Json<Vec<AvailableRoomResponse>>, (StatusCode, Json<ApiError>)> {
    let item = parse_item(&params.item)?;
    state
        .occupancy_query_service
        .available_rooms(&item, params.from_date, params.to_date)
        .await
        .map(|rooms| Json(rooms.iter().map(AvailableRoomResponse::from).collect()))
        .map_err(map_error)
}

// 日ごとの残室数取得エンドポイント
async fn remaining_by_day(
    State(state): State<AppState>,
    Query(params): Query<RemainingQueryParams>,
) -> Result<Json<Vec<RemainingResponse>>, (StatusCode, Json<ApiError>)> {
    let room_type = RoomTypeId::new(&params.room_type).map_err(|e| bad_request(e.to_string()))?;
    state
        .occupancy_query_service
        .remaining_by_day(&room_type, params.from_date, params.to_date)
        .await
        .map(|days| {
            Json(
                days.into_iter()
                    .map(|(date, remaining)| RemainingResponse { date, remaining })
                    .collect(),
            )
        })
        .map_err(map_error)
}

// 客室タイプ登録エンドポイント
async fn create_room_type(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomTypeRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let id = RoomTypeId::new(&request.id).map_err(|e| bad_request(e.to_string()))?;
    state
        .inventory_service
        .create_room_type(id, request.name)
        .await
        .map(|_| StatusCode::CREATED)
        .map_err(map_error)
}

// 客室登録エンドポイント
async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let id = RoomId::new(&request.id).map_err(|e| bad_request(e.to_string()))?;
    let room_type = RoomTypeId::new(&request.room_type).map_err(|e| bad_request(e.to_string()))?;
    state
        .inventory_service
        .create_room(id, room_type)
        .await
        .map(|_| StatusCode::CREATED)
        .map_err(map_error)
}

// ハウスキーピング状態更新エンドポイント
async fn update_housekeeping(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<UpdateHousekeepingRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let room = RoomId::new(&room_id).map_err(|e| bad_request(e.to_string()))?;
    let status =
        HousekeepingStatus::from_string(&request.status).map_err(|e| bad_request(e.to_string()))?;
    state
        .inventory_service
        .update_housekeeping_status(room, status)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(map_error)
}

// 客室パッケージ登録エンドポイント
async fn create_package(
    State(state): State<AppState>,
    Json(request): Json<CreatePackageRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let item = parse_item(&request.item)?;
    let room_type = RoomTypeId::new(&request.room_type).map_err(|e| bad_request(e.to_string()))?;
    state
        .inventory_service
        .create_package(item, room_type)
        .await
        .map(|_| StatusCode::CREATED)
        .map_err(map_error)
}

// 料金期間登録エンドポイント
async fn create_pricing_period(
    State(state): State<AppState>,
    Json(request): Json<CreatePricingPeriodRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let item = parse_item(&request.item)?;
    state
        .inventory_service
        .create_pricing_period(
            item,
            request.from_date,
            request.to_date,
            Money::jpy(request.rate),
        )
        .await
        .map(|_| StatusCode::CREATED)
        .map_err(map_error)
}

// ナイトオーディット準備エンドポイント
async fn prepare_night_audit(
    State(state): State<AppState>,
    Json(request): Json<NightAuditRequest>,
) -> Result<Json<NightAuditResponse>, (StatusCode, Json<ApiError>)> {
    let company = parse_company(&request.company)?;
    state
        .night_audit_service
        .prepare_run(&company, request.date)
        .await
        .map(|run| Json(NightAuditResponse::from(&run)))
        .map_err(map_error)
}

// ナイトオーディット再計算エンドポイント（提出前の冪等な確認用）
async fn compute_night_audit(
    State(state): State<AppState>,
    Json(request): Json<NightAuditRequest>,
) -> Result<Json<Vec<AuditLineResponse>>, (StatusCode, Json<ApiError>)> {
    let company = parse_company(&request.company)?;
    state
        .night_audit_service
        .compute(&company, request.date)
        .await
        .map(|lines| Json(lines.iter().map(AuditLineResponse::from).collect()))
        .map_err(map_error)
}

// ナイトオーディット提出エンドポイント
async fn submit_night_audit(
    State(state): State<AppState>,
    Json(request): Json<NightAuditRequest>,
) -> Result<Json<PostedResponse>, (StatusCode, Json<ApiError>)> {
    let company = parse_company(&request.company)?;
    state
        .night_audit_service
        .submit(&company, request.date)
        .await
        .map(|posted| Json(PostedResponse { posted }))
        .map_err(map_error)
}
