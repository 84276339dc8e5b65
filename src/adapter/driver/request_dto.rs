use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 予約作成用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateReservationRequest {
    pub company: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub guest_id: Option<Uuid>,
    pub item: String,
    pub room_count: u32,
}

/// 客室アサイン用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct AllotRoomRequest {
    pub room: String,
    pub item: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

/// グループ予約追加用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct AddGroupItemsRequest {
    pub item: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub qty: u32,
}

/// エキストラベッド設定用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct SetExtraBedsRequest {
    pub extra_beds: u32,
}

/// 日次料金転記用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct PostChargeRequest {
    pub date: NaiveDate,
}

/// 客室タイプ登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateRoomTypeRequest {
    pub id: String,
    pub name: String,
}

/// 客室登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub id: String,
    pub room_type: String,
}

/// 客室パッケージ登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreatePackageRequest {
    pub item: String,
    pub room_type: String,
}

/// 料金期間登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreatePricingPeriodRequest {
    pub item: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub rate: i64,
}

/// ハウスキーピング状態更新用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct UpdateHousekeepingRequest {
    pub status: String,
}

/// ナイトオーディット用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct NightAuditRequest {
    pub company: String,
    pub date: NaiveDate,
}

/// 予約一覧取得用のクエリパラメータ
#[derive(Deserialize)]
pub struct ReservationsQueryParams {
    pub status: Option<String>,
}

/// アサイン可能客室取得用のクエリパラメータ
#[derive(Deserialize)]
pub struct AvailableRoomsQueryParams {
    pub item: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

/// 残室数取得用のクエリパラメータ
#[derive(Deserialize)]
pub struct RemainingQueryParams {
    pub room_type: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_reservation_request_serialization() {
        let request = CreateReservationRequest {
            company: "GRAND-HOTEL".to_string(),
            from_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            to_date: NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
            guest_id: Some(Uuid::new_v4()),
            item: "DLX-NIGHT".to_string(),
            room_count: 1,
        };

        let json = serde_json::to_string(&request).unwrap();
        let deserialized: CreateReservationRequest = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.item, "DLX-NIGHT");
        assert_eq!(deserialized.room_count, 1);
    }

    #[test]
    fn test_night_audit_request_serialization() {
        let request = NightAuditRequest {
            company: "GRAND-HOTEL".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        };

        let json = serde_json::to_string(&request).unwrap();
        let deserialized: NightAuditRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.company, "GRAND-HOTEL");
    }
}
