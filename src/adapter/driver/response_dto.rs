use crate::application::service::reservation_query_service::GroupBill;
use crate::domain::model::{
    AuditLine, ChargeKind, LineItem, NightAuditRun, Reservation, Room, RoomAllotment,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 明細行のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct LineItemResponse {
    pub item: String,
    pub kind: String,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub date: Option<NaiveDate>,
    pub room_count: Option<u32>,
    pub quantity: u32,
    pub rate: i64,
    pub amount: i64,
}

impl From<&LineItem> for LineItemResponse {
    fn from(line: &LineItem) -> Self {
        let (kind, from_date, to_date, date, room_count) = match line.charge() {
            ChargeKind::Stay { period, room_count } => (
                "Stay",
                Some(period.from_date()),
                Some(period.to_date()),
                None,
                Some(*room_count),
            ),
            ChargeKind::Incidental { date } => ("Incidental", None, None, Some(*date), None),
            ChargeKind::ExtraBed { date } => ("ExtraBed", None, None, Some(*date), None),
        };
        Self {
            item: line.item().to_string(),
            kind: kind.to_string(),
            from_date,
            to_date,
            date,
            room_count,
            quantity: line.quantity(),
            rate: line.rate().amount(),
            amount: line.amount().amount(),
        }
    }
}

/// 客室アサインのレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct AllotmentResponse {
    pub room: String,
    pub item: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub status: String,
}

impl From<&RoomAllotment> for AllotmentResponse {
    fn from(allotment: &RoomAllotment) -> Self {
        Self {
            room: allotment.room().to_string(),
            item: allotment.item().to_string(),
            from_date: allotment.period().from_date(),
            to_date: allotment.period().to_date(),
            status: allotment.status().to_string(),
        }
    }
}

/// 予約サマリーのレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct ReservationSummaryResponse {
    pub id: Uuid,
    pub company: String,
    pub status: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub item: String,
    pub net_total: i64,
}

impl From<&Reservation> for ReservationSummaryResponse {
    fn from(reservation: &Reservation) -> Self {
        Self {
            id: reservation.id().as_uuid(),
            company: reservation.company().to_string(),
            status: reservation.status().to_string(),
            from_date: reservation.stay().from_date(),
            to_date: reservation.stay().to_date(),
            item: reservation.item().to_string(),
            net_total: reservation.net_total().amount(),
        }
    }
}

/// 予約詳細のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct ReservationDetailResponse {
    pub id: Uuid,
    pub company: String,
    pub status: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub item: String,
    pub guest_id: Uuid,
    pub group_id: Option<Uuid>,
    pub extra_beds: u32,
    pub net_total: i64,
    pub lines: Vec<LineItemResponse>,
    pub allotments: Vec<AllotmentResponse>,
}

impl From<&Reservation> for ReservationDetailResponse {
    fn from(reservation: &Reservation) -> Self {
        Self {
            id: reservation.id().as_uuid(),
            company: reservation.company().to_string(),
            status: reservation.status().to_string(),
            from_date: reservation.stay().from_date(),
            to_date: reservation.stay().to_date(),
            item: reservation.item().to_string(),
            guest_id: reservation.guest().as_uuid(),
            group_id: reservation.group_id().map(|g| g.as_uuid()),
            extra_beds: reservation.extra_beds(),
            net_total: reservation.net_total().amount(),
            lines: reservation.items().iter().map(LineItemResponse::from).collect(),
            allotments: reservation
                .room_allotments()
                .iter()
                .map(AllotmentResponse::from)
                .collect(),
        }
    }
}

/// グループ一括請求のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct GroupBillResponse {
    pub group_id: Uuid,
    pub reservation_ids: Vec<Uuid>,
    pub lines: Vec<LineItemResponse>,
    pub grand_total: i64,
}

impl From<&GroupBill> for GroupBillResponse {
    fn from(bill: &GroupBill) -> Self {
        Self {
            group_id: bill.group_id.as_uuid(),
            reservation_ids: bill.reservation_ids.iter().map(|id| id.as_uuid()).collect(),
            lines: bill.lines.iter().map(LineItemResponse::from).collect(),
            grand_total: bill.grand_total.amount(),
        }
    }
}

/// アサイン可能客室のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct AvailableRoomResponse {
    pub id: String,
    pub room_type: String,
    pub housekeeping_status: String,
}

impl From<&Room> for AvailableRoomResponse {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id().to_string(),
            room_type: room.room_type().to_string(),
            housekeeping_status: room.housekeeping().to_string(),
        }
    }
}

/// 日ごとの残室数のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct RemainingResponse {
    pub date: NaiveDate,
    pub remaining: u32,
}

/// 監査行のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct AuditLineResponse {
    pub room: Option<String>,
    pub reservation_id: Uuid,
    pub guest_name: String,
    pub mobile_no: Option<String>,
    pub item: String,
    pub quantity: u32,
}

impl From<&AuditLine> for AuditLineResponse {
    fn from(line: &AuditLine) -> Self {
        Self {
            room: line.room().map(|r| r.to_string()),
            reservation_id: line.reservation().as_uuid(),
            guest_name: line.guest_name().to_string(),
            mobile_no: line.mobile_no().map(|m| m.to_string()),
            item: line.item().to_string(),
            quantity: line.quantity(),
        }
    }
}

/// ナイトオーディット実行のレスポンスDTO
#[derive(Serialize, Deserialize)]
pub struct NightAuditResponse {
    pub company: String,
    pub date: NaiveDate,
    pub submitted: bool,
    pub lines: Vec<AuditLineResponse>,
}

impl From<&NightAuditRun> for NightAuditResponse {
    fn from(run: &NightAuditRun) -> Self {
        Self {
            company: run.company().to_string(),
            date: run.date(),
            submitted: run.is_submitted(),
            lines: run.lines().iter().map(AuditLineResponse::from).collect(),
        }
    }
}
