use chrono::NaiveDate;

use crate::domain::model::{ItemCode, RoomId, RoomTypeId, StayRange};

/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 無効な日付範囲（例: to_date が from_date より前）
    InvalidDateRange(String),
    /// 必須の選択が欠けている（例: 客室パッケージ未選択）
    MissingSelection(String),
    /// 料金期間が設定されていない日がある
    RateNotSet { item: ItemCode, date: NaiveDate },
    /// 客室タイプの在庫超過
    RoomsUnavailable {
        room_type: RoomTypeId,
        date: NaiveDate,
        requested: u32,
        available: u32,
    },
    /// 同一客室への重複アサイン
    DuplicateAllotment {
        room: RoomId,
        first: StayRange,
        second: StayRange,
    },
    /// アサイン数と明細行の客室数の不一致
    AllotmentCountMismatch {
        item: ItemCode,
        expected: u32,
        actual: u32,
    },
    /// 未チェックアウトの宿泊が残っていてナイトオーディットを実行できない
    PendingCheckout { rooms: Vec<RoomId> },
    /// 無効な予約状態（例: Draft の予約をチェックアウトしようとした）
    InvalidReservationState(String),
    /// 無効な数量（例: 0以下の数量）
    InvalidQuantity,
    /// 通貨の不一致
    CurrencyMismatch,
    /// 無効な値
    InvalidValue(String),
    /// リポジトリ操作の失敗（ドメインサービス経由）
    RepositoryError(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::InvalidDateRange(msg) => write!(f, "Invalid date range: {}", msg),
            DomainError::MissingSelection(msg) => write!(f, "Required selection missing: {}", msg),
            DomainError::RateNotSet { item, date } => {
                write!(f, "Room rate is not set for item {} on {}", item, date)
            }
            DomainError::RoomsUnavailable {
                room_type,
                date,
                requested,
                available,
            } => write!(
                f,
                "Hotel rooms of type {} are unavailable on {} (requested {}, available {})",
                room_type, date, requested, available
            ),
            DomainError::DuplicateAllotment {
                room,
                first,
                second,
            } => write!(
                f,
                "Room {} is allotted twice: {} overlaps {}",
                room, first, second
            ),
            DomainError::AllotmentCountMismatch {
                item,
                expected,
                actual,
            } => write!(
                f,
                "Allotment count mismatch for item {}: line declares {} rooms, {} allotted",
                item, expected, actual
            ),
            DomainError::PendingCheckout { rooms } => {
                let rooms = rooms
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "Please checkout or extend pending checkouts. Rooms: {}",
                    rooms
                )
            }
            DomainError::InvalidReservationState(msg) => {
                write!(f, "Invalid reservation state: {}", msg)
            }
            DomainError::InvalidQuantity => write!(f, "Invalid quantity"),
            DomainError::CurrencyMismatch => write!(f, "Currency mismatch"),
            DomainError::InvalidValue(msg) => write!(f, "Invalid value: {}", msg),
            DomainError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
