use crate::domain::model::{
    CompanyCode, GuestId, Money, ReservationId, RoomId, StayRange,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 現在のイベントスキーマバージョン
pub const EVENT_SCHEMA_VERSION: u32 = 1;

/// イベントメタデータ
/// 冪等性チェック用のイベントIDと処理追跡用の相関IDを保持する
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub event_id: Uuid,
    pub correlation_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub event_version: u32,
}

impl EventMetadata {
    /// 新しいメタデータを作成（相関IDも新規採番）
    pub fn new() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            correlation_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event_version: EVENT_SCHEMA_VERSION,
        }
    }

    /// 既存の相関IDを引き継いでメタデータを作成
    pub fn with_correlation_id(correlation_id: Uuid) -> Self {
        Self {
            correlation_id,
            ..Self::new()
        }
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// ドメインイベント列挙型
/// ビジネス上の重要なイベントを表現する
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// 予約が確定された
    ReservationBooked(ReservationBooked),
    /// 予約がチェックインされた
    ReservationCheckedIn(ReservationCheckedIn),
    /// 予約がチェックアウトされた
    ReservationCheckedOut(ReservationCheckedOut),
    /// ナイトオーディットが提出された
    NightAuditSubmitted(NightAuditSubmitted),
}

impl DomainEvent {
    /// イベントメタデータへの参照を取得
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            DomainEvent::ReservationBooked(e) => &e.metadata,
            DomainEvent::ReservationCheckedIn(e) => &e.metadata,
            DomainEvent::ReservationCheckedOut(e) => &e.metadata,
            DomainEvent::NightAuditSubmitted(e) => &e.metadata,
        }
    }

    /// イベント種別名を取得
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::ReservationBooked(_) => "ReservationBooked",
            DomainEvent::ReservationCheckedIn(_) => "ReservationCheckedIn",
            DomainEvent::ReservationCheckedOut(_) => "ReservationCheckedOut",
            DomainEvent::NightAuditSubmitted(_) => "NightAuditSubmitted",
        }
    }
}

/// 予約確定イベント
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationBooked {
    /// 予約ID
    pub reservation_id: ReservationId,
    /// 宿泊客ID
    pub guest: GuestId,
    /// 宿泊期間
    pub stay: StayRange,
    /// 合計金額
    pub net_total: Money,
    /// イベントメタデータ
    pub metadata: EventMetadata,
}

impl ReservationBooked {
    /// 新しい予約確定イベントを作成
    pub fn new(
        reservation_id: ReservationId,
        guest: GuestId,
        stay: StayRange,
        net_total: Money,
    ) -> Self {
        Self {
            reservation_id,
            guest,
            stay,
            net_total,
            metadata: EventMetadata::new(),
        }
    }

    /// 相関IDを引き継いで予約確定イベントを作成
    pub fn with_correlation_id(
        reservation_id: ReservationId,
        guest: GuestId,
        stay: StayRange,
        net_total: Money,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            reservation_id,
            guest,
            stay,
            net_total,
            metadata: EventMetadata::with_correlation_id(correlation_id),
        }
    }
}

/// チェックインイベント
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCheckedIn {
    /// 予約ID
    pub reservation_id: ReservationId,
    /// アサイン済みの客室
    pub rooms: Vec<RoomId>,
    /// イベントメタデータ
    pub metadata: EventMetadata,
}

impl ReservationCheckedIn {
    /// 新しいチェックインイベントを作成
    pub fn new(reservation_id: ReservationId, rooms: Vec<RoomId>) -> Self {
        Self {
            reservation_id,
            rooms,
            metadata: EventMetadata::new(),
        }
    }

    /// 相関IDを引き継いでチェックインイベントを作成
    pub fn with_correlation_id(
        reservation_id: ReservationId,
        rooms: Vec<RoomId>,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            reservation_id,
            rooms,
            metadata: EventMetadata::with_correlation_id(correlation_id),
        }
    }
}

/// チェックアウトイベント
/// ハウスキーピングの要清掃タスク作成のトリガーになる
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCheckedOut {
    /// 予約ID
    pub reservation_id: ReservationId,
    /// 清掃対象の客室
    pub rooms: Vec<RoomId>,
    /// チェックアウト日
    pub date: NaiveDate,
    /// フォリオが精算済みかどうか
    pub folio_closed: bool,
    /// イベントメタデータ
    pub metadata: EventMetadata,
}

impl ReservationCheckedOut {
    /// 新しいチェックアウトイベントを作成
    pub fn new(
        reservation_id: ReservationId,
        rooms: Vec<RoomId>,
        date: NaiveDate,
        folio_closed: bool,
    ) -> Self {
        Self {
            reservation_id,
            rooms,
            date,
            folio_closed,
            metadata: EventMetadata::new(),
        }
    }

    /// 相関IDを引き継いでチェックアウトイベントを作成
    pub fn with_correlation_id(
        reservation_id: ReservationId,
        rooms: Vec<RoomId>,
        date: NaiveDate,
        folio_closed: bool,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            reservation_id,
            rooms,
            date,
            folio_closed,
            metadata: EventMetadata::with_correlation_id(correlation_id),
        }
    }
}

/// ナイトオーディット提出イベント
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NightAuditSubmitted {
    /// 会社コード
    pub company: CompanyCode,
    /// 監査対象日
    pub date: NaiveDate,
    /// 転記された行数
    pub posted_lines: u32,
    /// イベントメタデータ
    pub metadata: EventMetadata,
}

impl NightAuditSubmitted {
    /// 新しいナイトオーディット提出イベントを作成
    pub fn new(company: CompanyCode, date: NaiveDate, posted_lines: u32) -> Self {
        Self {
            company,
            date,
            posted_lines,
            metadata: EventMetadata::new(),
        }
    }

    /// 相関IDを引き継いでナイトオーディット提出イベントを作成
    pub fn with_correlation_id(
        company: CompanyCode,
        date: NaiveDate,
        posted_lines: u32,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            company,
            date,
            posted_lines,
            metadata: EventMetadata::with_correlation_id(correlation_id),
        }
    }
}
