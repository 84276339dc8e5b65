use crate::domain::error::DomainError;
use crate::domain::model::StayRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// 予約の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(Uuid);

impl ReservationId {
    /// 新しい一意のReservationIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから ReservationId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からReservationIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

/// 宿泊客の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuestId(Uuid);

impl GuestId {
    /// 新しい一意のGuestIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから GuestId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からGuestIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for GuestId {
    fn default() -> Self {
        Self::new()
    }
}

/// 請求先顧客の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(Uuid);

impl CustomerId {
    /// 新しい一意のCustomerIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから CustomerId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からCustomerIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

/// グループ予約の識別子
/// 同じグループIDを持つ予約は一括請求の対象になる
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(Uuid);

impl GroupId {
    /// 新しい一意のGroupIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから GroupId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からGroupIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

/// 物理客室のコード（例: "101"）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    /// 空でないコードからRoomIdを作成
    pub fn new(code: &str) -> Result<Self, DomainError> {
        if code.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "room code must not be empty".to_string(),
            ));
        }
        Ok(Self(code.to_string()))
    }

    /// 内部のコード文字列を取得
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 客室タイプのコード（例: "Deluxe"）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomTypeId(String);

impl RoomTypeId {
    /// 空でないコードからRoomTypeIdを作成
    pub fn new(code: &str) -> Result<Self, DomainError> {
        if code.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "room type code must not be empty".to_string(),
            ));
        }
        Ok(Self(code.to_string()))
    }

    /// 内部のコード文字列を取得
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 販売アイテム（客室パッケージや付帯サービス）のコード（例: "DLX-NIGHT"）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemCode(String);

impl ItemCode {
    /// 空でないコードからItemCodeを作成
    pub fn new(code: &str) -> Result<Self, DomainError> {
        if code.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "item code must not be empty".to_string(),
            ));
        }
        Ok(Self(code.to_string()))
    }

    /// 内部のコード文字列を取得
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 会社コード
/// ナイトオーディットは (会社, 日付) ごとに一意になる
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyCode(String);

impl CompanyCode {
    /// 空でないコードからCompanyCodeを作成
    pub fn new(code: &str) -> Result<Self, DomainError> {
        if code.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "company code must not be empty".to_string(),
            ));
        }
        Ok(Self(code.to_string()))
    }

    /// 内部のコード文字列を取得
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 通貨
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    /// 日本円
    #[allow(clippy::upper_case_acronyms)]
    JPY,
}

/// 金額を表す値オブジェクト
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

impl Money {
    /// 金額と通貨から作成
    pub fn new(amount: i64, currency: String) -> Result<Self, DomainError> {
        let currency = match currency.as_str() {
            "JPY" => Currency::JPY,
            _ => {
                return Err(DomainError::InvalidValue(format!(
                    "unsupported currency: {}",
                    currency
                )))
            }
        };
        Ok(Self { amount, currency })
    }

    /// 日本円の金額を作成
    pub fn jpy(amount: i64) -> Self {
        Self {
            amount,
            currency: Currency::JPY,
        }
    }

    /// ゼロ円
    pub fn zero() -> Self {
        Self::jpy(0)
    }

    /// 金額を取得
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// 通貨を文字列として取得
    pub fn currency(&self) -> String {
        match self.currency {
            Currency::JPY => "JPY".to_string(),
        }
    }

    /// ゼロ金額かどうか
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// 金額を加算
    pub fn add(&self, other: &Money) -> Result<Money, DomainError> {
        if self.currency != other.currency {
            return Err(DomainError::CurrencyMismatch);
        }
        Ok(Money {
            amount: self.amount + other.amount,
            currency: self.currency,
        })
    }

    /// 金額を乗算
    pub fn multiply(&self, factor: u32) -> Money {
        Money {
            amount: self.amount * factor as i64,
            currency: self.currency,
        }
    }
}

/// 明細行の課金種別
/// 滞在予約行・日次転記行・エキストラベッド行を型で区別する
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChargeKind {
    /// 予約時に作成される滞在全体の行（日付範囲と客室数を持つ）
    Stay { period: StayRange, room_count: u32 },
    /// フォリオに転記された特定日の料金（ナイトオーディットの客室料金や都度課金）
    Incidental { date: NaiveDate },
    /// エキストラベッドの特定日の料金
    ExtraBed { date: NaiveDate },
}

/// 予約明細行を表す値オブジェクト
/// 予約集約が排他的に所有する
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    item: ItemCode,
    charge: ChargeKind,
    quantity: u32,
    rate: Money,
}

impl LineItem {
    /// 新しい明細行を作成
    /// 数量は1以上である必要がある
    pub fn new(
        item: ItemCode,
        charge: ChargeKind,
        quantity: u32,
        rate: Money,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            item,
            charge,
            quantity,
            rate,
        })
    }

    /// アイテムコードを取得
    pub fn item(&self) -> &ItemCode {
        &self.item
    }

    /// 課金種別を取得
    pub fn charge(&self) -> &ChargeKind {
        &self.charge
    }

    /// 数量を取得
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// 単価（滞在行では滞在合計の1室あたり料金）を取得
    pub fn rate(&self) -> Money {
        self.rate
    }

    /// 金額を計算（単価 × 数量）
    pub fn amount(&self) -> Money {
        self.rate.multiply(self.quantity)
    }

    /// 単価を設定する（料金再計算時に使用）
    pub fn set_rate(&mut self, rate: Money) {
        self.rate = rate;
    }

    /// 滞在行の日付範囲を取得
    pub fn stay_period(&self) -> Option<&StayRange> {
        match &self.charge {
            ChargeKind::Stay { period, .. } => Some(period),
            _ => None,
        }
    }

    /// 滞在行の客室数を取得
    pub fn room_count(&self) -> Option<u32> {
        match &self.charge {
            ChargeKind::Stay { room_count, .. } => Some(*room_count),
            _ => None,
        }
    }

    /// 特定日に転記された行かどうか
    pub fn posted_on(&self, date: NaiveDate) -> bool {
        matches!(
            &self.charge,
            ChargeKind::Incidental { date: d } | ChargeKind::ExtraBed { date: d } if *d == date
        )
    }
}

/// 客室アサインの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllotmentStatus {
    /// 予約済み
    Booked,
    /// チェックイン済み
    CheckedIn,
}

impl fmt::Display for AllotmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            AllotmentStatus::Booked => "Booked",
            AllotmentStatus::CheckedIn => "Checked In",
        };
        write!(f, "{}", status_str)
    }
}

impl AllotmentStatus {
    /// 文字列からAllotmentStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "Booked" => Ok(AllotmentStatus::Booked),
            "Checked In" => Ok(AllotmentStatus::CheckedIn),
            _ => Err(DomainError::InvalidValue(format!(
                "invalid allotment status: {}",
                s
            ))),
        }
    }
}

/// 物理客室のアサインを表す値オブジェクト
/// 予約明細の一部の期間に具体的な客室を割り当てる
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAllotment {
    room: RoomId,
    item: ItemCode,
    period: StayRange,
    status: AllotmentStatus,
}

impl RoomAllotment {
    /// 新しい客室アサインを作成（初期状態はBooked）
    pub fn new(room: RoomId, item: ItemCode, period: StayRange) -> Self {
        Self {
            room,
            item,
            period,
            status: AllotmentStatus::Booked,
        }
    }

    /// リポジトリから取得したデータでアサインを再構築
    pub fn reconstruct(
        room: RoomId,
        item: ItemCode,
        period: StayRange,
        status: AllotmentStatus,
    ) -> Self {
        Self {
            room,
            item,
            period,
            status,
        }
    }

    /// 客室コードを取得
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// アイテムコードを取得
    pub fn item(&self) -> &ItemCode {
        &self.item
    }

    /// アサイン期間を取得
    pub fn period(&self) -> &StayRange {
        &self.period
    }

    /// アサイン状態を取得
    pub fn status(&self) -> AllotmentStatus {
        self.status
    }

    /// アクティブなアサインかどうか（Booked / Checked In）
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            AllotmentStatus::Booked | AllotmentStatus::CheckedIn
        )
    }

    /// アサインをチェックイン状態にする
    pub fn check_in(&mut self) {
        self.status = AllotmentStatus::CheckedIn;
    }
}

/// 予約のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    /// 下書き（作成直後、検証前）
    Draft,
    /// 予約確定（検証済み）
    Booked,
    /// チェックイン済み
    CheckedIn,
    /// チェックアウト済み
    CheckedOut,
    /// 完了（フォリオ精算済み）
    Completed,
    /// 請求書発行済み
    Invoiced,
    /// 支払済み
    Paid,
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            ReservationStatus::Draft => "Draft",
            ReservationStatus::Booked => "Booked",
            ReservationStatus::CheckedIn => "Checked In",
            ReservationStatus::CheckedOut => "Checked Out",
            ReservationStatus::Completed => "Completed",
            ReservationStatus::Invoiced => "Invoiced",
            ReservationStatus::Paid => "Paid",
        };
        write!(f, "{}", status_str)
    }
}

impl ReservationStatus {
    /// 文字列からReservationStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "Draft" => Ok(ReservationStatus::Draft),
            "Booked" => Ok(ReservationStatus::Booked),
            "Checked In" => Ok(ReservationStatus::CheckedIn),
            "Checked Out" => Ok(ReservationStatus::CheckedOut),
            "Completed" => Ok(ReservationStatus::Completed),
            "Invoiced" => Ok(ReservationStatus::Invoiced),
            "Paid" => Ok(ReservationStatus::Paid),
            _ => Err(DomainError::InvalidValue(format!(
                "invalid reservation status: {}",
                s
            ))),
        }
    }

    /// 宿泊客が滞在中の状態かどうか
    pub fn is_occupied(&self) -> bool {
        matches!(self, ReservationStatus::CheckedIn)
    }
}

/// ハウスキーピングの客室状態
/// 予約ステータスとは独立に管理される
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HousekeepingStatus {
    /// 清掃済み
    Clean,
    /// 要清掃
    Dirty,
    /// メンテナンス中
    Maintenance,
}

impl fmt::Display for HousekeepingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            HousekeepingStatus::Clean => "Clean",
            HousekeepingStatus::Dirty => "Dirty",
            HousekeepingStatus::Maintenance => "Maintenance",
        };
        write!(f, "{}", status_str)
    }
}

impl HousekeepingStatus {
    /// 文字列からHousekeepingStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "Clean" => Ok(HousekeepingStatus::Clean),
            "Dirty" => Ok(HousekeepingStatus::Dirty),
            "Maintenance" => Ok(HousekeepingStatus::Maintenance),
            _ => Err(DomainError::InvalidValue(format!(
                "invalid housekeeping status: {}",
                s
            ))),
        }
    }
}

/// ホテル全体の設定
/// 請求時のデフォルト顧客とエキストラベッドの販売アイテムを保持する
#[derive(Debug, Clone)]
pub struct HotelSettings {
    default_customer: Option<CustomerId>,
    extra_bed_item: Option<ItemCode>,
}

impl HotelSettings {
    /// 新しいホテル設定を作成
    pub fn new(default_customer: Option<CustomerId>, extra_bed_item: Option<ItemCode>) -> Self {
        Self {
            default_customer,
            extra_bed_item,
        }
    }

    /// デフォルト顧客を取得
    pub fn default_customer(&self) -> Option<CustomerId> {
        self.default_customer
    }

    /// エキストラベッドの販売アイテムを取得
    pub fn extra_bed_item(&self) -> Option<&ItemCode> {
        self.extra_bed_item.as_ref()
    }
}
