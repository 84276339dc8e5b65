use crate::domain::error::DomainError;
use crate::domain::model::{
    ChargeKind, CompanyCode, CustomerId, GroupId, GuestId, ItemCode, LineItem, Money,
    ReservationId, ReservationStatus, RoomAllotment, StayRange,
};
use chrono::NaiveDate;

/// 予約集約
/// 1件の宿泊リクエストのライフサイクルと明細・客室アサインを管理する
#[derive(Debug, Clone)]
pub struct Reservation {
    id: ReservationId,
    company: CompanyCode,
    stay: StayRange,
    guest: GuestId,
    customer: Option<CustomerId>,
    group_id: Option<GroupId>,
    item: ItemCode,
    extra_beds: u32,
    status: ReservationStatus,
    items: Vec<LineItem>,
    room_allotments: Vec<RoomAllotment>,
    net_total: Money,
}

impl Reservation {
    /// 新しい予約を作成
    /// 初期ステータスはDraftで、選択されたパッケージの滞在行を1本持つ
    /// 少なくとも1泊が必要
    pub fn new(
        id: ReservationId,
        company: CompanyCode,
        stay: StayRange,
        guest: GuestId,
        item: ItemCode,
        room_count: u32,
    ) -> Result<Self, DomainError> {
        if stay.night_count() == 0 {
            return Err(DomainError::InvalidDateRange(
                "reservation must cover at least one night".to_string(),
            ));
        }
        if room_count == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        let stay_line = LineItem::new(
            item.clone(),
            ChargeKind::Stay {
                period: stay,
                room_count,
            },
            room_count,
            Money::zero(),
        )?;
        Ok(Self {
            id,
            company,
            stay,
            guest,
            customer: None,
            group_id: None,
            item,
            extra_beds: 0,
            status: ReservationStatus::Draft,
            items: vec![stay_line],
            room_allotments: Vec::new(),
            net_total: Money::zero(),
        })
    }

    /// データベースから取得したデータで予約を再構築
    /// リポジトリでの使用を想定
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: ReservationId,
        company: CompanyCode,
        stay: StayRange,
        guest: GuestId,
        customer: Option<CustomerId>,
        group_id: Option<GroupId>,
        item: ItemCode,
        extra_beds: u32,
        status: ReservationStatus,
        items: Vec<LineItem>,
        room_allotments: Vec<RoomAllotment>,
    ) -> Self {
        let mut reservation = Self {
            id,
            company,
            stay,
            guest,
            customer,
            group_id,
            item,
            extra_beds,
            status,
            items,
            room_allotments,
            net_total: Money::zero(),
        };
        reservation.recalculate_net_total();
        reservation
    }

    /// 予約IDを取得
    pub fn id(&self) -> ReservationId {
        self.id
    }

    /// 会社コードを取得
    pub fn company(&self) -> &CompanyCode {
        &self.company
    }

    /// 宿泊期間を取得
    pub fn stay(&self) -> &StayRange {
        &self.stay
    }

    /// 宿泊客IDを取得
    pub fn guest(&self) -> GuestId {
        self.guest
    }

    /// 請求先顧客を取得
    pub fn customer(&self) -> Option<CustomerId> {
        self.customer
    }

    /// 請求先顧客を設定
    pub fn set_customer(&mut self, customer: CustomerId) {
        self.customer = Some(customer);
    }

    /// グループIDを取得
    pub fn group_id(&self) -> Option<GroupId> {
        self.group_id
    }

    /// グループIDを設定（グループ予約の追加時）
    pub fn set_group(&mut self, group_id: GroupId) {
        self.group_id = Some(group_id);
    }

    /// 選択された客室パッケージを取得
    pub fn item(&self) -> &ItemCode {
        &self.item
    }

    /// エキストラベッド数を取得
    pub fn extra_beds(&self) -> u32 {
        self.extra_beds
    }

    /// エキストラベッド数を設定
    pub fn set_extra_beds(&mut self, count: u32) {
        self.extra_beds = count;
    }

    /// 予約ステータスを取得
    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    /// 明細行のリストを取得
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// 客室アサインのリストを取得
    pub fn room_allotments(&self) -> &[RoomAllotment] {
        &self.room_allotments
    }

    /// 合計金額を取得
    /// 常に全明細行の金額の合計と一致する
    pub fn net_total(&self) -> Money {
        self.net_total
    }

    /// 合計金額を明細行から再計算する
    fn recalculate_net_total(&mut self) {
        self.net_total = self
            .items
            .iter()
            .map(|line| line.amount())
            .fold(Money::zero(), |acc, amount| acc.add(&amount).unwrap_or(acc));
    }

    /// 滞在行を追加する
    /// 同じ (アイテム, 期間) の滞在行が既にある場合は客室数を加算する
    pub fn add_stay_line(
        &mut self,
        item: ItemCode,
        period: StayRange,
        room_count: u32,
    ) -> Result<(), DomainError> {
        if room_count == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        if let Some(existing) = self.items.iter_mut().find(|line| {
            line.item() == &item && line.stay_period() == Some(&period)
        }) {
            let merged = existing.room_count().unwrap_or(0) + room_count;
            *existing = LineItem::new(
                item,
                ChargeKind::Stay {
                    period,
                    room_count: merged,
                },
                merged,
                existing.rate(),
            )?;
        } else {
            self.items.push(LineItem::new(
                item,
                ChargeKind::Stay { period, room_count },
                room_count,
                Money::zero(),
            )?);
        }
        self.recalculate_net_total();
        Ok(())
    }

    /// 料金計算結果を滞在行に反映する
    /// rates は items() と同じ順序で、滞在行には Some、転記済み行には None が並ぶ
    pub fn apply_stay_rates(&mut self, rates: &[Option<Money>]) -> Result<(), DomainError> {
        if rates.len() != self.items.len() {
            return Err(DomainError::InvalidValue(
                "rate list does not match line items".to_string(),
            ));
        }
        for (line, rate) in self.items.iter_mut().zip(rates.iter()) {
            if let Some(rate) = rate {
                line.set_rate(*rate);
            }
        }
        self.recalculate_net_total();
        Ok(())
    }

    /// 客室をアサインする
    /// この予約内で同じ客室のアクティブなアサイン期間が重なる場合は拒否する
    pub fn allot_room(&mut self, allotment: RoomAllotment) -> Result<(), DomainError> {
        if let Some(existing) = self.room_allotments.iter().find(|a| {
            a.room() == allotment.room() && a.is_active() && a.period().overlaps(allotment.period())
        }) {
            return Err(DomainError::DuplicateAllotment {
                room: allotment.room().clone(),
                first: *existing.period(),
                second: *allotment.period(),
            });
        }
        self.room_allotments.push(allotment);
        Ok(())
    }

    /// 予約を確定する
    /// 事前条件: ステータスがDraftで、検証（料金計算と空室確認）に合格していること
    pub fn book(&mut self) -> Result<(), DomainError> {
        if self.status != ReservationStatus::Draft {
            return Err(DomainError::InvalidReservationState(
                "予約を確定できるのはDraft状態のみです".to_string(),
            ));
        }
        self.status = ReservationStatus::Booked;
        Ok(())
    }

    /// チェックインする
    /// 事前条件: ステータスがBooked
    /// 全ての客室アサインもChecked Inに遷移する
    pub fn check_in(&mut self) -> Result<(), DomainError> {
        if self.status != ReservationStatus::Booked {
            return Err(DomainError::InvalidReservationState(
                "チェックインできるのはBooked状態のみです".to_string(),
            ));
        }
        self.status = ReservationStatus::CheckedIn;
        for allotment in &mut self.room_allotments {
            allotment.check_in();
        }
        Ok(())
    }

    /// チェックアウトする
    /// 事前条件: ステータスがChecked In
    /// 戻り値はフォリオが精算済みかどうか（全宿泊日の客室料金が転記済み）
    /// 精算済みの場合、呼び出し側は complete() で即座に完了へ進める
    pub fn check_out(&mut self) -> Result<bool, DomainError> {
        if self.status != ReservationStatus::CheckedIn {
            return Err(DomainError::InvalidReservationState(
                "チェックアウトできるのはChecked In状態のみです".to_string(),
            ));
        }
        self.status = ReservationStatus::CheckedOut;
        Ok(self.folio_closed())
    }

    /// フォリオが精算済みかどうか
    /// 全宿泊日に主要パッケージの転記行が存在すれば精算済みとみなす
    pub fn folio_closed(&self) -> bool {
        self.stay
            .nights()
            .iter()
            .all(|night| self.has_posted_charge(&self.item, *night))
    }

    /// 予約を完了にする
    /// 事前条件: ステータスがChecked Out
    pub fn complete(&mut self) -> Result<(), DomainError> {
        if self.status != ReservationStatus::CheckedOut {
            return Err(DomainError::InvalidReservationState(
                "完了にできるのはChecked Out状態のみです".to_string(),
            ));
        }
        self.status = ReservationStatus::Completed;
        Ok(())
    }

    /// 請求書発行済みにする（請求コラボレーターのコールバック）
    /// 事前条件: ステータスがCompleted
    pub fn mark_invoiced(&mut self) -> Result<(), DomainError> {
        if self.status != ReservationStatus::Completed {
            return Err(DomainError::InvalidReservationState(
                "請求書発行済みにできるのはCompleted状態のみです".to_string(),
            ));
        }
        self.status = ReservationStatus::Invoiced;
        Ok(())
    }

    /// 支払済みにする（請求コラボレーターのコールバック）
    /// 事前条件: ステータスがInvoiced
    pub fn mark_paid(&mut self) -> Result<(), DomainError> {
        if self.status != ReservationStatus::Invoiced {
            return Err(DomainError::InvalidReservationState(
                "支払済みにできるのはInvoiced状態のみです".to_string(),
            ));
        }
        self.status = ReservationStatus::Paid;
        Ok(())
    }

    /// 指定した (アイテム, 日付) の転記行が既に存在するか
    pub fn has_posted_charge(&self, item: &ItemCode, date: NaiveDate) -> bool {
        self.items
            .iter()
            .any(|line| line.item() == item && line.posted_on(date))
    }

    /// 1日分の客室料金をフォリオに転記する
    /// 既に同じ (アイテム, 日付) の行がある場合は何もせず Ok(false) を返す
    /// （ナイトオーディットと対話的な転記が競合しても二重計上しないための再確認）
    pub fn post_room_charge(
        &mut self,
        item: ItemCode,
        date: NaiveDate,
        rate: Money,
    ) -> Result<bool, DomainError> {
        if !self.status.is_occupied() {
            return Err(DomainError::InvalidReservationState(
                "料金を転記できるのはChecked In状態のみです".to_string(),
            ));
        }
        if self.has_posted_charge(&item, date) {
            return Ok(false);
        }
        self.items
            .push(LineItem::new(item, ChargeKind::Incidental { date }, 1, rate)?);
        self.recalculate_net_total();
        Ok(true)
    }

    /// 1日分のエキストラベッド料金をフォリオに転記する
    /// 既に同じ (アイテム, 日付) の行がある場合は何もせず Ok(false) を返す
    pub fn post_extra_bed_charge(
        &mut self,
        item: ItemCode,
        date: NaiveDate,
        quantity: u32,
        rate: Money,
    ) -> Result<bool, DomainError> {
        if !self.status.is_occupied() {
            return Err(DomainError::InvalidReservationState(
                "料金を転記できるのはChecked In状態のみです".to_string(),
            ));
        }
        if self.has_posted_charge(&item, date) {
            return Ok(false);
        }
        self.items
            .push(LineItem::new(item, ChargeKind::ExtraBed { date }, quantity, rate)?);
        self.recalculate_net_total();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AllotmentStatus, RoomId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stay() -> StayRange {
        StayRange::new(date(2024, 1, 10), date(2024, 1, 12)).unwrap()
    }

    fn new_reservation() -> Reservation {
        Reservation::new(
            ReservationId::new(),
            CompanyCode::new("GRAND-HOTEL").unwrap(),
            stay(),
            GuestId::new(),
            ItemCode::new("DLX-NIGHT").unwrap(),
            1,
        )
        .unwrap()
    }

    fn booked_reservation() -> Reservation {
        let mut reservation = new_reservation();
        reservation
            .apply_stay_rates(&[Some(Money::jpy(200))])
            .unwrap();
        reservation.book().unwrap();
        reservation
    }

    #[test]
    fn test_new_reservation_is_draft_with_stay_line() {
        let reservation = new_reservation();
        assert_eq!(reservation.status(), ReservationStatus::Draft);
        assert_eq!(reservation.items().len(), 1);
        assert_eq!(reservation.items()[0].room_count(), Some(1));
        assert!(reservation.net_total().is_zero());
    }

    #[test]
    fn test_new_reservation_requires_a_night() {
        let result = Reservation::new(
            ReservationId::new(),
            CompanyCode::new("GRAND-HOTEL").unwrap(),
            StayRange::new(date(2024, 1, 10), date(2024, 1, 10)).unwrap(),
            GuestId::new(),
            ItemCode::new("DLX-NIGHT").unwrap(),
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_rates_updates_net_total() {
        let mut reservation = new_reservation();
        reservation
            .apply_stay_rates(&[Some(Money::jpy(200))])
            .unwrap();
        assert_eq!(reservation.net_total().amount(), 200);
    }

    #[test]
    fn test_net_total_matches_line_amounts() {
        let mut reservation = booked_reservation();
        reservation.check_in().unwrap();
        reservation
            .post_room_charge(
                ItemCode::new("DLX-NIGHT").unwrap(),
                date(2024, 1, 10),
                Money::jpy(100),
            )
            .unwrap();
        let sum: i64 = reservation
            .items()
            .iter()
            .map(|line| line.amount().amount())
            .sum();
        assert_eq!(reservation.net_total().amount(), sum);
    }

    #[test]
    fn test_add_stay_line_merges_same_item_and_period() {
        let mut reservation = new_reservation();
        reservation
            .add_stay_line(ItemCode::new("DLX-NIGHT").unwrap(), stay(), 1)
            .unwrap();
        assert_eq!(reservation.items().len(), 1);
        assert_eq!(reservation.items()[0].room_count(), Some(2));
    }

    #[test]
    fn test_book_from_draft_only() {
        let mut reservation = new_reservation();
        assert!(reservation.book().is_ok());
        assert_eq!(reservation.status(), ReservationStatus::Booked);
        assert!(reservation.book().is_err());
    }

    #[test]
    fn test_check_in_flips_allotments() {
        let mut reservation = new_reservation();
        reservation
            .allot_room(RoomAllotment::new(
                RoomId::new("101").unwrap(),
                ItemCode::new("DLX-NIGHT").unwrap(),
                stay(),
            ))
            .unwrap();
        reservation.book().unwrap();
        reservation.check_in().unwrap();
        assert_eq!(
            reservation.room_allotments()[0].status(),
            AllotmentStatus::CheckedIn
        );
    }

    #[test]
    fn test_check_in_requires_booked() {
        let mut reservation = new_reservation();
        assert!(reservation.check_in().is_err());
    }

    #[test]
    fn test_overlapping_allotment_for_same_room_rejected() {
        let mut reservation = new_reservation();
        let room = RoomId::new("101").unwrap();
        let item = ItemCode::new("DLX-NIGHT").unwrap();
        reservation
            .allot_room(RoomAllotment::new(room.clone(), item.clone(), stay()))
            .unwrap();
        let overlapping = StayRange::new(date(2024, 1, 11), date(2024, 1, 13)).unwrap();
        let result = reservation.allot_room(RoomAllotment::new(room, item, overlapping));
        assert!(matches!(
            result,
            Err(DomainError::DuplicateAllotment { .. })
        ));
    }

    #[test]
    fn test_back_to_back_allotment_for_same_room_allowed() {
        let mut reservation = new_reservation();
        let room = RoomId::new("101").unwrap();
        let item = ItemCode::new("DLX-NIGHT").unwrap();
        reservation
            .allot_room(RoomAllotment::new(room.clone(), item.clone(), stay()))
            .unwrap();
        let next = StayRange::new(date(2024, 1, 12), date(2024, 1, 14)).unwrap();
        assert!(reservation
            .allot_room(RoomAllotment::new(room, item, next))
            .is_ok());
    }

    #[test]
    fn test_post_room_charge_is_idempotent() {
        let mut reservation = booked_reservation();
        reservation.check_in().unwrap();
        let item = ItemCode::new("DLX-NIGHT").unwrap();
        let posted = reservation
            .post_room_charge(item.clone(), date(2024, 1, 10), Money::jpy(100))
            .unwrap();
        assert!(posted);
        let posted_again = reservation
            .post_room_charge(item, date(2024, 1, 10), Money::jpy(100))
            .unwrap();
        assert!(!posted_again);
        assert_eq!(reservation.items().len(), 2);
    }

    #[test]
    fn test_post_charge_requires_checked_in() {
        let mut reservation = booked_reservation();
        let result = reservation.post_room_charge(
            ItemCode::new("DLX-NIGHT").unwrap(),
            date(2024, 1, 10),
            Money::jpy(100),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_check_out_reports_open_folio() {
        let mut reservation = booked_reservation();
        reservation.check_in().unwrap();
        // 宿泊料金を1泊も転記していないのでフォリオは未精算
        let closed = reservation.check_out().unwrap();
        assert!(!closed);
        assert_eq!(reservation.status(), ReservationStatus::CheckedOut);
    }

    #[test]
    fn test_check_out_with_closed_folio() {
        let mut reservation = booked_reservation();
        reservation.check_in().unwrap();
        let item = ItemCode::new("DLX-NIGHT").unwrap();
        reservation
            .post_room_charge(item.clone(), date(2024, 1, 10), Money::jpy(100))
            .unwrap();
        reservation
            .post_room_charge(item, date(2024, 1, 11), Money::jpy(100))
            .unwrap();
        let closed = reservation.check_out().unwrap();
        assert!(closed);
        reservation.complete().unwrap();
        assert_eq!(reservation.status(), ReservationStatus::Completed);
    }

    #[test]
    fn test_billing_transitions_are_monotonic() {
        let mut reservation = booked_reservation();
        reservation.check_in().unwrap();
        let item = ItemCode::new("DLX-NIGHT").unwrap();
        reservation
            .post_room_charge(item.clone(), date(2024, 1, 10), Money::jpy(100))
            .unwrap();
        reservation
            .post_room_charge(item, date(2024, 1, 11), Money::jpy(100))
            .unwrap();
        reservation.check_out().unwrap();
        reservation.complete().unwrap();
        assert!(reservation.mark_paid().is_err());
        reservation.mark_invoiced().unwrap();
        reservation.mark_paid().unwrap();
        assert_eq!(reservation.status(), ReservationStatus::Paid);
    }
}
