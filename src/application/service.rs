pub mod occupancy_query_service;
pub mod reservation_query_service;

pub use occupancy_query_service::OccupancyQueryService;
pub use reservation_query_service::ReservationQueryService;

use crate::application::ApplicationError;
use crate::domain::event::{
    DomainEvent, NightAuditSubmitted, ReservationBooked, ReservationCheckedIn,
    ReservationCheckedOut,
};
use crate::domain::model::{
    AuditLine, CompanyCode, CustomerId, GroupId, GuestId, HotelSettings, HousekeepingStatus,
    ItemCode, Money, NightAuditRun, PricingPeriod, Reservation, ReservationId, ReservationStatus,
    Room, RoomAllotment, RoomId, RoomPackage, RoomType, RoomTypeId, StayRange,
};
use crate::domain::port::{
    BillingError, BillingGateway, EventBus, GuestDirectory, InvoiceRef, Logger,
    NightAuditRepository, PricingRepository, ReservationRepository, RoomInventoryRepository,
};
use crate::domain::service::{AvailabilityCalculator, RateTable, ReservationValidator};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// 予約アプリケーションサービス
pub struct ReservationApplicationService {
    reservation_repository: Arc<dyn ReservationRepository>,
    inventory_repository: Arc<dyn RoomInventoryRepository>,
    validator: Arc<ReservationValidator>,
    availability: Arc<AvailabilityCalculator>,
    rate_table: Arc<RateTable>,
    billing: Arc<dyn BillingGateway>,
    event_bus: Arc<dyn EventBus>,
    settings: HotelSettings,
}

impl ReservationApplicationService {
    /// 新しい予約アプリケーションサービスを作成
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reservation_repository: Arc<dyn ReservationRepository>,
        inventory_repository: Arc<dyn RoomInventoryRepository>,
        validator: Arc<ReservationValidator>,
        availability: Arc<AvailabilityCalculator>,
        rate_table: Arc<RateTable>,
        billing: Arc<dyn BillingGateway>,
        event_bus: Arc<dyn EventBus>,
        settings: HotelSettings,
    ) -> Self {
        Self {
            reservation_repository,
            inventory_repository,
            validator,
            availability,
            rate_table,
            billing,
            event_bus,
            settings,
        }
    }

    /// 予約を読み込む（見つからなければNotFound）
    async fn load(&self, id: ReservationId) -> Result<Reservation, ApplicationError> {
        self.reservation_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("予約が見つかりません: {}", id)))
    }

    /// アクティブなアサインの客室一覧を取得する
    fn allotted_rooms(reservation: &Reservation) -> Vec<RoomId> {
        reservation
            .room_allotments()
            .iter()
            .filter(|a| a.is_active())
            .map(|a| a.room().clone())
            .collect()
    }

    /// 新しい予約を下書きとして作成
    ///
    /// # Returns
    /// * `Ok(ReservationId)` - 作成された予約のID
    /// * `Err(ApplicationError)` - 作成失敗
    pub async fn create_reservation(
        &self,
        company: CompanyCode,
        from_date: NaiveDate,
        to_date: NaiveDate,
        guest: GuestId,
        item: ItemCode,
        room_count: u32,
    ) -> Result<ReservationId, ApplicationError> {
        let stay = StayRange::new(from_date, to_date)?;
        let reservation_id = self.reservation_repository.next_identity();
        let reservation =
            Reservation::new(reservation_id, company, stay, guest, item, room_count)?;
        self.reservation_repository.save(&reservation).await?;
        Ok(reservation_id)
    }

    /// 請求先顧客を設定
    pub async fn set_customer(
        &self,
        reservation_id: ReservationId,
        customer: CustomerId,
    ) -> Result<(), ApplicationError> {
        let mut reservation = self.load(reservation_id).await?;
        reservation.set_customer(customer);
        self.reservation_repository.save(&reservation).await?;
        Ok(())
    }

    /// エキストラベッド数を設定
    pub async fn set_extra_beds(
        &self,
        reservation_id: ReservationId,
        count: u32,
    ) -> Result<(), ApplicationError> {
        let mut reservation = self.load(reservation_id).await?;
        reservation.set_extra_beds(count);
        self.reservation_repository.save(&reservation).await?;
        Ok(())
    }

    /// 物理客室をアサインする
    pub async fn allot_room(
        &self,
        reservation_id: ReservationId,
        room: RoomId,
        item: ItemCode,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<(), ApplicationError> {
        if self.inventory_repository.find_room(&room).await?.is_none() {
            return Err(ApplicationError::NotFound(format!(
                "客室が見つかりません: {}",
                room
            )));
        }
        let period = StayRange::new(from_date, to_date)?;
        let mut reservation = self.load(reservation_id).await?;
        reservation.allot_room(RoomAllotment::new(room, item, period))?;
        self.reservation_repository.save(&reservation).await?;
        Ok(())
    }

    /// 予約を検証して確定する
    ///
    /// 料金再計算と空室確認に合格した場合のみBookedに遷移して保存する。
    /// 保存は検証中に読み込んだ客室数を使ってトランザクション内で
    /// 再検証され、同時予約による超過予約を防ぐ
    pub async fn book_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<(), ApplicationError> {
        let mut reservation = self.load(reservation_id).await?;

        let cache = self.validator.validate(&mut reservation).await?;
        reservation.book()?;

        let capacities = cache.into_counts();
        self.reservation_repository
            .save_booked(&reservation, &capacities)
            .await?;

        let correlation_id = Uuid::new_v4();
        let event = ReservationBooked::with_correlation_id(
            reservation.id(),
            reservation.guest(),
            *reservation.stay(),
            reservation.net_total(),
            correlation_id,
        );
        self.event_bus
            .publish(DomainEvent::ReservationBooked(event))
            .await
            .map_err(|e| ApplicationError::EventPublishingFailed(e.to_string()))?;

        Ok(())
    }

    /// グループ予約として同条件の予約を複製する
    ///
    /// 元予約にグループIDが無ければ採番して付与し、指定された数だけ
    /// 同じ宿泊客・顧客の下書き予約を作成する
    pub async fn add_group_items(
        &self,
        reservation_id: ReservationId,
        item: ItemCode,
        from_date: NaiveDate,
        to_date: NaiveDate,
        qty: u32,
    ) -> Result<Vec<ReservationId>, ApplicationError> {
        if qty == 0 {
            return Err(ApplicationError::DomainError(
                crate::domain::error::DomainError::InvalidQuantity,
            ));
        }
        let mut source = self.load(reservation_id).await?;
        let group_id = match source.group_id() {
            Some(group_id) => group_id,
            None => {
                let group_id = GroupId::new();
                source.set_group(group_id);
                self.reservation_repository.save(&source).await?;
                group_id
            }
        };

        let stay = StayRange::new(from_date, to_date)?;
        let mut created = Vec::with_capacity(qty as usize);
        for _ in 0..qty {
            let id = self.reservation_repository.next_identity();
            let mut clone = Reservation::new(
                id,
                source.company().clone(),
                stay,
                source.guest(),
                item.clone(),
                1,
            )?;
            clone.set_group(group_id);
            if let Some(customer) = source.customer() {
                clone.set_customer(customer);
            }
            self.reservation_repository.save(&clone).await?;
            created.push(id);
        }
        Ok(created)
    }

    /// チェックインする
    ///
    /// アサイン済み客室の重複確認を再実行してから遷移する
    pub async fn check_in(&self, reservation_id: ReservationId) -> Result<(), ApplicationError> {
        let mut reservation = self.load(reservation_id).await?;

        self.availability
            .check_allotment_conflicts(&reservation)
            .await?;
        reservation.check_in()?;
        self.reservation_repository.save(&reservation).await?;

        let correlation_id = Uuid::new_v4();
        let event = ReservationCheckedIn::with_correlation_id(
            reservation.id(),
            Self::allotted_rooms(&reservation),
            correlation_id,
        );
        self.event_bus
            .publish(DomainEvent::ReservationCheckedIn(event))
            .await
            .map_err(|e| ApplicationError::EventPublishingFailed(e.to_string()))?;

        Ok(())
    }

    /// グループ全体をチェックインする
    ///
    /// グループ内でBooked状態かつ客室アサイン済みの予約を順に
    /// チェックインし、処理件数を返す
    pub async fn check_in_group(&self, group_id: GroupId) -> Result<u32, ApplicationError> {
        let members = self.reservation_repository.find_by_group(group_id).await?;
        let mut checked_in = 0u32;
        for member in members {
            if member.status() != ReservationStatus::Booked
                || member.room_allotments().is_empty()
            {
                continue;
            }
            self.check_in(member.id()).await?;
            checked_in += 1;
        }
        Ok(checked_in)
    }

    /// チェックアウトする
    ///
    /// ハウスキーピングの要清掃タスク作成はチェックアウトイベント経由で
    /// 行われる。フォリオが精算済みならそのままCompletedまで進める
    pub async fn check_out(&self, reservation_id: ReservationId) -> Result<(), ApplicationError> {
        let mut reservation = self.load(reservation_id).await?;

        let rooms = Self::allotted_rooms(&reservation);
        let folio_closed = reservation.check_out()?;
        if folio_closed {
            reservation.complete()?;
        }
        self.reservation_repository.save(&reservation).await?;

        let correlation_id = Uuid::new_v4();
        let event = ReservationCheckedOut::with_correlation_id(
            reservation.id(),
            rooms,
            reservation.stay().to_date(),
            folio_closed,
            correlation_id,
        );
        self.event_bus
            .publish(DomainEvent::ReservationCheckedOut(event))
            .await
            .map_err(|e| ApplicationError::EventPublishingFailed(e.to_string()))?;

        Ok(())
    }

    /// 1日分の客室料金とエキストラベッド料金をフォリオに転記する
    ///
    /// 既に転記済みの (アイテム, 日付) は集約側の再確認でスキップされる。
    /// 戻り値は新たに転記された行数
    pub async fn post_room_and_tax(
        &self,
        reservation_id: ReservationId,
        date: NaiveDate,
    ) -> Result<u32, ApplicationError> {
        let mut reservation = self.load(reservation_id).await?;
        let mut posted = 0u32;

        let room_item = reservation.item().clone();
        let room_rate = self.rate_table.lookup(&room_item, date).await?;
        if reservation.post_room_charge(room_item, date, room_rate)? {
            posted += 1;
        }

        if reservation.extra_beds() > 0 {
            if let Some(extra_item) = self.settings.extra_bed_item() {
                let extra_rate = self.rate_table.lookup(extra_item, date).await?;
                if reservation.post_extra_bed_charge(
                    extra_item.clone(),
                    date,
                    reservation.extra_beds(),
                    extra_rate,
                )? {
                    posted += 1;
                }
            }
        }

        self.reservation_repository.save(&reservation).await?;
        Ok(posted)
    }

    /// 請求先顧客を解決する（予約の顧客→設定のデフォルト顧客の順）
    fn resolve_customer(&self, reservation: &Reservation) -> Result<CustomerId, ApplicationError> {
        reservation
            .customer()
            .or_else(|| self.settings.default_customer())
            .ok_or_else(|| {
                ApplicationError::BillingError(BillingError::NoCustomer(
                    "Default customer is not set in hotel settings".to_string(),
                ))
            })
    }

    /// 請求書を発行する
    ///
    /// コアは明細行と顧客を渡すだけで、請求書の作成は外部の
    /// 請求コラボレーターに委譲する
    pub async fn make_invoice(
        &self,
        reservation_id: ReservationId,
    ) -> Result<InvoiceRef, ApplicationError> {
        let mut reservation = self.load(reservation_id).await?;
        let customer = self.resolve_customer(&reservation)?;
        let invoice = self
            .billing
            .issue_invoice(reservation.company(), customer, reservation.items())
            .await?;
        reservation.mark_invoiced()?;
        self.reservation_repository.save(&reservation).await?;
        Ok(invoice)
    }

    /// グループの一括請求書を発行する
    ///
    /// グループ内の全予約の明細行を1枚の請求書にまとめ、各予約を
    /// Invoicedに遷移させる
    pub async fn make_group_invoice(
        &self,
        group_id: GroupId,
    ) -> Result<InvoiceRef, ApplicationError> {
        let members = self.reservation_repository.find_by_group(group_id).await?;
        if members.is_empty() {
            return Err(ApplicationError::NotFound(format!(
                "グループが見つかりません: {}",
                group_id
            )));
        }

        let customer = members
            .iter()
            .find_map(|r| r.customer())
            .or_else(|| self.settings.default_customer())
            .ok_or_else(|| {
                ApplicationError::BillingError(BillingError::NoCustomer(
                    "Default customer is not set in hotel settings".to_string(),
                ))
            })?;

        let lines: Vec<_> = members
            .iter()
            .flat_map(|r| r.items().iter().cloned())
            .collect();
        let company = members[0].company().clone();
        let invoice = self.billing.issue_invoice(&company, customer, &lines).await?;

        for member in members {
            let mut member = member;
            member.mark_invoiced()?;
            self.reservation_repository.save(&member).await?;
        }
        Ok(invoice)
    }

    /// 支払済みにする（請求コラボレーターからのコールバック）
    pub async fn mark_reservation_paid(
        &self,
        reservation_id: ReservationId,
    ) -> Result<(), ApplicationError> {
        let mut reservation = self.load(reservation_id).await?;
        reservation.mark_paid()?;
        self.reservation_repository.save(&reservation).await?;
        Ok(())
    }
}

/// ナイトオーディットアプリケーションサービス
///
/// 1日の終わりに滞在中の全予約へその日の料金を転記する冪等バッチ。
/// (会社, 日付) ごとに高々1回の実行がupsertで確保される
pub struct NightAuditApplicationService {
    reservation_repository: Arc<dyn ReservationRepository>,
    night_audit_repository: Arc<dyn NightAuditRepository>,
    guest_directory: Arc<dyn GuestDirectory>,
    rate_table: Arc<RateTable>,
    event_bus: Arc<dyn EventBus>,
    settings: HotelSettings,
}

impl NightAuditApplicationService {
    /// 新しいナイトオーディットアプリケーションサービスを作成
    pub fn new(
        reservation_repository: Arc<dyn ReservationRepository>,
        night_audit_repository: Arc<dyn NightAuditRepository>,
        guest_directory: Arc<dyn GuestDirectory>,
        rate_table: Arc<RateTable>,
        event_bus: Arc<dyn EventBus>,
        settings: HotelSettings,
    ) -> Self {
        Self {
            reservation_repository,
            night_audit_repository,
            guest_directory,
            rate_table,
            event_bus,
            settings,
        }
    }

    /// 未チェックアウトの宿泊が無いことを確認する
    ///
    /// Checked In のまま to_date が監査日以前になっている予約があると、
    /// その客室の一覧とともにバッチ全体が失敗する。スタッフが延泊か
    /// チェックアウトで解消してから再実行する
    async fn assert_no_pending_checkout(
        &self,
        company: &CompanyCode,
        date: NaiveDate,
    ) -> Result<(), ApplicationError> {
        let checked_in = self.reservation_repository.find_checked_in(company).await?;
        let mut rooms = Vec::new();
        let mut has_pending = false;
        for reservation in &checked_in {
            if reservation.stay().to_date() <= date {
                has_pending = true;
                for allotment in reservation.room_allotments() {
                    if allotment.is_active() {
                        rooms.push(allotment.room().clone());
                    }
                }
            }
        }
        if has_pending {
            return Err(ApplicationError::DomainError(
                crate::domain::error::DomainError::PendingCheckout { rooms },
            ));
        }
        Ok(())
    }

    /// 監査行を計算する
    ///
    /// Checked In かつ宿泊期間が監査日を含む予約ごとに、主要パッケージの
    /// 行と（あれば）エキストラベッドの行を生成する。既に同じ
    /// (予約, アイテム, 日付) の明細が転記済みの組は除外されるため、
    /// 提出前の再計算は何度でも安全で、転記が進むほど行は減っていく
    pub async fn compute(
        &self,
        company: &CompanyCode,
        date: NaiveDate,
    ) -> Result<Vec<AuditLine>, ApplicationError> {
        self.assert_no_pending_checkout(company, date).await?;

        let mut checked_in = self.reservation_repository.find_checked_in(company).await?;
        checked_in.sort_by_key(|r| r.id().to_string());

        let mut lines = Vec::new();
        for reservation in &checked_in {
            if !reservation.stay().contains_night(date) {
                continue;
            }

            let profile = self
                .guest_directory
                .profile(reservation.guest())
                .await?;
            let (guest_name, mobile_no) = match profile {
                Some(profile) => (profile.full_name, profile.mobile_no),
                None => (reservation.guest().to_string(), None),
            };
            let room = reservation
                .room_allotments()
                .iter()
                .find(|a| a.is_active())
                .map(|a| a.room().clone());

            // 主要パッケージの1日分
            if !reservation.has_posted_charge(reservation.item(), date) {
                lines.push(AuditLine::new(
                    room.clone(),
                    reservation.id(),
                    reservation.guest(),
                    guest_name.clone(),
                    mobile_no.clone(),
                    reservation.item().clone(),
                    1,
                )?);
            }

            // エキストラベッドの1日分
            if reservation.extra_beds() > 0 {
                if let Some(extra_item) = self.settings.extra_bed_item() {
                    if !reservation.has_posted_charge(extra_item, date) {
                        lines.push(AuditLine::new(
                            room,
                            reservation.id(),
                            reservation.guest(),
                            guest_name,
                            mobile_no,
                            extra_item.clone(),
                            reservation.extra_beds(),
                        )?);
                    }
                }
            }
        }
        Ok(lines)
    }

    /// (会社, 日付) の実行を用意して監査行のスナップショットを保存する
    ///
    /// 既存の実行があればそれを返す。未提出の実行は最新の計算結果で
    /// スナップショットを更新する
    pub async fn prepare_run(
        &self,
        company: &CompanyCode,
        date: NaiveDate,
    ) -> Result<NightAuditRun, ApplicationError> {
        let lines = self.compute(company, date).await?;
        let mut run = self.night_audit_repository.get_or_create(company, date).await?;
        if !run.is_submitted() {
            run.replace_lines(lines)?;
            self.night_audit_repository.save(&run).await?;
        }
        Ok(run)
    }

    /// 実行を提出し、各監査行を予約のフォリオに転記する
    ///
    /// 転記は予約集約側の (アイテム, 日付) 再確認を通るため、バッチと
    /// 対話的な転記が競合しても二重計上にならない。戻り値は新たに
    /// 転記された行数
    pub async fn submit(
        &self,
        company: &CompanyCode,
        date: NaiveDate,
    ) -> Result<u32, ApplicationError> {
        self.assert_no_pending_checkout(company, date).await?;

        let mut run = self
            .night_audit_repository
            .find(company, date)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!(
                    "ナイトオーディットが見つかりません: {} {}",
                    company, date
                ))
            })?;

        let mut posted = 0u32;
        for line in run.lines() {
            let mut reservation = self
                .reservation_repository
                .find_by_id(line.reservation())
                .await?
                .ok_or_else(|| {
                    ApplicationError::NotFound(format!(
                        "予約が見つかりません: {}",
                        line.reservation()
                    ))
                })?;

            let rate = self.rate_table.lookup(line.item(), date).await?;
            let is_extra_bed = self.settings.extra_bed_item() == Some(line.item());
            let appended = if is_extra_bed {
                reservation.post_extra_bed_charge(
                    line.item().clone(),
                    date,
                    line.quantity(),
                    rate,
                )?
            } else {
                reservation.post_room_charge(line.item().clone(), date, rate)?
            };
            if appended {
                posted += 1;
            }
            self.reservation_repository.save(&reservation).await?;
        }

        run.mark_submitted()?;
        self.night_audit_repository.save(&run).await?;

        let correlation_id = Uuid::new_v4();
        let event =
            NightAuditSubmitted::with_correlation_id(company.clone(), date, posted, correlation_id);
        self.event_bus
            .publish(DomainEvent::NightAuditSubmitted(event))
            .await
            .map_err(|e| ApplicationError::EventPublishingFailed(e.to_string()))?;

        Ok(posted)
    }
}

/// 客室在庫アプリケーションサービス
/// 客室タイプ・客室・パッケージ・料金期間の参照データを管理する
pub struct RoomInventoryApplicationService {
    inventory_repository: Arc<dyn RoomInventoryRepository>,
    pricing_repository: Arc<dyn PricingRepository>,
    rate_table: Arc<RateTable>,
    logger: Arc<dyn Logger>,
}

impl RoomInventoryApplicationService {
    /// 新しい客室在庫アプリケーションサービスを作成
    pub fn new(
        inventory_repository: Arc<dyn RoomInventoryRepository>,
        pricing_repository: Arc<dyn PricingRepository>,
        rate_table: Arc<RateTable>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            inventory_repository,
            pricing_repository,
            rate_table,
            logger,
        }
    }

    /// 客室タイプを登録する
    pub async fn create_room_type(
        &self,
        id: RoomTypeId,
        name: String,
    ) -> Result<(), ApplicationError> {
        let room_type = RoomType::new(id, name);
        self.inventory_repository
            .save_room_type(&room_type)
            .await
            .map_err(ApplicationError::from)
    }

    /// 客室を登録する
    pub async fn create_room(
        &self,
        id: RoomId,
        room_type: RoomTypeId,
    ) -> Result<(), ApplicationError> {
        if self
            .inventory_repository
            .find_room_type(&room_type)
            .await?
            .is_none()
        {
            return Err(ApplicationError::NotFound(format!(
                "客室タイプが見つかりません: {}",
                room_type
            )));
        }
        let room = Room::new(id, room_type);
        self.inventory_repository
            .save_room(&room)
            .await
            .map_err(ApplicationError::from)
    }

    /// 客室パッケージを登録する
    pub async fn create_package(
        &self,
        item: ItemCode,
        room_type: RoomTypeId,
    ) -> Result<(), ApplicationError> {
        let package = RoomPackage::new(item, room_type);
        self.inventory_repository
            .save_package(&package)
            .await
            .map_err(ApplicationError::from)
    }

    /// 料金期間を登録する
    ///
    /// 同一アイテムの重複期間はデータ品質上の欠陥として警告ログに残す
    /// （エンジン自体は先頭一致で決定的に解決する）
    pub async fn create_pricing_period(
        &self,
        item: ItemCode,
        from_date: NaiveDate,
        to_date: NaiveDate,
        rate: Money,
    ) -> Result<(), ApplicationError> {
        if to_date < from_date {
            return Err(ApplicationError::DomainError(
                crate::domain::error::DomainError::InvalidDateRange(format!(
                    "to date {} is before from date {}",
                    to_date, from_date
                )),
            ));
        }
        let period = PricingPeriod::new(item.clone(), from_date, to_date, rate);
        self.pricing_repository.save_period(&period).await?;

        let conflicts = self.rate_table.data_quality_conflicts(&item).await?;
        if !conflicts.is_empty() {
            let mut context = HashMap::new();
            context.insert("item".to_string(), item.to_string());
            context.insert("conflicts".to_string(), conflicts.len().to_string());
            self.logger.warn(
                "PricingPeriods",
                "Overlapping pricing periods detected for item",
                None,
                Some(context),
            );
        }
        Ok(())
    }

    /// 客室のハウスキーピング状態を更新する
    pub async fn update_housekeeping_status(
        &self,
        room_id: RoomId,
        status: HousekeepingStatus,
    ) -> Result<(), ApplicationError> {
        let mut room = self
            .inventory_repository
            .find_room(&room_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("客室が見つかりません: {}", room_id))
            })?;
        room.set_housekeeping(status);
        self.inventory_repository
            .save_room(&room)
            .await
            .map_err(ApplicationError::from)
    }
}
