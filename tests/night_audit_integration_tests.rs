// 予約からナイトオーディットまでの統合テスト
// インメモリのモックリポジトリでアプリケーションサービスを端から端まで動かす

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use hotel_reservation_management::adapter::driven::{EventBusConfig, InMemoryEventBus};
use hotel_reservation_management::application::service::{
    NightAuditApplicationService, OccupancyQueryService, ReservationApplicationService,
    ReservationQueryService,
};
use hotel_reservation_management::application::ApplicationError;
use hotel_reservation_management::domain::error::DomainError;
use hotel_reservation_management::domain::handler::HousekeepingHandler;
use hotel_reservation_management::domain::model::{
    CompanyCode, CustomerId, GroupId, GuestId, HotelSettings, HousekeepingTask, ItemCode,
    LineItem, Money, NightAuditRun, PricingPeriod, Reservation, ReservationId, ReservationStatus,
    Room, RoomAllotment, RoomId, RoomPackage, RoomType, RoomTypeId, StayRange,
};
use hotel_reservation_management::domain::port::{
    BillingError, BillingGateway, GuestDirectory, GuestProfile, HousekeepingGateway, InvoiceRef,
    Logger, NightAuditRepository, PricingRepository, RepositoryError, ReservationRepository,
    RoomInventoryRepository,
};
use hotel_reservation_management::domain::service::{
    AvailabilityCalculator, RateTable, ReservationValidator,
};
use uuid::Uuid;

// ========== テスト用のインメモリ実装 ==========

struct InMemoryReservationRepository {
    reservations: Mutex<Vec<Reservation>>,
    packages: HashMap<ItemCode, RoomTypeId>,
}

impl InMemoryReservationRepository {
    fn new(packages: HashMap<ItemCode, RoomTypeId>) -> Self {
        Self {
            reservations: Mutex::new(Vec::new()),
            packages,
        }
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn save(&self, reservation: &Reservation) -> Result<(), RepositoryError> {
        let mut reservations = self.reservations.lock().await;
        reservations.retain(|r| r.id() != reservation.id());
        reservations.push(reservation.clone());
        Ok(())
    }

    async fn save_booked(
        &self,
        reservation: &Reservation,
        _capacities: &HashMap<RoomTypeId, u32>,
    ) -> Result<(), RepositoryError> {
        self.save(reservation).await
    }

    async fn find_by_id(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError> {
        let reservations = self.reservations.lock().await;
        Ok(reservations
            .iter()
            .find(|r| r.id() == reservation_id)
            .cloned())
    }

    async fn find_by_status(
        &self,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let reservations = self.reservations.lock().await;
        Ok(reservations
            .iter()
            .filter(|r| r.status() == status)
            .cloned()
            .collect())
    }

    async fn find_by_group(&self, group_id: GroupId) -> Result<Vec<Reservation>, RepositoryError> {
        let reservations = self.reservations.lock().await;
        Ok(reservations
            .iter()
            .filter(|r| r.group_id() == Some(group_id))
            .cloned()
            .collect())
    }

    async fn find_active_overlapping(
        &self,
        room_type: &RoomTypeId,
        range: &StayRange,
        exclude: Option<ReservationId>,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let reservations = self.reservations.lock().await;
        Ok(reservations
            .iter()
            .filter(|r| r.status() != ReservationStatus::Draft)
            .filter(|r| Some(r.id()) != exclude)
            .filter(|r| r.stay().overlaps(range))
            .filter(|r| {
                r.items().iter().any(|line| {
                    line.stay_period().is_some()
                        && self.packages.get(line.item()) == Some(room_type)
                })
            })
            .cloned()
            .collect())
    }

    async fn find_active_allotments(
        &self,
        room: &RoomId,
        range: &StayRange,
        exclude: Option<ReservationId>,
    ) -> Result<Vec<(ReservationId, RoomAllotment)>, RepositoryError> {
        let reservations = self.reservations.lock().await;
        let mut result = Vec::new();
        for reservation in reservations.iter() {
            if Some(reservation.id()) == exclude
                || reservation.status() == ReservationStatus::Draft
            {
                continue;
            }
            for allotment in reservation.room_allotments() {
                if allotment.room() == room
                    && allotment.is_active()
                    && allotment.period().overlaps(range)
                {
                    result.push((reservation.id(), allotment.clone()));
                }
            }
        }
        Ok(result)
    }

    async fn find_checked_in(
        &self,
        company: &CompanyCode,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let reservations = self.reservations.lock().await;
        Ok(reservations
            .iter()
            .filter(|r| r.status() == ReservationStatus::CheckedIn && r.company() == company)
            .cloned()
            .collect())
    }

    fn next_identity(&self) -> ReservationId {
        ReservationId::new()
    }
}

struct InMemoryRoomInventoryRepository {
    rooms: Mutex<Vec<Room>>,
    packages: HashMap<ItemCode, RoomTypeId>,
}

#[async_trait]
impl RoomInventoryRepository for InMemoryRoomInventoryRepository {
    async fn room_type_of(&self, item: &ItemCode) -> Result<Option<RoomTypeId>, RepositoryError> {
        Ok(self.packages.get(item).cloned())
    }

    async fn rooms_of(&self, room_type: &RoomTypeId) -> Result<Vec<Room>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms
            .iter()
            .filter(|room| room.room_type() == room_type)
            .cloned()
            .collect())
    }

    async fn room_count(&self, room_type: &RoomTypeId) -> Result<u32, RepositoryError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms
            .iter()
            .filter(|room| room.room_type() == room_type)
            .count() as u32)
    }

    async fn find_room(&self, room: &RoomId) -> Result<Option<Room>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms.iter().find(|r| r.id() == room).cloned())
    }

    async fn find_room_type(
        &self,
        room_type: &RoomTypeId,
    ) -> Result<Option<RoomType>, RepositoryError> {
        Ok(Some(RoomType::new(
            room_type.clone(),
            room_type.to_string(),
        )))
    }

    async fn save_room_type(&self, _room_type: &RoomType) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn save_room(&self, room: &Room) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        rooms.retain(|r| r.id() != room.id());
        rooms.push(room.clone());
        Ok(())
    }

    async fn save_package(&self, _package: &RoomPackage) -> Result<(), RepositoryError> {
        Ok(())
    }
}

struct InMemoryPricingRepository {
    periods: Mutex<Vec<PricingPeriod>>,
}

#[async_trait]
impl PricingRepository for InMemoryPricingRepository {
    async fn periods_for(&self, item: &ItemCode) -> Result<Vec<PricingPeriod>, RepositoryError> {
        let periods = self.periods.lock().await;
        Ok(periods
            .iter()
            .filter(|p| p.item() == item)
            .cloned()
            .collect())
    }

    async fn save_period(&self, period: &PricingPeriod) -> Result<(), RepositoryError> {
        self.periods.lock().await.push(period.clone());
        Ok(())
    }
}

struct InMemoryNightAuditRepository {
    runs: Mutex<HashMap<(String, NaiveDate), NightAuditRun>>,
}

#[async_trait]
impl NightAuditRepository for InMemoryNightAuditRepository {
    async fn get_or_create(
        &self,
        company: &CompanyCode,
        date: NaiveDate,
    ) -> Result<NightAuditRun, RepositoryError> {
        let mut runs = self.runs.lock().await;
        let run = runs
            .entry((company.to_string(), date))
            .or_insert_with(|| NightAuditRun::new(company.clone(), date));
        Ok(run.clone())
    }

    async fn save(&self, run: &NightAuditRun) -> Result<(), RepositoryError> {
        let mut runs = self.runs.lock().await;
        runs.insert((run.company().to_string(), run.date()), run.clone());
        Ok(())
    }

    async fn find(
        &self,
        company: &CompanyCode,
        date: NaiveDate,
    ) -> Result<Option<NightAuditRun>, RepositoryError> {
        let runs = self.runs.lock().await;
        Ok(runs.get(&(company.to_string(), date)).cloned())
    }
}

struct StubGuestDirectory;

#[async_trait]
impl GuestDirectory for StubGuestDirectory {
    async fn profile(&self, _guest: GuestId) -> Result<Option<GuestProfile>, RepositoryError> {
        Ok(Some(GuestProfile {
            full_name: "山田 太郎".to_string(),
            mobile_no: Some("090-0000-0000".to_string()),
        }))
    }
}

struct RecordingHousekeepingGateway {
    dirty_rooms: Mutex<Vec<(RoomId, NaiveDate)>>,
}

#[async_trait]
impl HousekeepingGateway for RecordingHousekeepingGateway {
    async fn create_task(&self, task: &HousekeepingTask) -> Result<(), RepositoryError> {
        self.dirty_rooms
            .lock()
            .await
            .push((task.room().clone(), task.date()));
        Ok(())
    }
}

struct RecordingBillingGateway {
    invoices: Mutex<Vec<(CustomerId, Vec<LineItem>)>>,
}

#[async_trait]
impl BillingGateway for RecordingBillingGateway {
    async fn issue_invoice(
        &self,
        _company: &CompanyCode,
        customer: CustomerId,
        lines: &[LineItem],
    ) -> Result<InvoiceRef, BillingError> {
        self.invoices
            .lock()
            .await
            .push((customer, lines.to_vec()));
        Ok(InvoiceRef(format!("SINV-{}", Uuid::new_v4())))
    }
}

struct SilentLogger;

impl Logger for SilentLogger {
    fn debug(
        &self,
        _component: &str,
        _message: &str,
        _correlation_id: Option<Uuid>,
        _context: Option<HashMap<String, String>>,
    ) {
    }

    fn info(
        &self,
        _component: &str,
        _message: &str,
        _correlation_id: Option<Uuid>,
        _context: Option<HashMap<String, String>>,
    ) {
    }

    fn warn(
        &self,
        _component: &str,
        _message: &str,
        _correlation_id: Option<Uuid>,
        _context: Option<HashMap<String, String>>,
    ) {
    }

    fn error(
        &self,
        _component: &str,
        _message: &str,
        _correlation_id: Option<Uuid>,
        _context: Option<HashMap<String, String>>,
    ) {
    }
}

// ========== フィクスチャ ==========

struct Fixture {
    reservation_service: Arc<ReservationApplicationService>,
    night_audit_service: Arc<NightAuditApplicationService>,
    query_service: Arc<ReservationQueryService>,
    occupancy_service: Arc<OccupancyQueryService>,
    housekeeping: Arc<RecordingHousekeepingGateway>,
    billing: Arc<RecordingBillingGateway>,
    company: CompanyCode,
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn item(code: &str) -> ItemCode {
    ItemCode::new(code).unwrap()
}

fn room_type(code: &str) -> RoomTypeId {
    RoomTypeId::new(code).unwrap()
}

/// "Deluxe" タイプ2室、DLX-NIGHT 100円/泊、EXTRA-BED 30円/泊の
/// 2024年1月分料金でサービス一式を組み立てる
async fn fixture() -> Fixture {
    let mut packages = HashMap::new();
    packages.insert(item("DLX-NIGHT"), room_type("Deluxe"));

    let rooms = vec![
        Room::new(RoomId::new("101").unwrap(), room_type("Deluxe")),
        Room::new(RoomId::new("102").unwrap(), room_type("Deluxe")),
    ];

    let reservation_repo = Arc::new(InMemoryReservationRepository::new(packages.clone()));
    let inventory_repo = Arc::new(InMemoryRoomInventoryRepository {
        rooms: Mutex::new(rooms),
        packages,
    });
    let pricing_repo = Arc::new(InMemoryPricingRepository {
        periods: Mutex::new(vec![
            PricingPeriod::new(
                item("DLX-NIGHT"),
                date(2024, 1, 1),
                date(2024, 1, 31),
                Money::jpy(100),
            ),
            PricingPeriod::new(
                item("EXTRA-BED"),
                date(2024, 1, 1),
                date(2024, 1, 31),
                Money::jpy(30),
            ),
        ]),
    });
    let night_audit_repo = Arc::new(InMemoryNightAuditRepository {
        runs: Mutex::new(HashMap::new()),
    });
    let housekeeping = Arc::new(RecordingHousekeepingGateway {
        dirty_rooms: Mutex::new(Vec::new()),
    });
    let billing = Arc::new(RecordingBillingGateway {
        invoices: Mutex::new(Vec::new()),
    });
    let logger = Arc::new(SilentLogger);

    let rate_table = Arc::new(RateTable::new(pricing_repo.clone()));
    let availability = Arc::new(AvailabilityCalculator::new(
        reservation_repo.clone(),
        inventory_repo.clone(),
    ));
    let validator = Arc::new(ReservationValidator::new(
        rate_table.clone(),
        availability.clone(),
    ));

    let event_bus = Arc::new(InMemoryEventBus::new(EventBusConfig::default()));
    event_bus
        .subscribe_reservation_checked_out(HousekeepingHandler::new(
            housekeeping.clone(),
            logger.clone(),
        ))
        .await
        .unwrap();

    let settings = HotelSettings::new(Some(CustomerId::new()), Some(item("EXTRA-BED")));

    let reservation_service = Arc::new(ReservationApplicationService::new(
        reservation_repo.clone(),
        inventory_repo.clone(),
        validator,
        availability.clone(),
        rate_table.clone(),
        billing.clone(),
        event_bus.clone(),
        settings.clone(),
    ));
    let night_audit_service = Arc::new(NightAuditApplicationService::new(
        reservation_repo.clone(),
        night_audit_repo,
        Arc::new(StubGuestDirectory),
        rate_table,
        event_bus,
        settings,
    ));
    let query_service = Arc::new(ReservationQueryService::new(reservation_repo.clone()));
    let occupancy_service = Arc::new(OccupancyQueryService::new(
        reservation_repo,
        inventory_repo,
        availability,
    ));

    Fixture {
        reservation_service,
        night_audit_service,
        query_service,
        occupancy_service,
        housekeeping,
        billing,
        company: CompanyCode::new("GRAND-HOTEL").unwrap(),
    }
}

impl Fixture {
    /// 予約を作成して確定するヘルパー
    async fn book(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ReservationId, ApplicationError> {
        let id = self
            .reservation_service
            .create_reservation(
                self.company.clone(),
                from,
                to,
                GuestId::new(),
                item("DLX-NIGHT"),
                1,
            )
            .await?;
        self.reservation_service.book_reservation(id).await?;
        Ok(id)
    }

    async fn reservation(&self, id: ReservationId) -> Reservation {
        self.query_service
            .get_reservation_by_id(id)
            .await
            .unwrap()
            .expect("reservation exists")
    }
}

// ========== テスト ==========

#[tokio::test]
async fn test_capacity_two_allows_two_bookings_and_rejects_third() {
    let fixture = fixture().await;

    // 2室あるので2件目までは成功し、料金は2泊 × 100円
    let first = fixture.book(date(2024, 1, 10), date(2024, 1, 12)).await.unwrap();
    assert_eq!(
        fixture.reservation(first).await.net_total().amount(),
        200
    );

    let second = fixture.book(date(2024, 1, 10), date(2024, 1, 12)).await.unwrap();
    assert_eq!(
        fixture.reservation(second).await.status(),
        ReservationStatus::Booked
    );

    // 3件目は在庫切れ
    let third = fixture.book(date(2024, 1, 10), date(2024, 1, 12)).await;
    match third {
        Err(ApplicationError::DomainError(DomainError::RoomsUnavailable {
            date: day,
            requested,
            available,
            ..
        })) => {
            assert_eq!(day, date(2024, 1, 10));
            assert_eq!(requested, 1);
            assert_eq!(available, 0);
        }
        other => panic!("Expected RoomsUnavailable, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_booking_fails_fast_on_pricing_gap() {
    let fixture = fixture().await;

    // 2月に料金期間が無いので、1泊でも2月にかかる滞在は確定できない
    let result = fixture.book(date(2024, 1, 30), date(2024, 2, 2)).await;
    match result {
        Err(ApplicationError::DomainError(DomainError::RateNotSet { date: missing, .. })) => {
            assert_eq!(missing, date(2024, 2, 1));
        }
        other => panic!("Expected RateNotSet, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_duplicate_room_allotment_across_reservations_rejected() {
    let fixture = fixture().await;

    let first = fixture
        .reservation_service
        .create_reservation(
            fixture.company.clone(),
            date(2024, 1, 10),
            date(2024, 1, 12),
            GuestId::new(),
            item("DLX-NIGHT"),
            1,
        )
        .await
        .unwrap();
    fixture
        .reservation_service
        .allot_room(
            first,
            RoomId::new("101").unwrap(),
            item("DLX-NIGHT"),
            date(2024, 1, 10),
            date(2024, 1, 12),
        )
        .await
        .unwrap();
    fixture.reservation_service.book_reservation(first).await.unwrap();

    // 同じ101号室を重なる期間でアサインした2件目は確定できない
    let second = fixture
        .reservation_service
        .create_reservation(
            fixture.company.clone(),
            date(2024, 1, 11),
            date(2024, 1, 13),
            GuestId::new(),
            item("DLX-NIGHT"),
            1,
        )
        .await
        .unwrap();
    fixture
        .reservation_service
        .allot_room(
            second,
            RoomId::new("101").unwrap(),
            item("DLX-NIGHT"),
            date(2024, 1, 11),
            date(2024, 1, 13),
        )
        .await
        .unwrap();

    let result = fixture.reservation_service.book_reservation(second).await;
    assert!(matches!(
        result,
        Err(ApplicationError::DomainError(
            DomainError::DuplicateAllotment { .. }
        ))
    ));

    // 空いている102号室は照会に残っている
    let free = fixture
        .occupancy_service
        .available_rooms(&item("DLX-NIGHT"), date(2024, 1, 10), date(2024, 1, 12))
        .await
        .unwrap();
    let free_ids: Vec<_> = free.iter().map(|r| r.id().to_string()).collect();
    assert_eq!(free_ids, vec!["102".to_string()]);
}

#[tokio::test]
async fn test_night_audit_compute_is_idempotent_until_submit() {
    let fixture = fixture().await;

    let id = fixture.book(date(2024, 1, 10), date(2024, 1, 12)).await.unwrap();
    fixture.reservation_service.check_in(id).await.unwrap();

    let audit_date = date(2024, 1, 10);

    // 提出前の再計算は同じ行集合を返す
    let first = fixture
        .night_audit_service
        .compute(&fixture.company, audit_date)
        .await
        .unwrap();
    let second = fixture
        .night_audit_service
        .compute(&fixture.company, audit_date)
        .await
        .unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);

    // 実行を用意して提出すると1行転記される
    fixture
        .night_audit_service
        .prepare_run(&fixture.company, audit_date)
        .await
        .unwrap();
    let posted = fixture
        .night_audit_service
        .submit(&fixture.company, audit_date)
        .await
        .unwrap();
    assert_eq!(posted, 1);

    // 転記済みの組は再計算から消える
    let after = fixture
        .night_audit_service
        .compute(&fixture.company, audit_date)
        .await
        .unwrap();
    assert!(after.is_empty());

    // 合計金額は滞在200円 + 転記100円
    let reservation = fixture.reservation(id).await;
    assert_eq!(reservation.net_total().amount(), 300);
}

#[tokio::test]
async fn test_night_audit_posts_extra_bed_per_unit() {
    let fixture = fixture().await;

    let id = fixture.book(date(2024, 1, 10), date(2024, 1, 12)).await.unwrap();
    fixture
        .reservation_service
        .set_extra_beds(id, 2)
        .await
        .unwrap();
    fixture.reservation_service.check_in(id).await.unwrap();

    let audit_date = date(2024, 1, 10);
    let lines = fixture
        .night_audit_service
        .compute(&fixture.company, audit_date)
        .await
        .unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].item(), &item("DLX-NIGHT"));
    assert_eq!(lines[0].quantity(), 1);
    assert_eq!(lines[0].guest_name(), "山田 太郎");
    assert_eq!(lines[1].item(), &item("EXTRA-BED"));
    assert_eq!(lines[1].quantity(), 2);

    fixture
        .night_audit_service
        .prepare_run(&fixture.company, audit_date)
        .await
        .unwrap();
    fixture
        .night_audit_service
        .submit(&fixture.company, audit_date)
        .await
        .unwrap();

    // 200 (滞在) + 100 (客室) + 60 (エキストラベッド2台 × 30)
    let reservation = fixture.reservation(id).await;
    assert_eq!(reservation.net_total().amount(), 360);
}

#[tokio::test]
async fn test_pending_checkout_blocks_audit() {
    let fixture = fixture().await;

    let id = fixture.book(date(2024, 1, 10), date(2024, 1, 12)).await.unwrap();
    fixture.reservation_service.check_in(id).await.unwrap();

    // to_date当日を過ぎてもChecked Inのままなので、1/12の監査は実行できない
    let audit_date = date(2024, 1, 12);
    let compute = fixture
        .night_audit_service
        .compute(&fixture.company, audit_date)
        .await;
    assert!(matches!(
        compute,
        Err(ApplicationError::DomainError(
            DomainError::PendingCheckout { .. }
        ))
    ));

    let submit = fixture
        .night_audit_service
        .submit(&fixture.company, audit_date)
        .await;
    assert!(matches!(
        submit,
        Err(ApplicationError::DomainError(
            DomainError::PendingCheckout { .. }
        ))
    ));
}

#[tokio::test]
async fn test_prepare_run_is_upsert_per_company_and_date() {
    let fixture = fixture().await;

    let id = fixture.book(date(2024, 1, 10), date(2024, 1, 12)).await.unwrap();
    fixture.reservation_service.check_in(id).await.unwrap();

    let audit_date = date(2024, 1, 10);
    let first = fixture
        .night_audit_service
        .prepare_run(&fixture.company, audit_date)
        .await
        .unwrap();
    // 2回目の用意は新しい実行を作らず同じキーの実行に合流する
    let second = fixture
        .night_audit_service
        .prepare_run(&fixture.company, audit_date)
        .await
        .unwrap();
    assert_eq!(first.company(), second.company());
    assert_eq!(first.date(), second.date());
    assert_eq!(first.lines(), second.lines());
}

#[tokio::test]
async fn test_check_out_marks_rooms_dirty_and_completes_closed_folio() {
    let fixture = fixture().await;

    let id = fixture
        .reservation_service
        .create_reservation(
            fixture.company.clone(),
            date(2024, 1, 10),
            date(2024, 1, 12),
            GuestId::new(),
            item("DLX-NIGHT"),
            1,
        )
        .await
        .unwrap();
    fixture
        .reservation_service
        .allot_room(
            id,
            RoomId::new("101").unwrap(),
            item("DLX-NIGHT"),
            date(2024, 1, 10),
            date(2024, 1, 12),
        )
        .await
        .unwrap();
    fixture.reservation_service.book_reservation(id).await.unwrap();
    fixture.reservation_service.check_in(id).await.unwrap();

    // 2泊分を転記してフォリオを閉じる
    fixture
        .reservation_service
        .post_room_and_tax(id, date(2024, 1, 10))
        .await
        .unwrap();
    fixture
        .reservation_service
        .post_room_and_tax(id, date(2024, 1, 11))
        .await
        .unwrap();

    fixture.reservation_service.check_out(id).await.unwrap();

    // フォリオ精算済みなのでそのままCompletedになる
    let reservation = fixture.reservation(id).await;
    assert_eq!(reservation.status(), ReservationStatus::Completed);

    // チェックアウトイベント経由で要清掃タスクが1件作られる
    let dirty = fixture.housekeeping.dirty_rooms.lock().await;
    assert_eq!(dirty.len(), 1);
    assert_eq!(dirty[0].0.as_str(), "101");
}

#[tokio::test]
async fn test_check_out_with_open_folio_stays_checked_out() {
    let fixture = fixture().await;

    let id = fixture.book(date(2024, 1, 10), date(2024, 1, 12)).await.unwrap();
    fixture.reservation_service.check_in(id).await.unwrap();

    // 1泊分しか転記していないのでフォリオは未精算のまま
    fixture
        .reservation_service
        .post_room_and_tax(id, date(2024, 1, 10))
        .await
        .unwrap();
    fixture.reservation_service.check_out(id).await.unwrap();

    let reservation = fixture.reservation(id).await;
    assert_eq!(reservation.status(), ReservationStatus::CheckedOut);
}

#[tokio::test]
async fn test_interactive_posting_races_with_audit_without_double_charge() {
    let fixture = fixture().await;

    let id = fixture.book(date(2024, 1, 10), date(2024, 1, 12)).await.unwrap();
    fixture.reservation_service.check_in(id).await.unwrap();

    let audit_date = date(2024, 1, 10);
    fixture
        .night_audit_service
        .prepare_run(&fixture.company, audit_date)
        .await
        .unwrap();

    // スナップショット作成後に対話的な転記が先行したケース
    fixture
        .reservation_service
        .post_room_and_tax(id, audit_date)
        .await
        .unwrap();

    // 提出時の再確認で重複転記にならない
    let posted = fixture
        .night_audit_service
        .submit(&fixture.company, audit_date)
        .await
        .unwrap();
    assert_eq!(posted, 0);

    let reservation = fixture.reservation(id).await;
    assert_eq!(reservation.net_total().amount(), 300);
}

#[tokio::test]
async fn test_group_booking_consolidated_bill_and_invoice() {
    let fixture = fixture().await;

    let leader = fixture.book(date(2024, 1, 10), date(2024, 1, 12)).await.unwrap();
    let members = fixture
        .reservation_service
        .add_group_items(leader, item("DLX-NIGHT"), date(2024, 1, 10), date(2024, 1, 12), 1)
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    fixture
        .reservation_service
        .book_reservation(members[0])
        .await
        .unwrap();

    let group_id = fixture.reservation(leader).await.group_id().unwrap();
    let bill = fixture
        .query_service
        .get_group_bill(group_id)
        .await
        .unwrap();
    assert_eq!(bill.reservation_ids.len(), 2);
    assert_eq!(bill.grand_total.amount(), 400);

    // 全員をチェックイン・転記・チェックアウトしてから一括請求する
    for id in [leader, members[0]] {
        fixture.reservation_service.check_in(id).await.unwrap();
        fixture
            .reservation_service
            .post_room_and_tax(id, date(2024, 1, 10))
            .await
            .unwrap();
        fixture
            .reservation_service
            .post_room_and_tax(id, date(2024, 1, 11))
            .await
            .unwrap();
        fixture.reservation_service.check_out(id).await.unwrap();
    }

    fixture
        .reservation_service
        .make_group_invoice(group_id)
        .await
        .unwrap();

    let invoices = fixture.billing.invoices.lock().await;
    assert_eq!(invoices.len(), 1);
    // 2予約 × (滞在1行 + 転記2行)
    assert_eq!(invoices[0].1.len(), 6);

    drop(invoices);
    for id in [leader, members[0]] {
        let reservation = fixture.reservation(id).await;
        assert_eq!(reservation.status(), ReservationStatus::Invoiced);
    }
}

#[tokio::test]
async fn test_paid_callback_completes_lifecycle() {
    let fixture = fixture().await;

    let id = fixture.book(date(2024, 1, 10), date(2024, 1, 12)).await.unwrap();
    fixture.reservation_service.check_in(id).await.unwrap();
    fixture
        .reservation_service
        .post_room_and_tax(id, date(2024, 1, 10))
        .await
        .unwrap();
    fixture
        .reservation_service
        .post_room_and_tax(id, date(2024, 1, 11))
        .await
        .unwrap();
    fixture.reservation_service.check_out(id).await.unwrap();

    fixture.reservation_service.make_invoice(id).await.unwrap();
    fixture
        .reservation_service
        .mark_reservation_paid(id)
        .await
        .unwrap();

    let reservation = fixture.reservation(id).await;
    assert_eq!(reservation.status(), ReservationStatus::Paid);
}

#[tokio::test]
async fn test_edit_revalidation_excludes_self() {
    let fixture = fixture().await;

    // 2室満室にしてから、既存予約自身の再確定は通ることを確認する
    let first = fixture.book(date(2024, 1, 10), date(2024, 1, 12)).await.unwrap();
    let _second = fixture.book(date(2024, 1, 10), date(2024, 1, 12)).await.unwrap();

    // 検証は自分自身を除外して数えるので満室でも失敗しない
    let reservation = fixture.reservation(first).await;
    assert_eq!(reservation.status(), ReservationStatus::Booked);
    let remaining = fixture
        .occupancy_service
        .remaining_by_day(&room_type("Deluxe"), date(2024, 1, 10), date(2024, 1, 12))
        .await
        .unwrap();
    assert_eq!(remaining, vec![(date(2024, 1, 10), 0), (date(2024, 1, 11), 0)]);
}

#[tokio::test]
async fn test_failed_validation_leaves_committed_state_unchanged() {
    let fixture = fixture().await;

    // 2月にかかる滞在は料金期間が無く確定できない
    let id = fixture
        .reservation_service
        .create_reservation(
            fixture.company.clone(),
            date(2024, 1, 30),
            date(2024, 2, 2),
            GuestId::new(),
            item("DLX-NIGHT"),
            1,
        )
        .await
        .unwrap();

    let result = fixture.reservation_service.book_reservation(id).await;
    assert!(result.is_err());

    // 保存済みの下書きはそのままで、部分的な料金も転記されない
    let reservation = fixture.reservation(id).await;
    assert_eq!(reservation.status(), ReservationStatus::Draft);
    assert!(reservation.net_total().is_zero());
    assert_eq!(reservation.items().len(), 1);
}
