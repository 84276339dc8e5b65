use hotel_reservation_management::adapter::database_config::hotel_settings_from_env;
use hotel_reservation_management::adapter::driven::{
    ConsoleBillingGateway, ConsoleLogger, EventBusConfig, InMemoryEventBus, MySqlGuestDirectory,
    MySqlHousekeepingGateway, MySqlNightAuditRepository, MySqlPricingRepository,
    MySqlReservationRepository, MySqlRoomInventoryRepository,
};
use hotel_reservation_management::adapter::driver::rest_api::{create_router, AppStateInner};
use hotel_reservation_management::adapter::{DatabaseConfig, DatabaseMigration};
use hotel_reservation_management::application::service::{
    NightAuditApplicationService, OccupancyQueryService, ReservationApplicationService,
    ReservationQueryService, RoomInventoryApplicationService,
};
use hotel_reservation_management::domain::handler::{HousekeepingHandler, NotificationHandler};
use hotel_reservation_management::domain::service::{
    AvailabilityCalculator, RateTable, ReservationValidator,
};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== ホテル予約管理システム REST API ===");
    println!();

    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    // データベース設定とホテル設定を読み込む
    let config = DatabaseConfig::from_env()?;
    let settings = hotel_settings_from_env()?;
    println!(
        "データベース設定を読み込みました: {}:{}",
        config.host, config.port
    );

    // 接続プールを作成
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_string())
        .await?;
    println!("データベース接続プールを作成しました");

    // マイグレーションを実行
    let migration = DatabaseMigration::new(pool.clone());
    migration.run().await?;
    println!("データベースマイグレーションを実行しました");

    // MySQLリポジトリとゲートウェイを作成
    let reservation_repository = Arc::new(MySqlReservationRepository::new(pool.clone()));
    let inventory_repository = Arc::new(MySqlRoomInventoryRepository::new(pool.clone()));
    let pricing_repository = Arc::new(MySqlPricingRepository::new(pool.clone()));
    let night_audit_repository = Arc::new(MySqlNightAuditRepository::new(pool.clone()));
    let housekeeping_gateway = Arc::new(MySqlHousekeepingGateway::new(pool.clone()));
    let guest_directory = Arc::new(MySqlGuestDirectory::new(pool.clone()));
    let logger = Arc::new(ConsoleLogger::new());
    let billing_gateway = Arc::new(ConsoleBillingGateway::new(logger.clone()));

    // ドメインサービスを作成
    let rate_table = Arc::new(RateTable::new(pricing_repository.clone()));
    let availability = Arc::new(AvailabilityCalculator::new(
        reservation_repository.clone(),
        inventory_repository.clone(),
    ));
    let validator = Arc::new(ReservationValidator::new(
        rate_table.clone(),
        availability.clone(),
    ));

    // イベントバスを作成
    let event_bus = Arc::new(InMemoryEventBus::new(EventBusConfig::default()));

    // イベントハンドラーを作成して登録
    let housekeeping_handler =
        HousekeepingHandler::new(housekeeping_gateway.clone(), logger.clone());
    let notification_handler = NotificationHandler::new(logger.clone());

    // チェックアウト時は要清掃タスクの作成を自動実行
    event_bus
        .subscribe_reservation_checked_out(housekeeping_handler)
        .await?;

    // 通知ハンドラーを各イベントに登録
    event_bus
        .subscribe_reservation_booked(notification_handler.clone())
        .await?;
    event_bus
        .subscribe_reservation_checked_in(notification_handler.clone())
        .await?;
    event_bus
        .subscribe_reservation_checked_out(notification_handler.clone())
        .await?;
    event_bus
        .subscribe_night_audit_submitted(notification_handler)
        .await?;

    // アプリケーションサービスを作成
    let reservation_service = Arc::new(ReservationApplicationService::new(
        reservation_repository.clone(),
        inventory_repository.clone(),
        validator,
        availability.clone(),
        rate_table.clone(),
        billing_gateway,
        event_bus.clone(),
        settings.clone(),
    ));
    let night_audit_service = Arc::new(NightAuditApplicationService::new(
        reservation_repository.clone(),
        night_audit_repository,
        guest_directory,
        rate_table.clone(),
        event_bus.clone(),
        settings,
    ));
    let inventory_service = Arc::new(RoomInventoryApplicationService::new(
        inventory_repository.clone(),
        pricing_repository,
        rate_table,
        logger,
    ));
    let reservation_query_service =
        Arc::new(ReservationQueryService::new(reservation_repository.clone()));
    let occupancy_query_service = Arc::new(OccupancyQueryService::new(
        reservation_repository,
        inventory_repository,
        availability,
    ));

    // ルーターを組み立てる
    let state = AppStateInner {
        reservation_service,
        night_audit_service,
        inventory_service,
        reservation_query_service,
        occupancy_query_service,
    };
    let app = create_router()
        .layer(CorsLayer::permissive())
        .with_state(state);

    // サーバーを起動
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    println!("REST APIサーバーを起動しました: http://0.0.0.0:3000");
    axum::serve(listener, app).await?;

    Ok(())
}
