// 駆動される側アダプター（リポジトリ実装など）

mod console_logger;
mod event_bus;
mod hotel_directory;
mod night_audit_repository;
mod pricing_repository;
mod reservation_repository;
mod room_repository;

pub use console_logger::ConsoleLogger;
pub use event_bus::{EventBusConfig, InMemoryEventBus};
pub use hotel_directory::{ConsoleBillingGateway, MySqlGuestDirectory, MySqlHousekeepingGateway};
pub use night_audit_repository::MySqlNightAuditRepository;
pub use pricing_repository::MySqlPricingRepository;
pub use reservation_repository::MySqlReservationRepository;
pub use room_repository::MySqlRoomInventoryRepository;
