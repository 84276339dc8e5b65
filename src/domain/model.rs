// ドメインモデル（エンティティと値オブジェクト）

mod calendar;
mod night_audit;
mod pricing;
mod reservation;
mod room;
mod value_objects;

pub use value_objects::{
    AllotmentStatus, ChargeKind, CompanyCode, Currency, CustomerId, GroupId, GuestId,
    HotelSettings, HousekeepingStatus, ItemCode, LineItem, Money, ReservationId,
    ReservationStatus, RoomAllotment, RoomId, RoomTypeId,
};

pub use calendar::StayRange;
pub use night_audit::{AuditLine, NightAuditRun};
pub use pricing::{find_overlapping_periods, PricingPeriod};
pub use reservation::Reservation;
pub use room::{HousekeepingTask, Room, RoomPackage, RoomType};
