pub mod admin;
pub mod blocked_date;
pub mod booking;
pub mod service;
pub mod settings;

pub use admin::{AdminIdentity, AdminUser};
pub use blocked_date::BlockedDate;
pub use booking::{BookingRequest, BookingStatus};
pub use service::{Service, ServiceFields};
pub use settings::SiteSettings;
