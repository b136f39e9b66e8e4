//! Domain types shared by every bounded context: readings, tiers, alerts and
//! lifecycle events.

pub mod alert;
pub mod events;
pub mod reading;
pub mod sample;
pub mod tier;

pub use alert::{Alert, AlertId, AlertPayload, AlertResolution, AlertStatus, ResolutionType, SosRequest};
pub use events::{AlertEvent, EntryCause};
pub use reading::Reading;
pub use sample::RawSample;
pub use tier::{AlertTier, TierPresentation};
