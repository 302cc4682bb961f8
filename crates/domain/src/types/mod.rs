//! Domain data types.

pub mod events;
pub mod period;
pub mod records;
pub mod session;
pub mod snapshot;

pub use events::{ChangeEvent, ChangeKind, ChangeSet};
pub use period::{Period, PeriodId};
pub use records::{
    Absence, Acquisition, Delay, Evaluation, Grade, Lesson, MenuDay, PortalRecord, RecordId,
};
pub use session::{Credentials, Session, SessionToken};
pub use snapshot::{DateRange, PeriodSnapshot, Snapshot};
