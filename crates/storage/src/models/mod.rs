pub mod event;
pub mod medal;
pub mod participation;
pub mod points_table;

pub use event::{EventRecord, EventType};
pub use medal::Medal;
pub use participation::{AttendanceRecord, AttendanceStatus, MemberInfo, ParticipationRecord};
pub use points_table::PointsTable;
