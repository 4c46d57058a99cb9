pub mod admin;
pub mod attendance_record;
pub mod attendance_session;
pub mod student;
pub mod teacher;
pub mod token_history;

pub use admin::Entity as Admin;
pub use attendance_record::Entity as AttendanceRecord;
pub use attendance_session::Entity as AttendanceSession;
pub use student::Entity as Student;
pub use teacher::Entity as Teacher;
pub use token_history::Entity as TokenHistory;
