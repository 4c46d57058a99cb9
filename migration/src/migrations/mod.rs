pub mod m202510180001_create_teachers;
pub mod m202510180002_create_students;
pub mod m202510180003_create_admins;
pub mod m202510180004_create_attendance_sessions;
pub mod m202510180005_create_attendance_records;
pub mod m202510180006_create_token_history;
