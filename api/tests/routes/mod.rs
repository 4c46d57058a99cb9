mod admin_test;
mod attendance_test;
mod auth_test;
mod health_test;
mod teacher_test;
