pub mod dispatch;
pub mod init;
pub mod load;
pub mod log;
