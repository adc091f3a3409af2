pub mod compare;
pub mod init;
pub mod run;
pub mod score;
pub mod validate;
