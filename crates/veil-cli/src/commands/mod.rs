pub mod clear;
pub mod copy;
pub mod edit;
pub mod list;
pub mod misc;
