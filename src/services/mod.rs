pub mod dashboard;
pub mod images;
pub mod sentiment;
pub mod topic;
pub mod weather;
