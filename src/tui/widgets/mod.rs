pub mod help;
pub mod root;
pub mod status_bar;
pub mod subscriptions;
pub mod video_list;
