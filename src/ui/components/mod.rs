pub mod client_views;
