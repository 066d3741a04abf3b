pub mod api_repository;
pub mod auth_service;
pub mod credentials;
pub mod key_value;
pub mod local_storage;
pub mod mapper;
pub mod notification;
