// Infrastructure layer - External dependencies and adapters
pub mod completion_client;
pub mod config;
pub mod http_errors;
pub mod session_store;
pub mod thingsboard_repository;
pub mod zabbix_repository;
