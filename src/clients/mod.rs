//! Clients - HTTP Clients for External APIs
//!
//! Este módulo contiene los clientes HTTP para servicios externos.

pub mod gps_client;

pub use gps_client::GpsProviderClient;
